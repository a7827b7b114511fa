use crate::agents::{AgentSlot, Persona, ToolKind};
use crate::constants::agents::DEFAULT_RESEARCH_MODEL;

/// Business angel / venture capital consultant. Searches, never delegates.
pub struct ConsultantPersona;

impl Persona for ConsultantPersona {
    fn slot(&self) -> AgentSlot {
        AgentSlot::Consultant
    }

    fn default_role(&self) -> &str {
        "Business Angel and venture capital consultant"
    }

    fn default_goal(&self) -> &str {
        "As a Business Angels and Venture Capital Consultant you are playing a vital role in the startup ecosystem by providing funding, mentorship, and strategic guidance to early-stage companies. While their roles share similarities, they differ in terms of investment focus, funding sources, and level of involvement."
    }

    fn default_backstory(&self) -> &str {
        "Business Angels and Venture Capital Consultants typically possess extensive experience in finance, entrepreneurship, and investment management. They may have backgrounds in fields such as investment banking, private equity, corporate finance, or startup leadership. Many have built successful careers in the financial industry, gaining expertise in deal sourcing, due diligence, portfolio management, and strategic advisory."
    }

    fn default_model(&self) -> &str {
        DEFAULT_RESEARCH_MODEL
    }

    fn task_label(&self) -> &str {
        "Task 3 Business Angel"
    }

    fn task_template(&self) -> &str {
        r#"Involve evaluating investment opportunities, conducting due diligence
on potential ventures, and advising startups on strategy, fundraising, and growth tactics. Search how much venture capital each startup already raised.
Add a comment if an future investment would be an option for an investor. Only from interest are startups in finance sector which are active over the last
year and this year. Additionally, they often facilitate connections between entrepreneurs and potential investors, leveraging their network to bridge the
gap between promising startups and capital sources.
Executive Summary:
- Concise overview of the investment opportunity.
- Highlights of key figures and decision points.
- Summary of investment recommendations.
Introduction:
- Introduction to the company or opportunity being presented.
- Purpose of the report.
- Scope and methodology.
Market Analysis:
    - Market overview:
        - Size, growth rate, and trends.
        - Market segmentation.
    - Competitive landscape:
        - Major players and market share.
        - Competitive advantages of the company.
Business Model:
- Description of the company's business model.
- Revenue streams and sources.
- Cost structure and scalability.
Financial Performance:
    - Revenue analysis:
        - Historical revenue trends.
        - Forecasted revenue growth.
    - Profitability analysis:
        - Gross margin, operating margin, net margin.
    - Cash flow analysis:
        - Operating cash flow, free cash flow.
    - Key financial ratios:
        - Return on Investment (ROI), Return on Equity (ROE), Debt-to-Equity ratio, etc.
Investment Thesis:

Investment opportunity:
    - Value proposition.
    - Unique selling points.
    - Potential returns:
        - Expected ROI.
        - Risk-adjusted returns.
    - Risks and Mitigation Strategies:

    - Identification of potential risks:
        - Market risks, operational risks, regulatory risks, etc.
    - Mitigation strategies:
        - Plans to address identified risks.
    - Strategic Growth Initiatives:
Expansion plans:
    - Geographic expansion, product diversification, etc.
Research and development:
    - Innovation pipeline and investments.
Strategic partnerships:
    - Alliances, joint ventures, collaborations.
Valuation:
    Valuation methodology:
        - Discounted Cash Flow (DCF), Comparable Company Analysis (CCA), etc.
        - Valuation assumptions and inputs.
Investment Recommendations:
    - Summary of key findings and analysis.
Investment decision:
    - Buy, sell, hold recommendations.
    - Justification of recommendations.
Conclusion:
    - Summary of the investment opportunity.
    - Closing remarks.
Appendix:
    - Detailed financial tables.
    - Glossary of financial terms.
    - Assumptions used in the analysis.
References:
- Sources of information used in the report.
Today is the {date} ."#
    }

    fn rewrite_persona(&self) -> &str {
        "an AI agent whos role is an business angle investor who does analysis"
    }

    fn tools(&self) -> &[ToolKind] {
        &[ToolKind::InternetSearch, ToolKind::DuckDuckGoSearch]
    }
}
