use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::agents::ToolKind;
use crate::config::SearchConfig;
use crate::constants::crew::SEARCH_RESULT_SEPARATOR;
use crate::error::ToolError;

/// Something an agent can call by name with a text input.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    async fn call(&self, input: &str) -> Result<String, ToolError>;
}

const QUERY_KEYS: [&str; 3] = ["query", "search_query", "q"];

/// Agents often wrap the query as `{"query": "..."}`. Known query keys win,
/// otherwise the first string value is taken.
pub fn normalize_query(input: &str) -> String {
    let trimmed = input.trim();
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        let query = QUERY_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .or_else(|| map.values().find_map(Value::as_str));
        if let Some(query) = query {
            return query.trim().to_string();
        }
    }
    trimmed.trim_matches('"').trim().to_string()
}

/// One search hit.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

/// Render hits as `Title:`/`Link:`/`Snippet:` blocks.
pub fn format_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|h| {
            format!(
                "Title: {}\nLink: {}\nSnippet: {}\n\n{}",
                h.title, h.link, h.snippet, SEARCH_RESULT_SEPARATOR
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperHit>,
}

#[derive(Deserialize)]
struct SerperHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

/// Google results through the Serper API.
pub struct InternetSearch {
    client: Client,
    url: String,
    api_key: Option<String>,
    results: usize,
}

impl InternetSearch {
    pub fn new(client: Client, config: &SearchConfig) -> Self {
        Self {
            client,
            url: config.serper_url.clone(),
            api_key: config.serper_api_key.clone(),
            results: config.results,
        }
    }
}

#[async_trait]
impl Tool for InternetSearch {
    fn name(&self) -> &str {
        "Search the internet"
    }

    fn description(&self) -> &str {
        "Useful to search the internet about a given topic and return relevant results"
    }

    async fn call(&self, input: &str) -> Result<String, ToolError> {
        let tool = self.name().to_string();
        let Some(api_key) = &self.api_key else {
            return Err(ToolError::NotConfigured { tool, reason: "SERPER_API_KEY is not set".to_string() });
        };
        let query = normalize_query(input);
        if query.is_empty() {
            return Err(ToolError::InvalidInput { tool, reason: "empty query".to_string() });
        }

        info!("🔎 [TOOL] Internet search: {}", query);
        let response = self
            .client
            .post(&self.url)
            .header("X-API-KEY", api_key)
            .json(&json!({ "q": query }))
            .send()
            .await
            .map_err(|e| ToolError::Request { tool: tool.clone(), reason: e.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Status { tool, status: status.as_u16() });
        }

        let body: SerperResponse = response
            .json()
            .await
            .map_err(|e| ToolError::Decode { tool: tool.clone(), reason: e.to_string() })?;

        let hits: Vec<SearchHit> = body
            .organic
            .into_iter()
            .take(self.results)
            .map(|h| SearchHit { title: h.title, link: h.link, snippet: h.snippet })
            .collect();

        if hits.is_empty() {
            return Ok(format!("No results found for '{}'", query));
        }
        Ok(format_hits(&hits))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RelatedTopic {
    #[serde(default)]
    text: String,
    #[serde(default, rename = "FirstURL")]
    first_url: String,
    #[serde(default)]
    topics: Vec<RelatedTopic>,
}

fn flatten_topics(topics: Vec<RelatedTopic>, out: &mut Vec<SearchHit>) {
    for topic in topics {
        if !topic.text.is_empty() {
            let title = topic.text.split(" - ").next().unwrap_or_default().to_string();
            out.push(SearchHit { title, link: topic.first_url, snippet: topic.text });
        }
        flatten_topics(topic.topics, out);
    }
}

/// DuckDuckGo instant answers. Needs no key.
pub struct DuckDuckGoSearch {
    client: Client,
    url: String,
    results: usize,
}

impl DuckDuckGoSearch {
    pub fn new(client: Client, config: &SearchConfig) -> Self {
        Self {
            client,
            url: config.duckduckgo_url.clone(),
            results: config.results,
        }
    }
}

#[async_trait]
impl Tool for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "DuckDuckGoSearch"
    }

    fn description(&self) -> &str {
        "Search the web for information on a given topic"
    }

    async fn call(&self, input: &str) -> Result<String, ToolError> {
        let tool = self.name().to_string();
        let query = normalize_query(input);
        if query.is_empty() {
            return Err(ToolError::InvalidInput { tool, reason: "empty query".to_string() });
        }

        info!("🦆 [TOOL] DuckDuckGo search: {}", query);
        let response = self
            .client
            .get(&self.url)
            .query(&[("q", query.as_str()), ("format", "json"), ("no_html", "1"), ("skip_disambig", "1")])
            .send()
            .await
            .map_err(|e| ToolError::Request { tool: tool.clone(), reason: e.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Status { tool, status: status.as_u16() });
        }

        let answer: InstantAnswer = response
            .json()
            .await
            .map_err(|e| ToolError::Decode { tool: tool.clone(), reason: e.to_string() })?;

        let mut hits = Vec::new();
        if !answer.abstract_text.is_empty() {
            hits.push(SearchHit {
                title: answer.heading,
                link: answer.abstract_url,
                snippet: answer.abstract_text,
            });
        }
        flatten_topics(answer.related_topics, &mut hits);
        hits.truncate(self.results);

        if hits.is_empty() {
            return Ok(format!("No results found for '{}'", query));
        }
        Ok(format_hits(&hits))
    }
}

/// Tools by kind, shared by every agent of a run.
#[derive(Clone, Default)]
pub struct ToolBox {
    tools: HashMap<ToolKind, Arc<dyn Tool>>,
}

impl ToolBox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Both search tools, configured from `config`.
    pub fn from_config(config: &SearchConfig) -> Self {
        let client = Client::new();
        Self::new()
            .with(ToolKind::InternetSearch, Arc::new(InternetSearch::new(client.clone(), config)))
            .with(ToolKind::DuckDuckGoSearch, Arc::new(DuckDuckGoSearch::new(client, config)))
    }

    pub fn with(mut self, kind: ToolKind, tool: Arc<dyn Tool>) -> Self {
        self.tools.insert(kind, tool);
        self
    }

    pub fn get(&self, kind: ToolKind) -> Option<Arc<dyn Tool>> {
        self.tools.get(&kind).cloned()
    }

    /// The tools granted to an agent, skipping kinds that are not registered.
    pub fn select(&self, kinds: &[ToolKind]) -> Vec<Arc<dyn Tool>> {
        kinds.iter().filter_map(|&k| self.get(k)).collect()
    }
}
