pub mod author;
pub mod consultant;
pub mod researcher;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::agents::ITERATION_CHOICES;
use crate::error::ConfigurationError;

/// One of the three agent positions in the crew.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentSlot {
    Researcher,
    Author,
    Consultant,
}

impl AgentSlot {
    /// Order in which the slots are declared and shown.
    pub const ALL: [AgentSlot; 3] = [AgentSlot::Researcher, AgentSlot::Author, AgentSlot::Consultant];

    /// Order in which tasks are rewritten and executed.
    pub const EXECUTION_ORDER: [AgentSlot; 3] =
        [AgentSlot::Researcher, AgentSlot::Consultant, AgentSlot::Author];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentSlot::Researcher => "researcher",
            AgentSlot::Author => "author",
            AgentSlot::Consultant => "consultant",
        }
    }

    pub fn persona(&self) -> &'static dyn Persona {
        match self {
            AgentSlot::Researcher => &researcher::ResearcherPersona,
            AgentSlot::Author => &author::AuthorPersona,
            AgentSlot::Consultant => &consultant::ConsultantPersona,
        }
    }
}

impl fmt::Display for AgentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentSlot {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "researcher" | "research" => Ok(AgentSlot::Researcher),
            "author" | "autor" | "writer" => Ok(AgentSlot::Author),
            "consultant" | "investor" | "business-angel" => Ok(AgentSlot::Consultant),
            other => Err(ConfigurationError::UnknownSlot(other.to_string())),
        }
    }
}

/// Cap on reasoning iterations for one agent. Only 5, 10, 15, 20 or 25.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct MaxIterations(u8);

impl MaxIterations {
    pub fn get(&self) -> u8 {
        self.0
    }
}

impl Default for MaxIterations {
    fn default() -> Self {
        MaxIterations(ITERATION_CHOICES[2])
    }
}

impl TryFrom<u32> for MaxIterations {
    type Error = ConfigurationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        ITERATION_CHOICES
            .iter()
            .find(|&&choice| u32::from(choice) == value)
            .map(|&choice| MaxIterations(choice))
            .ok_or(ConfigurationError::InvalidIterations { value })
    }
}

impl From<MaxIterations> for u32 {
    fn from(value: MaxIterations) -> Self {
        u32::from(value.0)
    }
}

/// Tools an agent may call during a crew run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    InternetSearch,
    DuckDuckGoSearch,
}

/// Static defaults for one agent slot.
pub trait Persona: Send + Sync {
    fn slot(&self) -> AgentSlot;
    fn default_role(&self) -> &str;
    fn default_goal(&self) -> &str;
    fn default_backstory(&self) -> &str;
    fn default_model(&self) -> &str;

    /// Label of the task text area
    fn task_label(&self) -> &str;

    /// Default task body with a `{date}` placeholder
    fn task_template(&self) -> &str;

    /// How the rewrite prompt describes this agent
    fn rewrite_persona(&self) -> &str;

    fn tools(&self) -> &[ToolKind] {
        &[]
    }

    fn allow_delegation(&self) -> bool {
        false
    }
}

/// A configured agent: persona texts bound to a model and sampling settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub slot: AgentSlot,
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub model_id: String,
    pub temperature: f32,
    pub max_iterations: MaxIterations,
}

impl AgentConfig {
    /// Build a config from persona defaults with the given model.
    pub fn from_persona(persona: &dyn Persona, model_id: impl Into<String>) -> Self {
        Self {
            slot: persona.slot(),
            role: persona.default_role().to_string(),
            goal: persona.default_goal().to_string(),
            backstory: persona.default_backstory().to_string(),
            model_id: model_id.into(),
            temperature: 0.0,
            max_iterations: MaxIterations::default(),
        }
    }

    pub fn tools(&self) -> &'static [ToolKind] {
        self.slot.persona().tools()
    }

    pub fn allow_delegation(&self) -> bool {
        self.slot.persona().allow_delegation()
    }

    /// System prompt describing who the agent is.
    pub fn system_prompt(&self) -> String {
        format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role, self.backstory, self.goal
        )
    }
}
