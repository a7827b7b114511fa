use serde::Serialize;
use uuid::Uuid;

use crate::agents::AgentSlot;

/// What an agent did in one step of a crew run.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepKind {
    Thought {
        text: String,
    },
    Action {
        tool: String,
        tool_input: String,
        log: String,
    },
    Observation {
        text: String,
    },
    Delegation {
        coworker: String,
        request: String,
    },
    TaskFinished {
        output: String,
    },
}

/// An intermediate unit of agent progress, attributed to the agent's role.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StepEvent {
    pub agent: String,
    #[serde(flatten)]
    pub kind: StepKind,
}

impl StepEvent {
    pub fn new(agent: impl Into<String>, kind: StepKind) -> Self {
        Self { agent: agent.into(), kind }
    }
}

// Global Event Enum
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    RewriteStarted { slot: AgentSlot },
    RewriteFinished { slot: AgentSlot, body: String },
    RewriteFailed { slot: AgentSlot, error: String },
    CrewStarted { run_id: Uuid },
    Step(StepEvent),
    CrewFinished { run_id: Uuid, artifact_len: usize },
    CrewFailed { run_id: Uuid, error: String },
}

impl Event {
    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            Event::RewriteStarted { .. } => "rewrite_started",
            Event::RewriteFinished { .. } => "rewrite_finished",
            Event::RewriteFailed { .. } => "rewrite_failed",
            Event::CrewStarted { .. } => "crew_started",
            Event::Step(_) => "step",
            Event::CrewFinished { .. } => "crew_finished",
            Event::CrewFailed { .. } => "crew_failed",
        }
    }
}
