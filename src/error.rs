//! Custom error types for the crew workflow
//!
//! One enum per failure domain. `AppError` wraps them for the HTTP layer.

use thiserror::Error;

use crate::agents::AgentSlot;

/// Model listing failures. Terminal for the session's model selection.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Model server returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Model server not reachable at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("Could not decode model list from {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// Invalid or incomplete agent/task configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Default model '{model}' for the {slot} is not available on the model server")]
    DefaultModelMissing { slot: AgentSlot, model: String },

    #[error("Model '{model}' selected for the {slot} is not in the model catalog")]
    UnknownModel { slot: AgentSlot, model: String },

    #[error("Model '{model}' is not in the model catalog")]
    UnknownRewriteModel { model: String },

    #[error("Temperature {value} is outside [0, 1]")]
    TemperatureOutOfRange { value: f32 },

    #[error("Iteration cap {value} is not one of 5, 10, 15, 20, 25")]
    InvalidIterations { value: u32 },

    #[error("No model catalog available: {0}")]
    CatalogUnavailable(String),

    #[error("Topic must not be empty")]
    EmptyTopic,

    #[error("Unknown agent slot '{0}'")]
    UnknownSlot(String),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// A single completion call failed. Local to one rewritten task.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompletionError {
    #[error("Model server request failed: {0}")]
    Request(String),

    #[error("Model server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed model response: {0}")]
    Malformed(String),

    #[error("Model returned an empty completion")]
    Empty,

    #[error("Prompt template is missing variable '{0}'")]
    Template(String),
}

/// The crew run failed as a whole. No partial artifact exists.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Crew configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Completion failed for {role}: {source}")]
    Completion {
        role: String,
        #[source]
        source: CompletionError,
    },

    #[error("{role} reached the iteration cap of {limit} without a final answer")]
    IterationLimit { role: String, limit: u8 },

    #[error("Orchestration engine failed: {0}")]
    Engine(String),

    #[error("Crew run timed out after {0}s")]
    Timeout(u64),
}

/// Configuration file and bootstrap errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid base URL '{url}': {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid value for {key}: {reason}")]
    Value { key: &'static str, reason: String },
}

/// Errors surfaced through the HTTP front-end
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error("Session not found: {0}")]
    SessionNotFound(uuid::Uuid),

    #[error("Session {0} is busy with another rewrite or crew run")]
    SessionBusy(uuid::Uuid),

    #[error("No result available yet. Start a crew run first.")]
    NoResult,

    #[error("Internal error: {0}")]
    Internal(String),
}


/// Tool invocation failures. Reported to the agent as observation text.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{tool} is not configured: {reason}")]
    NotConfigured { tool: String, reason: String },

    #[error("{tool} request failed: {reason}")]
    Request { tool: String, reason: String },

    #[error("{tool} returned HTTP {status}")]
    Status { tool: String, status: u16 },

    #[error("{tool} returned an unreadable response: {reason}")]
    Decode { tool: String, reason: String },

    #[error("Invalid input for {tool}: {reason}")]
    InvalidInput { tool: String, reason: String },
}
