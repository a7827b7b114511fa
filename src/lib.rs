//! Agent crew - a three-agent research crew backed by local Ollama models
//!
//! This library provides the model registry client, the agent configuration
//! form, the task templates and their rewriter, the sequential crew runner and
//! the result export, plus the HTTP surface that ties them together per session.

pub mod agents;
pub mod api;
pub mod bus;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod crew;
pub mod error;
pub mod events;
pub mod form;
pub mod llm;
pub mod presenter;
pub mod rewriter;
pub mod session;
pub mod tasks;

// Re-export commonly used types
pub use agents::{AgentConfig, AgentSlot, MaxIterations};
pub use bus::EventBus;
pub use catalog::ModelCatalog;
pub use config::AppConfig;
pub use error::{AppError, CompletionError, ConfigurationError, FetchError, RunError};
pub use events::{Event, StepEvent, StepKind};
pub use presenter::ResultArtifact;
pub use tasks::TaskDescription;

#[cfg(test)]
mod crew_tests;
#[cfg(test)]
mod form_tests;
#[cfg(test)]
mod presenter_tests;
#[cfg(test)]
mod test_support;
