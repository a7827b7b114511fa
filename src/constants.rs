//! Application-wide constants
//!
//! Model names, export metadata and event names live here so the form,
//! the presenter and the API agree on them.

use std::time::Duration;

/// Model server defaults
pub mod ollama {
    use super::*;

    /// Default Ollama server when nothing is configured
    pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

    /// Model listing path, relative to the base URL
    pub const TAGS_PATH: &str = "/api/tags";

    /// Single-shot completion path
    pub const GENERATE_PATH: &str = "/api/generate";

    /// Multi-turn chat path used by the crew engine
    pub const CHAT_PATH: &str = "/api/chat";

    /// Per-request timeout; long generations on CPU boxes are normal
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(600);
}

/// Agent form defaults
pub mod agents {
    /// Default model for the researcher and the consultant
    pub const DEFAULT_RESEARCH_MODEL: &str = "openhermes:latest";

    /// Default model for the author
    pub const DEFAULT_AUTHOR_MODEL: &str = "mistral:latest";

    /// Default model for rewriting the tasks
    pub const DEFAULT_REWRITE_MODEL: &str = "openhermes:latest";

    /// Allowed values for the reasoning-iteration cap
    pub const ITERATION_CHOICES: [u8; 5] = [5, 10, 15, 20, 25];
}

/// Task defaults
pub mod tasks {
    /// Expected-output hint attached to every task
    pub const EXPECTED_OUTPUT: &str = "Do my work please";

    /// Date format interpolated into the default task bodies
    pub const DATE_FORMAT: &str = "%Y-%m-%d";
}

/// Crew run defaults
pub mod crew {
    /// Capacity of the per-session progress bus
    pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

    /// Number of search results rendered into an observation
    pub const DEFAULT_SEARCH_RESULTS: usize = 4;

    /// Separator between rendered search results
    pub const SEARCH_RESULT_SEPARATOR: &str = "-----------------";
}

/// Session lifetime
pub mod sessions {
    /// Idle time after which a session is dropped
    pub const DEFAULT_IDLE_SECS: u64 = 3600;

    /// How often idle sessions are swept
    pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
}

/// Export artifact
pub mod export {
    pub const FILE_NAME: &str = "meeting_prep.md";
    pub const MIME_TYPE: &str = "text/plain";
    pub const RESULT_HEADING: &str = "Your requested analysis is ready";
}

/// Logging event names for structured logging
pub mod events {
    pub const CATALOG_FETCHED: &str = "catalog_fetched";
    pub const CATALOG_FETCH_FAILED: &str = "catalog_fetch_failed";
    pub const DEFAULT_MODEL_MISSING: &str = "default_model_missing";
    pub const REWRITE_STARTED: &str = "rewrite_started";
    pub const REWRITE_FINISHED: &str = "rewrite_finished";
    pub const REWRITE_FAILED: &str = "rewrite_failed";
    pub const CREW_STARTED: &str = "crew_started";
    pub const CREW_FINISHED: &str = "crew_finished";
    pub const CREW_FAILED: &str = "crew_failed";
}
