use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::agents::{AgentSlot, MaxIterations};
use crate::constants;
use crate::error::ConfigError;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Sessions untouched for this long are dropped by the sweeper
    pub session_idle_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
            session_idle_secs: constants::sessions::DEFAULT_IDLE_SECS,
            sweep_interval_secs: constants::sessions::DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: constants::ollama::DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: constants::ollama::DEFAULT_REQUEST_TIMEOUT.as_secs(),
        }
    }
}

/// Per-agent overrides of the persona defaults. Unset fields keep the persona text.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AgentOverrides {
    pub role: Option<String>,
    pub goal: Option<String>,
    pub backstory: Option<String>,
    pub default_model: Option<String>,
    pub temperature: Option<f32>,
    pub max_iterations: Option<MaxIterations>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    pub researcher: AgentOverrides,
    pub author: AgentOverrides,
    pub consultant: AgentOverrides,
}

impl AgentsConfig {
    pub fn for_slot(&self, slot: AgentSlot) -> &AgentOverrides {
        match slot {
            AgentSlot::Researcher => &self.researcher,
            AgentSlot::Author => &self.author,
            AgentSlot::Consultant => &self.consultant,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    pub default_model: String,
    pub temperature: f32,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            default_model: constants::agents::DEFAULT_REWRITE_MODEL.to_string(),
            temperature: 0.0,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CrewConfig {
    /// Upper bound for one crew run. `None` waits for the engine indefinitely.
    pub run_timeout_secs: Option<u64>,
    pub event_capacity: usize,
}

impl Default for CrewConfig {
    fn default() -> Self {
        Self {
            run_timeout_secs: None,
            event_capacity: constants::crew::DEFAULT_EVENT_CAPACITY,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub serper_api_key: Option<String>,
    pub serper_url: String,
    pub duckduckgo_url: String,
    pub results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            serper_api_key: None,
            serper_url: "https://google.serper.dev/search".to_string(),
            duckduckgo_url: "https://api.duckduckgo.com/".to_string(),
            results: constants::crew::DEFAULT_SEARCH_RESULTS,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ollama: OllamaConfig,
    pub agents: AgentsConfig,
    pub rewrite: RewriteConfig,
    pub crew: CrewConfig,
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load `config.yaml` (or `AGENTCREW_CONFIG`), then apply environment overrides.
    /// A missing file falls back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("AGENTCREW_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());

        let mut config = match fs::read_to_string(&config_path) {
            Ok(content) => Self::from_yaml_str(&content).map_err(|source| ConfigError::Parse {
                path: config_path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
            Err(source) => {
                return Err(ConfigError::Read { path: config_path, source });
            }
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        // Strip BOM if present
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        if content.trim().is_empty() {
            return Ok(AppConfig::default());
        }
        serde_yaml::from_str(content)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
            self.ollama.base_url = url;
        }
        if let Ok(key) = std::env::var("SERPER_API_KEY") {
            self.search.serper_api_key = Some(key);
        }
        if let Ok(bind) = std::env::var("AGENTCREW_BIND") {
            self.server.bind = bind;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.ollama.base_url).map_err(|source| ConfigError::BaseUrl {
            url: self.ollama.base_url.clone(),
            source,
        })?;

        let positive = [
            ("ollama.request_timeout_secs", self.ollama.request_timeout_secs),
            ("crew.event_capacity", self.crew.event_capacity as u64),
            ("server.session_idle_secs", self.server.session_idle_secs),
            ("server.sweep_interval_secs", self.server.sweep_interval_secs),
        ];
        if let Some(&(key, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Value { key, reason: "must be greater than zero".to_string() });
        }
        Ok(())
    }

    /// Base URL without a trailing slash, ready for path joins.
    pub fn base_url(&self) -> String {
        self.ollama.base_url.trim_end_matches('/').to_string()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.ollama.request_timeout_secs)
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.server.session_idle_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.server.sweep_interval_secs)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.crew.run_timeout_secs.map(Duration::from_secs)
    }

    /// Default model for a slot, honouring config overrides.
    pub fn default_model(&self, slot: AgentSlot) -> String {
        self.agents
            .for_slot(slot)
            .default_model
            .clone()
            .unwrap_or_else(|| slot.persona().default_model().to_string())
    }
}
