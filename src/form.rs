//! Agent configuration form: one `AgentConfig` per slot, validated against the catalog.

use serde::Deserialize;
use tracing::{info, warn};

use crate::agents::{AgentConfig, AgentSlot, MaxIterations};
use crate::catalog::ModelCatalog;
use crate::config::AppConfig;
use crate::constants::events;
use crate::error::ConfigurationError;

/// Pick the named default model. Absence is an error, never a silent substitute.
pub fn select_default_model(
    catalog: &ModelCatalog,
    slot: AgentSlot,
    default_model: &str,
) -> Result<String, ConfigurationError> {
    if catalog.contains(default_model) {
        Ok(default_model.to_string())
    } else {
        warn!(event = events::DEFAULT_MODEL_MISSING, %slot, model = default_model, "Default model not in catalog");
        Err(ConfigurationError::DefaultModelMissing {
            slot,
            model: default_model.to_string(),
        })
    }
}

pub fn validate_temperature(value: f32) -> Result<f32, ConfigurationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigurationError::TemperatureOutOfRange { value })
    }
}

/// A partial update of one agent. Unset fields are left alone.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AgentEdit {
    pub role: Option<String>,
    pub goal: Option<String>,
    pub backstory: Option<String>,
    pub model_id: Option<String>,
    pub temperature: Option<f32>,
    pub max_iterations: Option<u32>,
}

/// One slot of the form. `model_error` is set when no model could be selected.
#[derive(Clone, Debug, PartialEq)]
pub struct FormEntry {
    pub agent: AgentConfig,
    pub model_error: Option<ConfigurationError>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AgentForm {
    entries: Vec<FormEntry>,
}

impl AgentForm {
    /// Fill every slot from persona defaults and config overrides, selecting
    /// each slot's default model from the catalog.
    pub fn populate(catalog: &ModelCatalog, config: &AppConfig) -> Self {
        let entries = AgentSlot::ALL
            .iter()
            .map(|&slot| {
                let (model_id, model_error) =
                    match select_default_model(catalog, slot, &config.default_model(slot)) {
                        Ok(model) => (model, None),
                        Err(e) => (String::new(), Some(e)),
                    };
                let mut agent = Self::persona_defaults(slot, config);
                agent.model_id = model_id;
                FormEntry { agent, model_error }
            })
            .collect();
        Self { entries }
    }

    /// Fill persona texts only. Used when the catalog could not be fetched:
    /// no model is selected and every slot carries the fetch failure.
    pub fn without_catalog(config: &AppConfig, reason: &str) -> Self {
        let entries = AgentSlot::ALL
            .iter()
            .map(|&slot| FormEntry {
                agent: Self::persona_defaults(slot, config),
                model_error: Some(ConfigurationError::CatalogUnavailable(reason.to_string())),
            })
            .collect();
        Self { entries }
    }

    fn persona_defaults(slot: AgentSlot, config: &AppConfig) -> AgentConfig {
        let overrides = config.agents.for_slot(slot);
        let mut agent = AgentConfig::from_persona(slot.persona(), String::new());
        if let Some(role) = &overrides.role {
            agent.role = role.clone();
        }
        if let Some(goal) = &overrides.goal {
            agent.goal = goal.clone();
        }
        if let Some(backstory) = &overrides.backstory {
            agent.backstory = backstory.clone();
        }
        if let Some(t) = overrides.temperature {
            agent.temperature = t.clamp(0.0, 1.0);
        }
        if let Some(iterations) = overrides.max_iterations {
            agent.max_iterations = iterations;
        }
        agent
    }

    pub fn entries(&self) -> &[FormEntry] {
        &self.entries
    }

    pub fn entry(&self, slot: AgentSlot) -> &FormEntry {
        // constructors always create one entry per slot
        &self.entries[Self::position(slot)]
    }

    pub fn agent(&self, slot: AgentSlot) -> &AgentConfig {
        &self.entry(slot).agent
    }

    fn position(slot: AgentSlot) -> usize {
        AgentSlot::ALL.iter().position(|&s| s == slot).unwrap_or_default()
    }

    /// Apply a user edit. Validation failures leave the entry untouched.
    pub fn apply_edit(
        &mut self,
        slot: AgentSlot,
        edit: AgentEdit,
        catalog: &ModelCatalog,
    ) -> Result<&AgentConfig, ConfigurationError> {
        if let Some(model) = &edit.model_id {
            if !catalog.contains(model) {
                return Err(ConfigurationError::UnknownModel { slot, model: model.clone() });
            }
        }
        let temperature = edit.temperature.map(validate_temperature).transpose()?;
        let max_iterations = edit.max_iterations.map(MaxIterations::try_from).transpose()?;

        let entry = &mut self.entries[Self::position(slot)];
        if let Some(model) = edit.model_id {
            entry.agent.model_id = model;
            entry.model_error = None;
        }
        if let Some(role) = edit.role {
            entry.agent.role = role;
        }
        if let Some(goal) = edit.goal {
            entry.agent.goal = goal;
        }
        if let Some(backstory) = edit.backstory {
            entry.agent.backstory = backstory;
        }
        if let Some(t) = temperature {
            entry.agent.temperature = t;
        }
        if let Some(iterations) = max_iterations {
            entry.agent.max_iterations = iterations;
        }

        info!("📝 [FORM] Updated {} (model: {})", slot, entry.agent.model_id);
        Ok(&entry.agent)
    }

    /// After a catalog reload: keep selections that still exist, otherwise
    /// fall back to the slot's default (or record the error).
    pub fn reconcile(&mut self, catalog: &ModelCatalog, config: &AppConfig) {
        for entry in &mut self.entries {
            let slot = entry.agent.slot;
            if !entry.agent.model_id.is_empty() && catalog.contains(&entry.agent.model_id) {
                entry.model_error = None;
                continue;
            }
            match select_default_model(catalog, slot, &config.default_model(slot)) {
                Ok(model) => {
                    entry.agent.model_id = model;
                    entry.model_error = None;
                }
                Err(e) => {
                    entry.agent.model_id = String::new();
                    entry.model_error = Some(e);
                }
            }
        }
    }

    /// Keep the persona texts, drop every model selection.
    pub fn mark_catalog_unavailable(&mut self, reason: &str) {
        for entry in &mut self.entries {
            entry.agent.model_id = String::new();
            entry.model_error = Some(ConfigurationError::CatalogUnavailable(reason.to_string()));
        }
    }

    /// Every agent, checked against the catalog, in declaration order.
    pub fn validated(&self, catalog: &ModelCatalog) -> Result<Vec<AgentConfig>, ConfigurationError> {
        self.entries
            .iter()
            .map(|entry| {
                if let Some(e) = &entry.model_error {
                    return Err(e.clone());
                }
                check_model(&entry.agent, catalog)?;
                Ok(entry.agent.clone())
            })
            .collect()
    }
}

/// The agent's model must be in the catalog.
pub fn check_model(agent: &AgentConfig, catalog: &ModelCatalog) -> Result<(), ConfigurationError> {
    if catalog.contains(&agent.model_id) {
        Ok(())
    } else {
        Err(ConfigurationError::UnknownModel {
            slot: agent.slot,
            model: agent.model_id.clone(),
        })
    }
}
