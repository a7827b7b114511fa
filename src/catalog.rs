//! Model registry: the ordered list of models the server offers.

use serde::Serialize;
use tracing::{error, info};

use crate::constants::events;
use crate::error::FetchError;
use crate::llm::OllamaClient;

/// Models available on the server, in the order the server listed them.
/// Read-only once fetched; a reload replaces it wholesale.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ModelCatalog {
    models: Vec<String>,
}

impl ModelCatalog {
    pub fn new(models: Vec<String>) -> Self {
        Self { models }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn contains(&self, model: &str) -> bool {
        self.models.iter().any(|m| m == model)
    }

    /// Position of a model in the list, as a dropdown index.
    pub fn index_of(&self, model: &str) -> Option<usize> {
        self.models.iter().position(|m| m == model)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Fetch the catalog with one `GET /api/tags`. No retry.
pub async fn fetch_models(client: &OllamaClient) -> Result<ModelCatalog, FetchError> {
    match client.list_models().await {
        Ok(models) => {
            info!(event = events::CATALOG_FETCHED, count = models.len(), "📚 [CATALOG] {} models available", models.len());
            Ok(ModelCatalog::new(models))
        }
        Err(e) => {
            error!(event = events::CATALOG_FETCH_FAILED, "📚 [CATALOG] {}", e);
            Err(e)
        }
    }
}
