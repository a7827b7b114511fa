//! Task rewriter: adapts the three task bodies to a new topic, one completion each.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{error, info};

use crate::agents::AgentSlot;
use crate::constants::events;
use crate::error::{CompletionError, ConfigurationError};
use crate::llm::LlmBackend;
use crate::tasks::TaskDescription;

const REWRITE_TEMPLATE: &str = "As an AI assistant please write a task description for {persona}. This is an example task description for an AI agent. The AI agent needs this task to understand what he has to do. \n Example task description:\n{example}\n Please rewrite this task description for the new topic which is described as follows: \n New topic: \n{task_description} \nImportant for the rewritten new task description is to keep the structure of the example task description provided.";

/// A text template with `{name}` placeholders.
///
/// Substitution is single pass: placeholder-like text inside a substituted
/// value is left as is. Braces around names that are not declared input
/// variables are copied literally.
#[derive(Clone, Debug)]
pub struct PromptTemplate {
    template: String,
    input_variables: Vec<String>,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>, input_variables: &[&str]) -> Self {
        Self {
            template: template.into(),
            input_variables: input_variables.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn format(&self, values: &HashMap<&str, &str>) -> Result<String, CompletionError> {
        if let Some(missing) = self.input_variables.iter().find(|v| !values.contains_key(v.as_str())) {
            return Err(CompletionError::Template(missing.clone()));
        }

        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) if self.input_variables.iter().any(|v| v == &after[..close]) => {
                    out.push_str(values[&after[..close]]);
                    rest = &after[close + 1..];
                }
                _ => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// Build the rewrite prompt for one task.
pub fn build_prompt(original: &TaskDescription, topic: &str) -> Result<String, CompletionError> {
    let template = PromptTemplate::new(REWRITE_TEMPLATE, &["persona", "example", "task_description"]);
    let values = HashMap::from([
        ("persona", original.owner.persona().rewrite_persona()),
        ("example", original.body.as_str()),
        ("task_description", topic),
    ]);
    template.format(&values)
}

/// Topic plus the model settings used for all three rewrites.
#[derive(Clone, Debug, Deserialize)]
pub struct RewriteSettings {
    pub topic: String,
    pub model_id: String,
    pub temperature: f32,
}

/// Result of one task's rewrite.
#[derive(Clone, Debug, PartialEq)]
pub struct RewriteOutcome {
    pub slot: AgentSlot,
    pub result: Result<String, CompletionError>,
}

/// Outcomes in the order they were produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RewriteReport {
    pub outcomes: Vec<RewriteOutcome>,
}

impl RewriteReport {
    pub fn get(&self, slot: AgentSlot) -> Option<&RewriteOutcome> {
        self.outcomes.iter().find(|o| o.slot == slot)
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }
}

/// Progress notifications from `rewrite_all`.
#[derive(Clone, Copy, Debug)]
pub enum RewriteProgress<'a> {
    Started(AgentSlot),
    Done(&'a RewriteOutcome),
}

pub struct TaskRewriter {
    llm: Arc<dyn LlmBackend>,
}

impl TaskRewriter {
    pub fn new(llm: Arc<dyn LlmBackend>) -> Self {
        Self { llm }
    }

    /// Rewrite one task for `topic` with a single completion call.
    pub async fn rewrite(
        &self,
        original: &TaskDescription,
        topic: &str,
        model: &str,
        temperature: f32,
    ) -> Result<String, CompletionError> {
        let prompt = build_prompt(original, topic)?;
        let completion = self.llm.generate(model, &prompt, temperature).await?;
        if completion.trim().is_empty() {
            return Err(CompletionError::Empty);
        }
        Ok(completion)
    }

    /// Rewrite all three tasks strictly one after another (Researcher,
    /// Consultant, Author). `on_progress` sees each result before the next
    /// request starts. A failed task does not stop the others.
    pub async fn rewrite_all<F>(
        &self,
        originals: &[TaskDescription],
        settings: &RewriteSettings,
        mut on_progress: F,
    ) -> Result<RewriteReport, ConfigurationError>
    where
        F: FnMut(RewriteProgress<'_>),
    {
        if settings.topic.trim().is_empty() {
            return Err(ConfigurationError::EmptyTopic);
        }

        let mut report = RewriteReport::default();
        for slot in AgentSlot::EXECUTION_ORDER {
            let Some(original) = originals.iter().find(|t| t.owner == slot) else {
                continue;
            };

            info!(event = events::REWRITE_STARTED, %slot, "✍️ [REWRITE] Rewriting task for {}", slot);
            on_progress(RewriteProgress::Started(slot));
            let result = self
                .rewrite(original, &settings.topic, &settings.model_id, settings.temperature)
                .await;

            match &result {
                Ok(body) => info!(event = events::REWRITE_FINISHED, %slot, "✍️ [REWRITE] {} task rewritten ({} chars)", slot, body.len()),
                Err(e) => error!(event = events::REWRITE_FAILED, %slot, "✍️ [REWRITE] {} task failed: {}", slot, e),
            }

            let outcome = RewriteOutcome { slot, result };
            on_progress(RewriteProgress::Done(&outcome));
            report.outcomes.push(outcome);
        }

        Ok(report)
    }
}
