//! Scripted fakes shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::agents::{AgentConfig, AgentSlot};
use crate::catalog::ModelCatalog;
use crate::crew::{CrewEngine, CrewRun, StepSink};
use crate::error::{CompletionError, RunError};
use crate::events::{StepEvent, StepKind};
use crate::llm::{ChatMessage, LlmBackend};

pub fn catalog() -> ModelCatalog {
    ModelCatalog::new(vec!["openhermes:latest".to_string(), "mistral:latest".to_string()])
}

pub fn agents() -> Vec<AgentConfig> {
    AgentSlot::ALL
        .iter()
        .map(|&slot| AgentConfig::from_persona(slot.persona(), slot.persona().default_model()))
        .collect()
}

/// One recorded completion call. For chat calls `prompt` is the last message.
#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
}

/// Answers completion calls from a queue, in order.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, CompletionError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn next(&self, model: &str, prompt: &str, temperature: f32) -> Result<String, CompletionError> {
        self.calls.lock().unwrap().push(RecordedCall {
            model: model.to_string(),
            prompt: prompt.to_string(),
            temperature,
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CompletionError::Request("script exhausted".to_string())))
    }
}

#[async_trait]
impl LlmBackend for ScriptedLlm {
    async fn generate(&self, model: &str, prompt: &str, temperature: f32) -> Result<String, CompletionError> {
        self.next(model, prompt, temperature)
    }

    async fn chat(&self, model: &str, messages: &[ChatMessage], temperature: f32) -> Result<String, CompletionError> {
        let last = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
        self.next(model, last, temperature)
    }
}

/// Records the order members were handed over and answers with a fixed outcome.
pub struct RecordingEngine {
    pub seen: Mutex<Vec<AgentSlot>>,
    outcome: Result<String, String>,
    delay: Option<Duration>,
}

impl RecordingEngine {
    pub fn succeeding(text: &str) -> Self {
        Self { seen: Mutex::new(Vec::new()), outcome: Ok(text.to_string()), delay: None }
    }

    pub fn failing(reason: &str) -> Self {
        Self { seen: Mutex::new(Vec::new()), outcome: Err(reason.to_string()), delay: None }
    }

    pub fn slow(text: &str, delay: Duration) -> Self {
        Self { seen: Mutex::new(Vec::new()), outcome: Ok(text.to_string()), delay: Some(delay) }
    }

    pub fn seen(&self) -> Vec<AgentSlot> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CrewEngine for RecordingEngine {
    async fn execute(&self, run: &CrewRun, sink: &dyn StepSink) -> Result<String, RunError> {
        for member in &run.members {
            self.seen.lock().unwrap().push(member.agent.slot);
            sink.on_step(StepEvent::new(
                member.agent.role.clone(),
                StepKind::Thought { text: format!("working on the {}", member.agent.slot) },
            ));
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone().map_err(RunError::Engine)
    }
}
