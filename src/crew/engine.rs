use std::sync::Mutex;

use async_trait::async_trait;

use crate::bus::EventBus;
use crate::crew::CrewRun;
use crate::error::RunError;
use crate::events::{Event, StepEvent};

/// Receives step events as the engine produces them.
pub trait StepSink: Send + Sync {
    fn on_step(&self, step: StepEvent);
}

/// The multi-agent orchestration engine.
///
/// Runs the members of a `CrewRun` in order, reports every step to `sink`
/// while it happens, and returns the final task's output. Implementations
/// must not retry failed runs.
#[async_trait]
pub trait CrewEngine: Send + Sync {
    async fn execute(&self, run: &CrewRun, sink: &dyn StepSink) -> Result<String, RunError>;
}

/// Forwards steps to a session's event bus.
pub struct BusSink {
    bus: EventBus,
}

impl BusSink {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }
}

impl StepSink for BusSink {
    fn on_step(&self, step: StepEvent) {
        // no subscriber is fine
        let _ = self.bus.publish(Event::Step(step));
    }
}

/// Keeps every step in memory.
#[derive(Default)]
pub struct CollectingSink {
    steps: Mutex<Vec<StepEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> Vec<StepEvent> {
        self.steps.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl StepSink for CollectingSink {
    fn on_step(&self, step: StepEvent) {
        if let Ok(mut steps) = self.steps.lock() {
            steps.push(step);
        }
    }
}
