//! Crew runner: assembles the ordered crew and hands it to the orchestration engine.

pub mod engine;
pub mod sequential;
pub mod tools;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::agents::{AgentConfig, AgentSlot, ToolKind};
use crate::catalog::ModelCatalog;
use crate::constants::events;
use crate::error::{ConfigurationError, RunError};
use crate::form::check_model;
use crate::presenter::ResultArtifact;
use crate::tasks::TaskDescription;

pub use engine::{BusSink, CollectingSink, CrewEngine, StepSink};

/// One agent bound to its task for a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CrewMember {
    pub agent: AgentConfig,
    pub task: TaskDescription,
    pub tools: Vec<ToolKind>,
    pub allow_delegation: bool,
}

/// The crew for one run, members in execution order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CrewRun {
    pub id: Uuid,
    pub members: Vec<CrewMember>,
}

impl CrewRun {
    /// Pair agents with their tasks in execution order (Researcher,
    /// Consultant, Author) regardless of the order they were passed in.
    /// Every agent's model must be in `catalog`.
    pub fn assemble(
        agents: &[AgentConfig],
        tasks: &[TaskDescription],
        catalog: &ModelCatalog,
    ) -> Result<Self, ConfigurationError> {
        let members = AgentSlot::EXECUTION_ORDER
            .iter()
            .map(|&slot| {
                let agent = agents
                    .iter()
                    .find(|a| a.slot == slot)
                    .ok_or_else(|| ConfigurationError::Invalid(format!("no agent configured for the {}", slot)))?;
                let task = tasks
                    .iter()
                    .find(|t| t.owner == slot)
                    .ok_or_else(|| ConfigurationError::Invalid(format!("no task defined for the {}", slot)))?;
                check_model(agent, catalog)?;

                Ok(CrewMember {
                    agent: agent.clone(),
                    task: task.clone(),
                    tools: agent.tools().to_vec(),
                    allow_delegation: agent.allow_delegation(),
                })
            })
            .collect::<Result<Vec<_>, ConfigurationError>>()?;

        Ok(Self { id: Uuid::new_v4(), members })
    }

    /// Roles of every member except `slot`, for delegation.
    pub fn coworkers_of(&self, slot: AgentSlot) -> Vec<&CrewMember> {
        self.members.iter().filter(|m| m.agent.slot != slot).collect()
    }
}

pub struct CrewRunner {
    engine: Arc<dyn CrewEngine>,
    timeout: Option<Duration>,
}

impl CrewRunner {
    pub fn new(engine: Arc<dyn CrewEngine>, timeout: Option<Duration>) -> Self {
        Self { engine, timeout }
    }

    /// Run the crew once. Step events go to `sink` while the engine works;
    /// any failure aborts the run without an artifact. No retry.
    pub async fn run(
        &self,
        agents: &[AgentConfig],
        tasks: &[TaskDescription],
        catalog: &ModelCatalog,
        sink: &dyn StepSink,
    ) -> Result<ResultArtifact, RunError> {
        let crew = CrewRun::assemble(agents, tasks, catalog)?;
        self.execute(&crew, sink).await
    }

    /// Run an already assembled crew.
    pub async fn execute(&self, crew: &CrewRun, sink: &dyn StepSink) -> Result<ResultArtifact, RunError> {
        info!(event = events::CREW_STARTED, run_id = %crew.id, "🤖 [CREW] Starting run with {} agents", crew.members.len());

        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.engine.execute(crew, sink)).await {
                Ok(result) => result,
                Err(_) => Err(RunError::Timeout(limit.as_secs())),
            },
            None => self.engine.execute(crew, sink).await,
        };

        match outcome {
            Ok(text) => {
                info!(event = events::CREW_FINISHED, run_id = %crew.id, "✅ [CREW] Run finished ({} chars)", text.len());
                Ok(ResultArtifact::new(crew.id, text))
            }
            Err(e) => {
                error!(event = events::CREW_FAILED, run_id = %crew.id, "❌ [CREW] Run failed: {}", e);
                Err(e)
            }
        }
    }
}
