//! Per-session state. Every client gets its own agents, tasks and catalog.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::agents::{AgentConfig, AgentSlot};
use crate::bus::EventBus;
use crate::catalog::{fetch_models, ModelCatalog};
use crate::config::AppConfig;
use crate::crew::{BusSink, CrewRun, CrewRunner};
use crate::error::{AppError, ConfigurationError, RunError};
use crate::events::Event;
use crate::form::{validate_temperature, AgentEdit, AgentForm};
use crate::llm::OllamaClient;
use crate::presenter::ResultArtifact;
use crate::rewriter::{RewriteProgress, RewriteReport, RewriteSettings, TaskRewriter};
use crate::tasks::{TaskDescription, TaskStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Rewriting,
    Running,
}

/// Mutable session state. Locked only for short, non-async sections.
#[derive(Debug)]
pub struct SessionState {
    pub catalog: Option<ModelCatalog>,
    pub catalog_error: Option<String>,
    pub form: AgentForm,
    pub tasks: TaskStore,
    pub status: SessionStatus,
    pub result: Option<ResultArtifact>,
    pub last_error: Option<String>,
}

impl SessionState {
    /// Build state from a fetch outcome.
    pub fn new(catalog: Result<ModelCatalog, String>, config: &AppConfig, date: NaiveDate) -> Self {
        let (catalog, catalog_error, form) = match catalog {
            Ok(catalog) => {
                let form = AgentForm::populate(&catalog, config);
                (Some(catalog), None, form)
            }
            Err(reason) => {
                let form = AgentForm::without_catalog(config, &reason);
                (None, Some(reason), form)
            }
        };
        Self {
            catalog,
            catalog_error,
            form,
            tasks: TaskStore::with_date(date),
            status: SessionStatus::Idle,
            result: None,
            last_error: None,
        }
    }

    fn catalog(&self) -> Result<&ModelCatalog, ConfigurationError> {
        self.catalog.as_ref().ok_or_else(|| {
            ConfigurationError::CatalogUnavailable(self.catalog_error.clone().unwrap_or_default())
        })
    }
}

/// Serializable view of one agent slot.
#[derive(Clone, Debug, Serialize)]
pub struct AgentView {
    #[serde(flatten)]
    pub agent: AgentConfig,
    /// Dropdown index of the selected model
    pub model_index: Option<usize>,
    pub model_error: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct TaskView {
    pub label: String,
    #[serde(flatten)]
    pub task: TaskDescription,
    pub is_default: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub models: Vec<String>,
    pub catalog_error: Option<String>,
    pub agents: Vec<AgentView>,
    pub tasks: Vec<TaskView>,
    pub has_result: bool,
    pub last_error: Option<String>,
}

pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    state: Mutex<SessionState>,
    busy: tokio::sync::Mutex<()>,
    bus: EventBus,
    last_access: Mutex<Instant>,
}

impl Session {
    pub fn new(state: SessionState, event_capacity: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            state: Mutex::new(state),
            busy: tokio::sync::Mutex::new(()),
            bus: EventBus::new(event_capacity),
            last_access: Mutex::new(Instant::now()),
        }
    }

    /// Fetch the catalog and build a fresh session. A fetch failure does not
    /// fail creation; it is recorded and shown instead of model choices.
    pub async fn create(client: &OllamaClient, config: &AppConfig) -> Self {
        let catalog = fetch_models(client).await.map_err(|e| e.to_string());
        let state = SessionState::new(catalog, config, chrono::Local::now().date_naive());
        let session = Self::new(state, config.crew.event_capacity);
        info!("🗂️ [SESSION] Created {}", session.id);
        session
    }

    fn touch(&self) {
        *self.last_access.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_access
            .lock()
            .map(|at| at.elapsed())
            .unwrap_or_else(|poisoned| poisoned.into_inner().elapsed())
    }

    /// A rewrite, run or reload is in progress.
    pub fn is_busy(&self) -> bool {
        self.busy.try_lock().is_err()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // a poisoned lock only means a panic mid-update; the state is still usable
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.lock())
    }

    pub fn snapshot(&self) -> SessionView {
        let state = self.lock();
        let agents = state
            .form
            .entries()
            .iter()
            .map(|entry| AgentView {
                agent: entry.agent.clone(),
                model_index: state.catalog.as_ref().and_then(|c| c.index_of(&entry.agent.model_id)),
                model_error: entry.model_error.as_ref().map(|e| e.to_string()),
            })
            .collect();
        let tasks = state
            .tasks
            .tasks()
            .iter()
            .map(|task| TaskView {
                label: task.owner.persona().task_label().to_string(),
                task: task.clone(),
                is_default: state.tasks.is_default(task.owner),
            })
            .collect();

        SessionView {
            id: self.id,
            created_at: self.created_at,
            status: state.status,
            models: state.catalog.as_ref().map(|c| c.models().to_vec()).unwrap_or_default(),
            catalog_error: state.catalog_error.clone(),
            agents,
            tasks,
            has_result: state.result.is_some(),
            last_error: state.last_error.clone(),
        }
    }

    /// Re-fetch the catalog. Selections that still exist are kept.
    pub async fn reload(&self, client: &OllamaClient, config: &AppConfig) -> Result<(), AppError> {
        let _guard = self.busy.try_lock().map_err(|_| AppError::SessionBusy(self.id))?;
        let fetched = fetch_models(client).await;

        let mut state = self.lock();
        match fetched {
            Ok(catalog) => {
                state.form.reconcile(&catalog, config);
                state.catalog = Some(catalog);
                state.catalog_error = None;
                Ok(())
            }
            Err(e) => {
                state.form.mark_catalog_unavailable(&e.to_string());
                state.catalog = None;
                state.catalog_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    pub fn edit_agent(&self, slot: AgentSlot, edit: AgentEdit) -> Result<AgentConfig, AppError> {
        let mut state = self.lock();
        let catalog = state.catalog()?.clone();
        let agent = state.form.apply_edit(slot, edit, &catalog)?.clone();
        Ok(agent)
    }

    pub fn edit_task(&self, slot: AgentSlot, body: String) -> Result<TaskDescription, AppError> {
        if self.busy.try_lock().is_err() {
            return Err(AppError::SessionBusy(self.id));
        }
        let mut state = self.lock();
        state.tasks.set_body(slot, body);
        Ok(state.tasks.get(slot).clone())
    }

    /// Resolve rewrite settings: explicit values win, else the configured
    /// default model, which must be in the catalog.
    pub fn rewrite_settings(
        &self,
        topic: String,
        model: Option<String>,
        temperature: Option<f32>,
        config: &AppConfig,
    ) -> Result<RewriteSettings, ConfigurationError> {
        let state = self.lock();
        let catalog = state.catalog()?;
        let model_id = model.unwrap_or_else(|| config.rewrite.default_model.clone());
        if !catalog.contains(&model_id) {
            return Err(ConfigurationError::UnknownRewriteModel { model: model_id });
        }
        let temperature = validate_temperature(temperature.unwrap_or(config.rewrite.temperature))?;
        Ok(RewriteSettings { topic, model_id, temperature })
    }

    /// Rewrite the three tasks for a topic. Each result is written into the
    /// task store and published before the next request starts.
    pub async fn rewrite(&self, rewriter: &TaskRewriter, settings: RewriteSettings) -> Result<RewriteReport, AppError> {
        let _guard = self.busy.try_lock().map_err(|_| AppError::SessionBusy(self.id))?;
        if settings.topic.trim().is_empty() {
            return Err(ConfigurationError::EmptyTopic.into());
        }

        let originals = {
            let mut state = self.lock();
            state.status = SessionStatus::Rewriting;
            state.tasks.tasks().to_vec()
        };

        let report = rewriter
            .rewrite_all(&originals, &settings, |progress| {
                let event = match progress {
                    RewriteProgress::Started(slot) => Event::RewriteStarted { slot },
                    RewriteProgress::Done(outcome) => match &outcome.result {
                        Ok(body) => {
                            self.lock().tasks.set_body(outcome.slot, body.clone());
                            Event::RewriteFinished { slot: outcome.slot, body: body.clone() }
                        }
                        Err(e) => Event::RewriteFailed { slot: outcome.slot, error: e.to_string() },
                    },
                };
                let _ = self.bus.publish(event);
            })
            .await;

        self.lock().status = SessionStatus::Idle;
        report.map_err(AppError::from)
    }

    /// Run the crew with the current agents and tasks. A previous result is
    /// discarded when the run starts; a failed run leaves no result.
    pub async fn run_crew(&self, runner: &CrewRunner) -> Result<ResultArtifact, AppError> {
        let _guard = self.busy.try_lock().map_err(|_| AppError::SessionBusy(self.id))?;

        let crew = {
            let mut state = self.lock();
            let prepared = state
                .catalog()
                .and_then(|catalog| {
                    let agents = state.form.validated(catalog)?;
                    CrewRun::assemble(&agents, state.tasks.tasks(), catalog)
                });
            match prepared {
                Ok(crew) => {
                    state.status = SessionStatus::Running;
                    state.result = None;
                    state.last_error = None;
                    crew
                }
                Err(e) => {
                    warn!("🗂️ [SESSION] {} cannot start a run: {}", self.id, e);
                    state.last_error = Some(e.to_string());
                    return Err(RunError::Configuration(e).into());
                }
            }
        };

        let _ = self.bus.publish(Event::CrewStarted { run_id: crew.id });
        let sink = BusSink::new(self.bus.clone());
        let outcome = runner.execute(&crew, &sink).await;

        let mut state = self.lock();
        state.status = SessionStatus::Idle;
        match outcome {
            Ok(artifact) => {
                let _ = self.bus.publish(Event::CrewFinished { run_id: crew.id, artifact_len: artifact.text.len() });
                state.result = Some(artifact.clone());
                Ok(artifact)
            }
            Err(e) => {
                let _ = self.bus.publish(Event::CrewFailed { run_id: crew.id, error: e.to_string() });
                state.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    pub fn result(&self) -> Option<ResultArtifact> {
        self.lock().result.clone()
    }
}

/// All live sessions.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<Uuid, Arc<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: Session) -> Arc<Session> {
        let session = Arc::new(session);
        self.sessions.insert(session.id, session.clone());
        session
    }

    /// Look up a session and mark it as used.
    pub fn get(&self, id: Uuid) -> Result<Arc<Session>, AppError> {
        let session = self
            .sessions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(AppError::SessionNotFound(id))?;
        session.touch();
        Ok(session)
    }

    /// Drop sessions idle for at least `max_idle`. Busy sessions are kept.
    /// Returns how many were removed.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.is_busy() || session.idle_for() < max_idle);
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            info!("🗂️ [SESSION] Evicted {} idle sessions ({} left)", removed, self.sessions.len());
        }
        removed
    }

    /// Sweep idle sessions every `interval` for the life of the process.
    pub fn spawn_sweeper(&self, interval: Duration, max_idle: Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                store.evict_idle(max_idle);
            }
        })
    }

    pub fn remove(&self, id: Uuid) -> Result<(), AppError> {
        self.sessions
            .remove(&id)
            .map(|_| ())
            .ok_or(AppError::SessionNotFound(id))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
