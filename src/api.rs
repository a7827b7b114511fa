use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{
        sse::{Event as SseEvent, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post, put},
    Json, Router,
};
use futures_util::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::agents::AgentSlot;
use crate::catalog::fetch_models;
use crate::config::AppConfig;
use crate::crew::sequential::SequentialEngine;
use crate::crew::tools::ToolBox;
use crate::crew::{CrewEngine, CrewRunner};
use crate::error::{AppError, FetchError, RunError};
use crate::events::Event;
use crate::form::AgentEdit;
use crate::llm::{LlmBackend, OllamaClient};
use crate::presenter::{self, render_step};
use crate::rewriter::{RewriteReport, TaskRewriter};
use crate::session::{Session, SessionStore};

pub struct AppState {
    pub config: AppConfig,
    pub ollama: OllamaClient,
    pub rewriter: Arc<TaskRewriter>,
    pub runner: Arc<CrewRunner>,
    pub sessions: SessionStore,
}

impl AppState {
    /// Wire the Ollama client, the built-in crew engine and the search tools.
    pub fn new(config: AppConfig) -> Self {
        let ollama = OllamaClient::new(config.base_url(), config.request_timeout());
        let llm: Arc<dyn LlmBackend> = Arc::new(ollama.clone());
        let engine = Arc::new(SequentialEngine::new(llm, ToolBox::from_config(&config.search)));
        Self::with_engine(config, ollama, engine)
    }

    pub fn with_engine(config: AppConfig, ollama: OllamaClient, engine: Arc<dyn CrewEngine>) -> Self {
        let llm: Arc<dyn LlmBackend> = Arc::new(ollama.clone());
        Self {
            rewriter: Arc::new(TaskRewriter::new(llm)),
            runner: Arc::new(CrewRunner::new(engine, config.run_timeout())),
            sessions: SessionStore::new(),
            ollama,
            config,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            AppError::Fetch(_) => (StatusCode::BAD_GATEWAY, "fetch_error"),
            AppError::Configuration(_) => (StatusCode::UNPROCESSABLE_ENTITY, "configuration_error"),
            AppError::Completion(_) => (StatusCode::BAD_GATEWAY, "completion_error"),
            AppError::Run(RunError::Configuration(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "configuration_error")
            }
            AppError::Run(_) => (StatusCode::BAD_GATEWAY, "run_error"),
            AppError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "session_not_found"),
            AppError::SessionBusy(_) => (StatusCode::CONFLICT, "session_busy"),
            AppError::NoResult => (StatusCode::NOT_FOUND, "no_result"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let mut body = json!({ "error": kind, "message": self.to_string() });
        if let AppError::Fetch(FetchError::Status { status, .. }) = &self {
            body["upstream_status"] = json!(status);
        }
        (status, Json(body)).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/models", get(list_models))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/reload", post(reload_session))
        .route("/sessions/{id}/agents/{slot}", put(update_agent))
        .route("/sessions/{id}/tasks/{slot}", put(update_task))
        .route("/sessions/{id}/rewrite", post(rewrite_tasks))
        .route("/sessions/{id}/run", post(run_crew))
        .route("/sessions/{id}/events", get(session_events))
        .route("/sessions/{id}/result", get(get_result))
        .route("/sessions/{id}/export", get(export_result))
        .with_state(state)
}

pub async fn run_server(state: Arc<AppState>) -> std::io::Result<()> {
    let bind = state.config.server.bind.clone();
    state
        .sessions
        .spawn_sweeper(state.config.sweep_interval(), state.config.session_idle());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("🌐 [API] Server listening on {}", bind);
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn list_models(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let catalog = fetch_models(&state.ollama).await?;
    Ok(Json(json!({ "models": catalog.models() })))
}

async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = Session::create(&state.ollama, &state.config).await;
    let session = state.sessions.insert(session);
    (StatusCode::CREATED, Json(session.snapshot()))
}

async fn get_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    let session = state.sessions.get(id)?;
    Ok(Json(session.snapshot()))
}

async fn delete_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    state.sessions.remove(id)?;
    info!("🗂️ [SESSION] Removed {}", id);
    Ok(StatusCode::NO_CONTENT)
}

async fn reload_session(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    let session = state.sessions.get(id)?;
    session.reload(&state.ollama, &state.config).await?;
    Ok(Json(session.snapshot()))
}

async fn update_agent(
    State(state): State<Arc<AppState>>,
    Path((id, slot)): Path<(Uuid, String)>,
    Json(edit): Json<AgentEdit>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.sessions.get(id)?;
    let slot: AgentSlot = slot.parse()?;
    let agent = session.edit_agent(slot, edit)?;
    Ok(Json(agent))
}

#[derive(Deserialize)]
struct TaskUpdate {
    body: String,
}

async fn update_task(
    State(state): State<Arc<AppState>>,
    Path((id, slot)): Path<(Uuid, String)>,
    Json(update): Json<TaskUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.sessions.get(id)?;
    let slot: AgentSlot = slot.parse()?;
    let task = session.edit_task(slot, update.body)?;
    Ok(Json(task))
}

#[derive(Deserialize)]
struct RewriteRequest {
    topic: String,
    model: Option<String>,
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct RewriteTaskResult {
    slot: AgentSlot,
    body: Option<String>,
    error: Option<String>,
}

#[derive(Serialize)]
struct RewriteResponse {
    model: String,
    succeeded: usize,
    tasks: Vec<RewriteTaskResult>,
}

impl RewriteResponse {
    fn new(model: String, report: RewriteReport) -> Self {
        let succeeded = report.succeeded();
        let tasks = report
            .outcomes
            .into_iter()
            .map(|outcome| {
                let (body, error) = match outcome.result {
                    Ok(body) => (Some(body), None),
                    Err(e) => (None, Some(e.to_string())),
                };
                RewriteTaskResult { slot: outcome.slot, body, error }
            })
            .collect();
        Self { model, succeeded, tasks }
    }
}

async fn rewrite_tasks(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<RewriteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.sessions.get(id)?;
    let settings = session.rewrite_settings(request.topic, request.model, request.temperature, &state.config)?;
    let model = settings.model_id.clone();

    // detached so a dropped connection does not abort a rewrite halfway
    let rewriter = state.rewriter.clone();
    let report = tokio::spawn(async move { session.rewrite(&rewriter, settings).await })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(Json(RewriteResponse::new(model, report)))
}

async fn run_crew(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    let session = state.sessions.get(id)?;
    let runner = state.runner.clone();

    let artifact = tokio::spawn(async move { session.run_crew(&runner).await })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(Json(presenter::render(&artifact)))
}

fn to_sse(event: &Event) -> SseEvent {
    let payload = match event {
        Event::Step(step) => json!({ "event": event, "markdown": render_step(step) }),
        _ => json!({ "event": event }),
    };
    SseEvent::default().event(event.name()).data(payload.to_string())
}

async fn session_events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, AppError> {
    let session = state.sessions.get(id)?;
    let rx = session.bus().subscribe();

    let stream = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => return Some((Ok::<_, Infallible>(to_sse(&event)), rx)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("🌐 [API] Event stream lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

async fn get_result(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    let session = state.sessions.get(id)?;
    let artifact = session.result().ok_or(AppError::NoResult)?;
    Ok(Json(presenter::render(&artifact)))
}

async fn export_result(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    let session = state.sessions.get(id)?;
    let artifact = session.result().ok_or(AppError::NoResult)?;
    let file = presenter::export(&artifact);

    Ok((
        [
            (header::CONTENT_TYPE, file.mime_type.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file.file_name)),
        ],
        file.body,
    ))
}

