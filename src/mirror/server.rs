//! `axum` router and server loop for the mobile mirror.
//!
//! All routes are `GET` reads except `POST /api/replies`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::engine::MissionEngine;
use crate::models::{LogEntry, Relevance, SessionSnapshot, TeamSnapshot};
use crate::{AppError, Result};

/// Query string of `GET /api/log`.
#[derive(Debug, Default, Deserialize)]
struct LogQuery {
    /// `full` or `relevant`; defaults to `relevant`.
    #[serde(default)]
    view: Relevance,
}

/// Body of `POST /api/replies`.
#[derive(Debug, Deserialize)]
struct ReplyRequest {
    parent_id: u64,
    content: String,
    #[serde(default)]
    target_name: Option<String>,
}

/// Maps engine errors onto HTTP status codes with a JSON body.
struct MirrorError(AppError);

impl IntoResponse for MirrorError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

impl From<AppError> for MirrorError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// Handler for `GET /health`.
async fn health() -> &'static str {
    "ok"
}

/// Handler for `GET /api/snapshot`: the mission-relevant session view.
async fn snapshot(State(engine): State<Arc<MissionEngine>>) -> Json<SessionSnapshot> {
    Json(engine.session_snapshot(Relevance::MissionRelevant))
}

/// Handler for `GET /api/log`.
async fn log(
    State(engine): State<Arc<MissionEngine>>,
    Query(query): Query<LogQuery>,
) -> Json<Vec<LogEntry>> {
    Json(engine.snapshot(query.view))
}

/// Handler for `GET /api/teams`.
async fn teams(State(engine): State<Arc<MissionEngine>>) -> Json<Vec<TeamSnapshot>> {
    Json(engine.teams())
}

/// Handler for `GET /api/threads/{id}`.
async fn thread(
    State(engine): State<Arc<MissionEngine>>,
    Path(id): Path<u64>,
) -> std::result::Result<Json<Vec<LogEntry>>, MirrorError> {
    let entries = engine.thread_of(id);
    if entries.is_empty() {
        return Err(AppError::NotFound(format!("log entry {id}")).into());
    }
    Ok(Json(entries))
}

/// Handler for `POST /api/replies`.
async fn create_reply(
    State(engine): State<Arc<MissionEngine>>,
    Json(request): Json<ReplyRequest>,
) -> std::result::Result<(StatusCode, Json<LogEntry>), MirrorError> {
    let content = request.content.trim();
    if content.is_empty() {
        return Err(AppError::InvalidInput("reply content must not be empty".into()).into());
    }
    let target = request
        .target_name
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty());

    match engine.append_reply(request.parent_id, content, target) {
        Ok(entry) => {
            info!(entry_id = entry.id, parent_id = request.parent_id, "remote reply accepted");
            Ok((StatusCode::CREATED, Json(entry)))
        }
        Err(err) => {
            warn!(parent_id = request.parent_id, %err, "remote reply rejected");
            Err(err.into())
        }
    }
}

/// Build the mirror router around a shared engine.
pub fn router(engine: Arc<MissionEngine>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/snapshot", get(snapshot))
        .route("/api/log", get(log))
        .route("/api/teams", get(teams))
        .route("/api/threads/{id}", get(thread))
        .route("/api/replies", post(create_reply))
        .with_state(engine)
}

/// Bind `127.0.0.1:<port>` and serve the mirror until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Http` if the server fails to bind or serve.
pub async fn serve_mirror(
    engine: Arc<MissionEngine>,
    port: u16,
    ct: CancellationToken,
) -> Result<()> {
    let bind = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|err| AppError::Http(format!("failed to bind mirror on {bind}: {err}")))?;
    serve_with_listener(listener, engine, ct).await
}

/// Serve the mirror on an already-bound listener until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Http` if the server loop fails.
pub async fn serve_with_listener(
    listener: TcpListener,
    engine: Arc<MissionEngine>,
    ct: CancellationToken,
) -> Result<()> {
    let addr = listener
        .local_addr()
        .map_err(|err| AppError::Http(format!("listener has no local address: {err}")))?;
    info!(%addr, "starting mobile mirror");

    axum::serve(listener, router(engine))
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|err| AppError::Http(format!("mirror server error: {err}")))?;

    info!("mobile mirror shut down");
    Ok(())
}
