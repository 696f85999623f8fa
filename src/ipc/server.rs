//! Local IPC server for `mission-timer-ctl` commands.
//!
//! Listens on a named pipe (Windows) or Unix domain socket (Linux/macOS)
//! using the `interprocess` crate. Accepts line-delimited JSON commands and
//! routes them to the [`MissionEngine`].
//!
//! ## Protocol
//!
//! Request (one JSON object per line):
//! ```json
//! {"command": "list"}
//! {"command": "start", "team": "Alpha"}
//! {"command": "add-team", "team": "Bravo", "first_minutes": 30, "second_minutes": 45}
//! {"command": "note", "content": "Alpha at grid 4B", "target": "Radio"}
//! {"command": "reply", "parent_id": 12, "content": "copy"}
//! ```
//!
//! Response (one JSON object per line):
//! ```json
//! {"ok": true, "data": { ... } }
//! {"ok": false, "error": "not found: team 'Zulu'"}
//! ```

use std::sync::Arc;
use std::time::Duration;

use interprocess::local_socket::{tokio::prelude::*, GenericNamespaced, ListenerOptions};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::engine::{format_elapsed, MissionEngine};
use crate::models::{minutes_to_duration, TeamId, Thresholds};
use crate::{AppError, Result};

/// Inbound IPC request from `mission-timer-ctl`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IpcRequest {
    /// Command verb.
    pub command: String,
    /// Team display name (timer and roster commands).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    /// Note or reply text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Routing target for notes and replies, or the target to select.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Parent entry for `reply`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u64>,
    /// First threshold override in minutes (`add-team`, `thresholds`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_minutes: Option<u64>,
    /// Second threshold override in minutes (`add-team`, `thresholds`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_minutes: Option<u64>,
}

impl IpcRequest {
    /// Request with only a command verb.
    #[must_use]
    pub fn command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    /// Request addressing a team by name.
    #[must_use]
    pub fn for_team(command: impl Into<String>, team: impl Into<String>) -> Self {
        Self {
            team: Some(team.into()),
            ..Self::command(command)
        }
    }
}

/// Outbound IPC response to `mission-timer-ctl`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IpcResponse {
    /// Whether the command succeeded.
    pub ok: bool,
    /// Payload on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IpcResponse {
    fn success(data: serde_json::Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

impl From<AppError> for IpcResponse {
    fn from(err: AppError) -> Self {
        Self::error(err.to_string())
    }
}

/// Spawn the IPC server task.
///
/// # Errors
///
/// Returns `AppError::Ipc` if the listener cannot be created.
pub fn spawn_ipc_server(
    engine: Arc<MissionEngine>,
    name: String,
    ct: CancellationToken,
) -> Result<tokio::task::JoinHandle<()>> {
    let listener_name = name
        .clone()
        .to_ns_name::<GenericNamespaced>()
        .map_err(|err| AppError::Ipc(format!("invalid ipc socket name '{name}': {err}")))?;

    let listener = ListenerOptions::new()
        .name(listener_name)
        .create_tokio()
        .map_err(|err| AppError::Ipc(format!("failed to create ipc listener: {err}")))?;

    info!(ipc_name = %name, "IPC server listening");

    let handle = tokio::spawn(async move {
        let span = info_span!("ipc_server", name = %name);
        async move {
            loop {
                tokio::select! {
                    () = ct.cancelled() => {
                        info!("IPC server shutting down");
                        break;
                    }
                    accept_result = listener.accept() => {
                        match accept_result {
                            Ok(stream) => {
                                let engine = Arc::clone(&engine);
                                tokio::spawn(handle_connection(stream, engine));
                            }
                            Err(err) => {
                                warn!(%err, "IPC accept failed");
                            }
                        }
                    }
                }
            }
        }
        .instrument(span)
        .await;
    });

    Ok(handle)
}

/// Handle a single IPC client connection.
async fn handle_connection(
    stream: interprocess::local_socket::tokio::Stream,
    engine: Arc<MissionEngine>,
) {
    let span = info_span!("ipc_conn");
    async move {
        let (reader, mut writer) = stream.split();
        let mut buf_reader = BufReader::new(reader);
        let mut line = String::new();

        loop {
            line.clear();
            match buf_reader.read_line(&mut line).await {
                Ok(0) => break,
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    let response = match serde_json::from_str::<IpcRequest>(trimmed) {
                        Ok(request) => dispatch(&engine, &request),
                        Err(err) => IpcResponse::error(format!("invalid json: {err}")),
                    };

                    let mut response_line = serde_json::to_string(&response).unwrap_or_else(|_| {
                        r#"{"ok":false,"error":"serialization failed"}"#.to_owned()
                    });
                    response_line.push('\n');

                    if let Err(err) = writer.write_all(response_line.as_bytes()).await {
                        warn!(%err, "failed to write ipc response");
                        break;
                    }
                }
                Err(err) => {
                    warn!(%err, "ipc read error");
                    break;
                }
            }
        }

        info!("IPC connection closed");
    }
    .instrument(span)
    .await;
}

/// Route an IPC command to the engine.
pub fn dispatch(engine: &MissionEngine, request: &IpcRequest) -> IpcResponse {
    let _guard = info_span!("ipc_command", command = %request.command).entered();

    let result = match request.command.as_str() {
        "list" => Ok(handle_list(engine)),
        "targets" => Ok(handle_targets(engine)),
        "start" => handle_timer(engine, request, MissionEngine::start_team, "started"),
        "stop" => handle_timer(engine, request, MissionEngine::stop_team, "stopped"),
        "reset" => handle_timer(engine, request, MissionEngine::reset_team, "reset"),
        "add-team" => handle_add_team(engine, request),
        "remove-team" => handle_remove_team(engine, request),
        "thresholds" => handle_thresholds(engine, request),
        "note" => handle_note(engine, request),
        "reply" => handle_reply(engine, request),
        "select" => handle_select(engine, request),
        other => return IpcResponse::error(format!("unknown command: {other}")),
    };

    result.unwrap_or_else(|err| {
        warn!(command = %request.command, %err, "IPC command failed");
        err.into()
    })
}

fn required<'a>(value: Option<&'a String>, field: &str) -> Result<&'a str> {
    value
        .map(String::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::InvalidInput(format!("missing required '{field}' field")))
}

fn resolve_team(engine: &MissionEngine, request: &IpcRequest) -> Result<TeamId> {
    let name = required(request.team.as_ref(), "team")?;
    engine
        .find_team(name)
        .ok_or_else(|| AppError::NotFound(format!("team '{name}'")))
}

fn thresholds_from(engine: &MissionEngine, request: &IpcRequest) -> Result<Option<Thresholds>> {
    if request.first_minutes.is_none() && request.second_minutes.is_none() {
        return Ok(None);
    }
    let defaults = engine.default_thresholds();
    let first = minutes_field(request.first_minutes, "first_minutes")?.unwrap_or(defaults.first());
    let second =
        minutes_field(request.second_minutes, "second_minutes")?.unwrap_or(defaults.second());
    if first >= second {
        return Err(AppError::InvalidInput(format!(
            "first threshold ({}) must be less than second threshold ({})",
            format_elapsed(first),
            format_elapsed(second)
        )));
    }
    Ok(Some(Thresholds::new(first, second)))
}

fn minutes_field(value: Option<u64>, field: &str) -> Result<Option<Duration>> {
    value
        .map(|minutes| {
            minutes_to_duration(minutes).ok_or_else(|| {
                AppError::InvalidInput(format!("'{field}' ({minutes}) is out of range"))
            })
        })
        .transpose()
}

fn to_json<T: Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

fn handle_list(engine: &MissionEngine) -> IpcResponse {
    IpcResponse::success(serde_json::json!({ "teams": to_json(&engine.teams()) }))
}

fn handle_targets(engine: &MissionEngine) -> IpcResponse {
    IpcResponse::success(serde_json::json!({
        "targets": to_json(&engine.targets()),
        "selected": engine.selected_target(),
    }))
}

fn handle_timer(
    engine: &MissionEngine,
    request: &IpcRequest,
    command: fn(&MissionEngine, TeamId) -> Result<bool>,
    verb: &str,
) -> Result<IpcResponse> {
    let id = resolve_team(engine, request)?;
    let changed = command(engine, id)?;
    info!(team_id = %id, verb, changed, "timer command via IPC");
    Ok(IpcResponse::success(serde_json::json!({
        "team": to_json(&engine.team(id)),
        "changed": changed,
        "action": verb,
    })))
}

fn handle_add_team(engine: &MissionEngine, request: &IpcRequest) -> Result<IpcResponse> {
    let name = required(request.team.as_ref(), "team")?;
    let thresholds = thresholds_from(engine, request)?;
    let id = engine.register_team(name, thresholds)?;
    Ok(IpcResponse::success(
        serde_json::json!({ "team": to_json(&engine.team(id)) }),
    ))
}

fn handle_remove_team(engine: &MissionEngine, request: &IpcRequest) -> Result<IpcResponse> {
    let id = resolve_team(engine, request)?;
    engine.remove_team(id)?;
    Ok(IpcResponse::success(serde_json::json!({
        "removed": id,
        "selected": engine.selected_target(),
    })))
}

fn handle_thresholds(engine: &MissionEngine, request: &IpcRequest) -> Result<IpcResponse> {
    let id = resolve_team(engine, request)?;
    let thresholds = thresholds_from(engine, request)?.ok_or_else(|| {
        AppError::InvalidInput("expected 'first_minutes' and/or 'second_minutes'".into())
    })?;
    let team = engine.set_thresholds(id, thresholds)?;
    Ok(IpcResponse::success(serde_json::json!({ "team": to_json(&team) })))
}

fn handle_note(engine: &MissionEngine, request: &IpcRequest) -> Result<IpcResponse> {
    let content = required(request.content.as_ref(), "content")?;
    let target = match request.target.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_owned(),
        _ => engine
            .selected_target()
            .ok_or_else(|| AppError::InvalidInput("no target given and none selected".into()))?,
    };
    let entry = engine.append_note(content, &target);
    Ok(IpcResponse::success(serde_json::json!({ "entry": to_json(&entry) })))
}

fn handle_reply(engine: &MissionEngine, request: &IpcRequest) -> Result<IpcResponse> {
    let parent_id = request
        .parent_id
        .ok_or_else(|| AppError::InvalidInput("missing required 'parent_id' field".into()))?;
    let content = required(request.content.as_ref(), "content")?;
    let entry = engine.append_reply(parent_id, content, request.target.clone())?;
    Ok(IpcResponse::success(serde_json::json!({ "entry": to_json(&entry) })))
}

fn handle_select(engine: &MissionEngine, request: &IpcRequest) -> Result<IpcResponse> {
    let target = required(request.target.as_ref(), "target")?;
    engine.select_target(target)?;
    Ok(IpcResponse::success(serde_json::json!({ "selected": target })))
}
