#![forbid(unsafe_code)]

//! `mission-timer`: mission timer and alert engine server binary.
//!
//! Bootstraps configuration, registers the configured roster, and starts
//! the tick driver, the mobile HTTP mirror, the IPC server for
//! `mission-timer-ctl`, and the periodic snapshot exporter.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use mission_timer::config::GlobalConfig;
use mission_timer::engine::MissionEngine;
use mission_timer::export::{self, JsonSnapshotWriter, SnapshotSink};
use mission_timer::models::{EntryType, NewEntry};
use mission_timer::orchestrator::{event_consumer, tick_driver};
use mission_timer::{ipc, mirror, AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "mission-timer", about = "Mission timer and alert engine", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the mobile mirror HTTP port.
    #[arg(long)]
    http_port: Option<u16>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("mission-timer server bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = match args.config {
        Some(ref path) => GlobalConfig::load_from_path(path)?,
        None => {
            info!("no config file given; using defaults");
            GlobalConfig::default()
        }
    };
    if let Some(port) = args.http_port {
        config.http_port = port;
    }
    info!(teams = config.teams.len(), "configuration loaded");

    // ── Build the engine ────────────────────────────────
    let engine = Arc::new(MissionEngine::from_config(&config)?);
    engine.append(NewEntry::new(
        EntryType::SystemEvent,
        "Mission session started",
        engine.selected_target().unwrap_or_default(),
    ));
    info!(session_id = %engine.session_id(), "engine ready");

    let ct = CancellationToken::new();

    // ── Background tasks ────────────────────────────────
    let logger_handle = event_consumer::spawn_event_logger(engine.subscribe(), ct.clone());
    let tick_handle =
        tick_driver::spawn_tick_driver(Arc::clone(&engine), config.tick_interval(), ct.clone());

    let snapshot_sink: Option<Arc<dyn SnapshotSink>> = if config.snapshot.enabled {
        let writer = JsonSnapshotWriter::new(config.snapshot.path.clone())?;
        info!(path = %writer.path().display(), "snapshot export enabled");
        let sink: Arc<dyn SnapshotSink> = Arc::new(writer);
        Some(sink)
    } else {
        info!("snapshot export disabled");
        None
    };
    let snapshot_handle = snapshot_sink.as_ref().map(|sink| {
        export::spawn_snapshot_task(
            Arc::clone(&engine),
            Arc::clone(sink),
            config.snapshot_interval(),
            ct.clone(),
        )
    });

    let ipc_handle =
        match ipc::spawn_ipc_server(Arc::clone(&engine), config.ipc_name.clone(), ct.clone()) {
            Ok(handle) => Some(handle),
            Err(err) => {
                warn!(%err, "IPC server unavailable; continuing without local control");
                None
            }
        };

    let mirror_ct = ct.clone();
    let mirror_engine = Arc::clone(&engine);
    let http_port = config.http_port;
    let mirror_handle = tokio::spawn(async move {
        if let Err(err) = mirror::serve_mirror(mirror_engine, http_port, mirror_ct).await {
            error!(%err, "mobile mirror failed");
        }
    });

    info!("mission-timer ready");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");

    engine.append(NewEntry::new(
        EntryType::SystemEvent,
        "Mission session ended",
        engine.selected_target().unwrap_or_default(),
    ));
    ct.cancel();

    // ── Wait for background tasks ───────────────────────
    let _ = tokio::join!(tick_handle, mirror_handle, logger_handle);
    if let Some(handle) = ipc_handle {
        let _ = handle.await;
    }
    if let Some(handle) = snapshot_handle {
        let _ = handle.await;
    }
    info!(entries = engine.log().len(), "mission-timer shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
