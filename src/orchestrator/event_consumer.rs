//! Engine event consumer for headless operation.
//!
//! Stands in for the desktop UI observer when the server runs without one:
//! reads [`EngineEvent`]s from a broadcast subscription and writes the
//! interesting ones to the tracing log.

use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::engine::EngineEvent;
use crate::models::EntryType;

/// Spawn a task that logs engine events until cancelled or the engine drops.
#[must_use]
pub fn spawn_event_logger(
    mut rx: broadcast::Receiver<EngineEvent>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                () = cancel.cancelled() => {
                    info!("event logger shutting down");
                    break;
                }
                received = rx.recv() => match received {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event logger lagged behind engine");
                        continue;
                    }
                    Err(RecvError::Closed) => {
                        info!("engine event channel closed");
                        break;
                    }
                },
            };

            match event {
                EngineEvent::EntryAppended(entry) => match entry.entry_type {
                    EntryType::Warning1 | EntryType::Warning2 | EntryType::Error => {
                        warn!(
                            entry_id = entry.id,
                            target = %entry.target_name,
                            "{}", entry.content
                        );
                    }
                    EntryType::Info => {}
                    _ => {
                        info!(
                            entry_id = entry.id,
                            target = %entry.target_name,
                            "{}", entry.content
                        );
                    }
                },
                EngineEvent::RosterChanged { targets, selected } => {
                    info!(
                        targets = targets.len(),
                        selected = ?selected,
                        "routing targets rebuilt"
                    );
                }
                // Fires every tick per running team.
                EngineEvent::TimerChanged(_) => {}
            }
        }
    })
}
