//! Session snapshot export.
//!
//! Provides the [`SnapshotSink`] trait and associated task. The primary
//! implementation, [`JsonSnapshotWriter`], atomically replaces a JSON file
//! with the complete (unfiltered) session view so the offline report and
//! crash recovery always read a whole snapshot.

pub mod writer;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};

use crate::engine::MissionEngine;
use crate::models::{Relevance, SessionSnapshot};

pub use writer::JsonSnapshotWriter;

/// Persists session snapshots.
///
/// Implementations must be [`Send`] and [`Sync`] to allow sharing across
/// async task boundaries via [`std::sync::Arc`].
pub trait SnapshotSink: Send + Sync {
    /// Store one snapshot, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying write operation fails.
    fn write_snapshot(&self, snapshot: &SessionSnapshot) -> crate::Result<()>;
}

/// Take the full audit view and hand it to `sink`.
///
/// Read-only with respect to the engine; safe while the tick driver runs.
///
/// # Errors
///
/// Propagates the sink's write error.
pub fn export_now(engine: &MissionEngine, sink: &dyn SnapshotSink) -> crate::Result<usize> {
    let snapshot = engine.session_snapshot(Relevance::Full);
    let count = snapshot.entries.len();
    sink.write_snapshot(&snapshot)?;
    Ok(count)
}

/// Spawn the periodic snapshot task.
///
/// Writes a full snapshot every `interval` and a final one when `cancel`
/// fires. Write failures are logged and retried on the next interval.
#[must_use]
pub fn spawn_snapshot_task(
    engine: Arc<MissionEngine>,
    sink: Arc<dyn SnapshotSink>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; skip it so startup does
            // not write an empty snapshot.
            ticker.tick().await;
            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        match export_now(&engine, sink.as_ref()) {
                            Ok(entries) => info!(entries, "final snapshot written"),
                            Err(err) => error!(%err, "final snapshot failed"),
                        }
                        info!("snapshot task shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(err) = export_now(&engine, sink.as_ref()) {
                            error!(%err, "snapshot export failed");
                        }
                    }
                }
            }
        }
        .instrument(info_span!("snapshot_task")),
    )
}
