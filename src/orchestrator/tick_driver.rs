//! Periodic clock driver.
//!
//! A single task ticks the [`MissionEngine`] at a fixed interval (1 Hz by
//! default). Each tick advances every running team timer in registration
//! order and records any warning transitions. Cancelling the token stops
//! the loop between ticks; entries already appended stay in the log.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};

use crate::engine::MissionEngine;

/// Default tick period.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Spawn the tick loop.
///
/// Missed ticks are skipped rather than replayed in a burst; the warning
/// evaluator already reports every threshold crossed since the last tick.
#[must_use]
pub fn spawn_tick_driver(
    engine: Arc<MissionEngine>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(?interval, "tick driver started");
            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        info!("tick driver shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        let warnings = engine.tick();
                        if !warnings.is_empty() {
                            debug!(count = warnings.len(), "tick produced warnings");
                        }
                    }
                }
            }
        }
        .instrument(info_span!("tick_driver")),
    )
}
