//! Change notifications fanned out to read-side subscribers.

use crate::models::{LogEntry, RoutingTarget, TeamSnapshot};

/// Default buffer depth of the observer channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Something observers may want to redraw.
///
/// Delivered over a `tokio::sync::broadcast` channel; slow receivers lose
/// the oldest events and should re-read engine state when they see
/// `RecvError::Lagged`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A new entry landed in the log.
    EntryAppended(LogEntry),
    /// A team timer changed run state, elapsed time, or warning level.
    TimerChanged(TeamSnapshot),
    /// A team was added or removed; routing targets were rebuilt.
    RosterChanged {
        /// Targets after the rebuild.
        targets: Vec<RoutingTarget>,
        /// Selection after the rebuild.
        selected: Option<String>,
    },
}
