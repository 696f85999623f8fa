//! Domain model module declarations.

pub mod entry;
pub mod snapshot;
pub mod target;
pub mod team;

pub use entry::{EntryType, LogEntry, NewEntry, Relevance, MAX_THREAD_DEPTH};
pub use snapshot::SessionSnapshot;
pub use target::RoutingTarget;
pub use team::{minutes_to_duration, TeamId, TeamSnapshot, Thresholds, WarningState};
