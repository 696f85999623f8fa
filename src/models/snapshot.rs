//! Whole-session view handed to the mobile mirror and the exporter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{LogEntry, Relevance, RoutingTarget, TeamSnapshot};

/// A consistent read of teams, routing targets and log entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SessionSnapshot {
    /// Identifier of the deployment session.
    pub session_id: String,
    /// When the snapshot was taken.
    pub generated_at: DateTime<Utc>,
    /// Filter applied to `entries`.
    pub relevance: Relevance,
    /// Team timers in registration order.
    pub teams: Vec<TeamSnapshot>,
    /// Current routing targets.
    pub targets: Vec<RoutingTarget>,
    /// Currently selected routing target, if any.
    pub selected_target: Option<String>,
    /// Log entries matching `relevance`, oldest first.
    pub entries: Vec<LogEntry>,
}
