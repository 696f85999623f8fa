//! Log entry model, entry kinds, and the canonical relevance policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Deepest nesting level a reply can occupy. Replies below it share depth 3.
pub const MAX_THREAD_DEPTH: u8 = 3;

/// Kind tag distinguishing system-generated and operator-entered entries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// A team timer was started.
    TimerStart,
    /// A team timer was stopped.
    TimerStop,
    /// A team timer was reset to zero.
    TimerReset,
    /// A team crossed its first warning threshold.
    Warning1,
    /// A team crossed its second warning threshold.
    Warning2,
    /// A team joined or left the deployment.
    TeamEvent,
    /// Session-level event (mission start, shutdown).
    SystemEvent,
    /// Informational chatter.
    Info,
    /// Note typed by an operator.
    Manual,
    /// Something went wrong and operators should know.
    Error,
    /// Reply to an existing entry.
    Reply,
}

impl EntryType {
    /// Whether entries of this kind belong in the mission-relevant view.
    ///
    /// Routine timer start/stop/reset and informational chatter are audit
    /// detail only.
    #[must_use]
    pub fn is_mission_relevant(self) -> bool {
        !matches!(
            self,
            Self::TimerStart | Self::TimerStop | Self::TimerReset | Self::Info
        )
    }

    /// Whether this kind is a warning escalation.
    #[must_use]
    pub fn is_warning(self) -> bool {
        matches!(self, Self::Warning1 | Self::Warning2)
    }
}

/// Snapshot filter shared by the UI, the mobile mirror and the exporter.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Relevance {
    /// The complete audit trail.
    Full,
    /// Only entries an incident commander needs to see.
    #[default]
    #[serde(rename = "relevant")]
    MissionRelevant,
}

impl Relevance {
    /// Test an entry against this filter.
    #[must_use]
    pub fn matches(self, entry: &LogEntry) -> bool {
        match self {
            Self::Full => true,
            Self::MissionRelevant => entry.entry_type.is_mission_relevant(),
        }
    }
}

/// An immutable, finalized log entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct LogEntry {
    /// Unique, monotonically assigned identifier.
    pub id: u64,
    /// Text payload.
    pub content: String,
    /// Creation time; the log is ordered by it.
    pub timestamp: DateTime<Utc>,
    /// Team or channel this entry is associated with.
    pub target_name: String,
    /// Kind tag.
    pub entry_type: EntryType,
    /// Parent entry when this is a reply.
    pub reply_to_id: Option<u64>,
    /// Id of the root entry of the conversation (own id for roots).
    pub thread_id: u64,
    /// Nesting level in `0..=MAX_THREAD_DEPTH`.
    pub thread_depth: u8,
}

impl LogEntry {
    /// Whether this entry starts its own thread.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.reply_to_id.is_none()
    }
}

/// Caller-supplied fields of an entry that has not been appended yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    /// Text payload.
    pub content: String,
    /// Team or channel name.
    pub target_name: String,
    /// Kind tag.
    pub entry_type: EntryType,
    /// Explicit creation time; the log stamps `Utc::now()` when unset.
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewEntry {
    /// Construct an entry of the given kind.
    #[must_use]
    pub fn new(
        entry_type: EntryType,
        content: impl Into<String>,
        target_name: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            target_name: target_name.into(),
            entry_type,
            timestamp: None,
        }
    }

    /// Shorthand for an operator note.
    #[must_use]
    pub fn manual(content: impl Into<String>, target_name: impl Into<String>) -> Self {
        Self::new(EntryType::Manual, content, target_name)
    }

    /// Pin the creation time instead of stamping it at append.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}
