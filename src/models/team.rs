//! Team identity, warning thresholds, and the read-only team view.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Stable handle for a registered team, unique for the session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TeamId(pub u64);

impl Display for TeamId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Escalation level of a team timer.
///
/// Variants are ordered so that `Normal < FirstWarned < SecondWarned`.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum WarningState {
    /// Below the first threshold.
    #[default]
    Normal,
    /// First threshold reached.
    FirstWarned,
    /// Second threshold reached.
    SecondWarned,
}

/// Pair of elapsed-time boundaries, always with `first < second`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    first: Duration,
    second: Duration,
}

impl Thresholds {
    /// Build a threshold pair.
    ///
    /// Config validation rejects `first >= second` before it gets here; if the
    /// invariant is still violated, `second` is clamped to `first + 1s`.
    #[must_use]
    pub fn new(first: Duration, second: Duration) -> Self {
        if first >= second {
            let clamped = first.saturating_add(Duration::from_secs(1));
            warn!(
                first_secs = first.as_secs(),
                second_secs = second.as_secs(),
                clamped_secs = clamped.as_secs(),
                "second threshold not above first; clamping"
            );
            return Self {
                first,
                second: clamped,
            };
        }
        Self { first, second }
    }

    /// Convenience constructor from whole minutes.
    ///
    /// Out-of-range minute values saturate; callers taking operator input
    /// check them with [`minutes_to_duration`] first.
    #[must_use]
    pub fn from_minutes(first: u64, second: u64) -> Self {
        Self::new(
            Duration::from_secs(first.saturating_mul(60)),
            Duration::from_secs(second.saturating_mul(60)),
        )
    }

    /// First warning boundary.
    #[must_use]
    pub fn first(&self) -> Duration {
        self.first
    }

    /// Second warning boundary.
    #[must_use]
    pub fn second(&self) -> Duration {
        self.second
    }
}

/// Whole minutes as a [`Duration`], or `None` if the seconds overflow `u64`.
#[must_use]
pub fn minutes_to_duration(minutes: u64) -> Option<Duration> {
    minutes.checked_mul(60).map(Duration::from_secs)
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::from_minutes(45, 60)
    }
}

/// Consistent, read-only view of one team timer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TeamSnapshot {
    /// Team handle.
    pub id: TeamId,
    /// Display label.
    pub display_name: String,
    /// Whole seconds of accumulated deployment time.
    pub elapsed_seconds: u64,
    /// Whether the timer is currently running.
    pub is_running: bool,
    /// First warning boundary in seconds.
    pub first_threshold_seconds: u64,
    /// Second warning boundary in seconds.
    pub second_threshold_seconds: u64,
    /// Current escalation level.
    pub warning_state: WarningState,
}
