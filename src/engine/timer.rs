//! Per-team elapsed-time accumulator.

use std::time::Duration;

use tokio::time::Instant;

use super::warning::{self, WarningTransition};
use crate::models::{TeamId, TeamSnapshot, Thresholds, WarningState};

/// Run/stop state and accumulated deployment time for one team.
///
/// Every command takes the current instant explicitly so that the caller
/// (the engine, or a test) controls the clock. Commands report whether they
/// changed anything; inapplicable commands are silent no-ops.
#[derive(Debug, Clone)]
pub struct TeamTimer {
    id: TeamId,
    display_name: String,
    /// Time banked by completed run intervals.
    accumulated: Duration,
    /// Start of the current run interval, `None` while stopped.
    running_since: Option<Instant>,
    elapsed: Duration,
    thresholds: Thresholds,
    warning_state: WarningState,
}

impl TeamTimer {
    /// Create a stopped timer at zero.
    #[must_use]
    pub fn new(id: TeamId, display_name: impl Into<String>, thresholds: Thresholds) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            accumulated: Duration::ZERO,
            running_since: None,
            elapsed: Duration::ZERO,
            thresholds,
            warning_state: WarningState::Normal,
        }
    }

    /// Begin a run interval at `now`. Returns `false` if already running.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.running_since.is_some() {
            return false;
        }
        self.running_since = Some(now);
        true
    }

    /// Bank the current run interval at `now`. Returns `false` if stopped.
    pub fn stop(&mut self, now: Instant) -> bool {
        let Some(since) = self.running_since.take() else {
            return false;
        };
        self.accumulated += now.saturating_duration_since(since);
        self.elapsed = self.accumulated;
        true
    }

    /// Force the timer to stopped, zero, `Normal`.
    ///
    /// Returns `false` when the timer was already in that state.
    pub fn reset(&mut self) -> bool {
        let changed = self.running_since.is_some()
            || self.elapsed > Duration::ZERO
            || self.warning_state != WarningState::Normal;
        self.running_since = None;
        self.accumulated = Duration::ZERO;
        self.elapsed = Duration::ZERO;
        self.warning_state = WarningState::Normal;
        changed
    }

    /// Recompute `elapsed` from the running reference instant.
    pub fn advance(&mut self, now: Instant) {
        if let Some(since) = self.running_since {
            self.elapsed = self.accumulated + now.saturating_duration_since(since);
        }
    }

    /// Run the warning evaluator against the current elapsed value.
    ///
    /// Stopped timers neither enter nor leave a warning state.
    pub fn evaluate_warnings(&mut self) -> Vec<WarningTransition> {
        if !self.is_running() {
            return Vec::new();
        }
        let eval = warning::evaluate(self.elapsed, &self.thresholds, self.warning_state);
        self.warning_state = eval.state;
        eval.transitions
    }

    /// Replace the thresholds. The warning state is left untouched.
    pub fn set_thresholds(&mut self, thresholds: Thresholds) {
        self.thresholds = thresholds;
    }

    /// Team handle.
    #[must_use]
    pub fn id(&self) -> TeamId {
        self.id
    }

    /// Display label.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Elapsed time as of the last command or advance.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Whether a run interval is open.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    /// Configured thresholds.
    #[must_use]
    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Current escalation level.
    #[must_use]
    pub fn warning_state(&self) -> WarningState {
        self.warning_state
    }

    /// Read-only copy for external readers.
    #[must_use]
    pub fn snapshot(&self) -> TeamSnapshot {
        TeamSnapshot {
            id: self.id,
            display_name: self.display_name.clone(),
            elapsed_seconds: self.elapsed.as_secs(),
            is_running: self.is_running(),
            first_threshold_seconds: self.thresholds.first().as_secs(),
            second_threshold_seconds: self.thresholds.second().as_secs(),
            warning_state: self.warning_state,
        }
    }
}

/// Render a duration as `HH:MM:SS`.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
