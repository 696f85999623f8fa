//! Edge-triggered warning evaluation.
//!
//! [`evaluate`] is a pure function: it maps the current elapsed time, the
//! team's thresholds and its current [`WarningState`] to the new state plus
//! the transitions that fired on the way there. It never moves backward;
//! only an explicit timer reset returns a team to [`WarningState::Normal`].

use std::time::Duration;

use crate::models::{EntryType, Thresholds, WarningState};

/// A single upward step in warning level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningTransition {
    /// The first threshold was crossed.
    FirstWarned,
    /// The second threshold was crossed.
    SecondWarned,
}

impl WarningTransition {
    /// State reached by this transition.
    #[must_use]
    pub fn state(self) -> WarningState {
        match self {
            Self::FirstWarned => WarningState::FirstWarned,
            Self::SecondWarned => WarningState::SecondWarned,
        }
    }

    /// Log entry kind recorded for this transition.
    #[must_use]
    pub fn entry_type(self) -> EntryType {
        match self {
            Self::FirstWarned => EntryType::Warning1,
            Self::SecondWarned => EntryType::Warning2,
        }
    }
}

/// Result of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// State after evaluation; never lower than the input state.
    pub state: WarningState,
    /// Transitions that fired, in threshold order. Empty when unchanged.
    pub transitions: Vec<WarningTransition>,
}

/// Level implied by `elapsed` alone. Boundaries are inclusive.
#[must_use]
pub fn level_for(elapsed: Duration, thresholds: &Thresholds) -> WarningState {
    if elapsed >= thresholds.second() {
        WarningState::SecondWarned
    } else if elapsed >= thresholds.first() {
        WarningState::FirstWarned
    } else {
        WarningState::Normal
    }
}

/// Compare `elapsed` against `thresholds` starting from `current`.
///
/// When a delayed evaluation jumps straight past both thresholds, both
/// transitions are returned, first then second, so the first warning is
/// never silently skipped.
#[must_use]
pub fn evaluate(elapsed: Duration, thresholds: &Thresholds, current: WarningState) -> Evaluation {
    let reached = level_for(elapsed, thresholds);
    if reached <= current {
        return Evaluation {
            state: current,
            transitions: Vec::new(),
        };
    }

    let transitions = [WarningTransition::FirstWarned, WarningTransition::SecondWarned]
        .into_iter()
        .filter(|t| t.state() > current && t.state() <= reached)
        .collect();

    Evaluation {
        state: reached,
        transitions,
    }
}
