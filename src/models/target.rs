//! Routing targets that log entries can be addressed to.

use serde::{Deserialize, Serialize};

/// A named destination for notes: a fixed channel or a live team.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RoutingTarget {
    /// Name shown to operators and stored on log entries.
    pub display_name: String,
    /// Secondary description (channel purpose, team label).
    pub detail: String,
    /// `true` for static channels, `false` for team-derived targets.
    pub is_fixed_channel: bool,
}

impl RoutingTarget {
    /// Construct a fixed channel target.
    #[must_use]
    pub fn channel(display_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            detail: detail.into(),
            is_fixed_channel: true,
        }
    }

    /// Construct a team-derived target.
    #[must_use]
    pub fn team(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            detail: "Team".into(),
            is_fixed_channel: false,
        }
    }
}
