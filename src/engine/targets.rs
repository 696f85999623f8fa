//! Addressable routing targets: fixed channels plus one entry per live team.

use tracing::debug;

use crate::models::RoutingTarget;

/// Current target list and the advisory selection.
#[derive(Debug, Clone)]
pub struct NoteTargetRegistry {
    fixed: Vec<RoutingTarget>,
    targets: Vec<RoutingTarget>,
    selected: Option<String>,
}

impl NoteTargetRegistry {
    /// Create a registry holding only the fixed channels, with the first one
    /// selected.
    #[must_use]
    pub fn new(fixed: Vec<RoutingTarget>) -> Self {
        let mut registry = Self {
            fixed,
            targets: Vec::new(),
            selected: None,
        };
        registry.rebuild::<&str>(&[]);
        registry
    }

    /// Recompute the list as fixed channels followed by `current_teams`.
    ///
    /// The previous selection survives if its name is still present,
    /// otherwise the first fixed channel is selected. Returns the new
    /// selection.
    pub fn rebuild<S: AsRef<str>>(&mut self, current_teams: &[S]) -> Option<&str> {
        self.targets = self
            .fixed
            .iter()
            .cloned()
            .chain(
                current_teams
                    .iter()
                    .map(|name| RoutingTarget::team(name.as_ref())),
            )
            .collect();

        let keep = self
            .selected
            .as_deref()
            .is_some_and(|name| self.contains(name));
        if !keep {
            let fallback = self.fixed.first().map(|t| t.display_name.clone());
            debug!(
                previous = ?self.selected,
                fallback = ?fallback,
                "selected target no longer exists; falling back"
            );
            self.selected = fallback;
        }
        self.selected.as_deref()
    }

    /// Select `name` if it is a current target. Returns whether it was.
    pub fn select(&mut self, name: &str) -> bool {
        if self.contains(name) {
            self.selected = Some(name.to_owned());
            true
        } else {
            false
        }
    }

    /// Whether a target with this display name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.targets.iter().any(|t| t.display_name == name)
    }

    /// Whether `name` is one of the fixed channels.
    #[must_use]
    pub fn is_fixed_channel(&self, name: &str) -> bool {
        self.fixed.iter().any(|t| t.display_name == name)
    }

    /// Current target list, fixed channels first.
    #[must_use]
    pub fn targets(&self) -> &[RoutingTarget] {
        &self.targets
    }

    /// Currently selected target name.
    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }
}
