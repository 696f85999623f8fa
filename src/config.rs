//! Global configuration parsing and validation.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::models::{minutes_to_duration, RoutingTarget, Thresholds};
use crate::{AppError, Result};

/// Session-wide warning thresholds (minutes).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ThresholdConfig {
    /// Elapsed minutes before the first warning.
    #[serde(default = "default_first_warning_minutes")]
    pub first_warning_minutes: u64,
    /// Elapsed minutes before the second warning.
    #[serde(default = "default_second_warning_minutes")]
    pub second_warning_minutes: u64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            first_warning_minutes: default_first_warning_minutes(),
            second_warning_minutes: default_second_warning_minutes(),
        }
    }
}

/// Periodic snapshot export settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SnapshotConfig {
    /// Whether periodic snapshots are written.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Destination file for the JSON snapshot.
    #[serde(default = "default_snapshot_path")]
    pub path: PathBuf,
    /// Seconds between snapshots.
    #[serde(default = "default_snapshot_interval")]
    pub interval_seconds: u64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_snapshot_path(),
            interval_seconds: default_snapshot_interval(),
        }
    }
}

/// A fixed routing channel.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ChannelConfig {
    /// Channel name shown to operators.
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub detail: String,
}

/// A team registered at startup.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TeamConfig {
    /// Team display name.
    pub name: String,
    /// Per-team override of the first threshold.
    pub first_warning_minutes: Option<u64>,
    /// Per-team override of the second threshold.
    pub second_warning_minutes: Option<u64>,
}

fn default_true() -> bool {
    true
}

fn default_first_warning_minutes() -> u64 {
    45
}

fn default_second_warning_minutes() -> u64 {
    60
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("mission-snapshot.json")
}

fn default_snapshot_interval() -> u64 {
    30
}

fn default_http_port() -> u16 {
    8080
}

fn default_ipc_name() -> String {
    "mission-timer".into()
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_channels() -> Vec<ChannelConfig> {
    [
        ("Mission Lead", "Incident command"),
        ("Radio", "Radio operator"),
        ("All Teams", "Broadcast to every team"),
    ]
    .into_iter()
    .map(|(name, detail)| ChannelConfig {
        name: name.into(),
        detail: detail.into(),
    })
    .collect()
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// HTTP port for the mobile mirror.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Named pipe / Unix socket identifier for `mission-timer-ctl`.
    #[serde(default = "default_ipc_name")]
    pub ipc_name: String,
    /// Milliseconds between clock ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Session-wide warning thresholds.
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    /// Snapshot export settings.
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    /// Fixed routing channels, in display order.
    #[serde(default = "default_channels")]
    pub channels: Vec<ChannelConfig>,
    /// Teams registered at startup, in registration order.
    #[serde(default)]
    pub teams: Vec<TeamConfig>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            ipc_name: default_ipc_name(),
            tick_interval_ms: default_tick_interval_ms(),
            thresholds: ThresholdConfig::default(),
            snapshot: SnapshotConfig::default(),
            channels: default_channels(),
            teams: Vec::new(),
        }
    }
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Session-wide default thresholds.
    #[must_use]
    pub fn default_thresholds(&self) -> Thresholds {
        Thresholds::from_minutes(
            self.thresholds.first_warning_minutes,
            self.thresholds.second_warning_minutes,
        )
    }

    /// Thresholds for one team, each falling back to the session default.
    #[must_use]
    pub fn team_thresholds(&self, team: &TeamConfig) -> Thresholds {
        let (first, second) = self.team_minutes(team);
        Thresholds::from_minutes(first, second)
    }

    /// Interval between clock ticks.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Interval between snapshot exports.
    #[must_use]
    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_secs(self.snapshot.interval_seconds)
    }

    /// Fixed channels as routing targets.
    #[must_use]
    pub fn fixed_channels(&self) -> Vec<RoutingTarget> {
        self.channels
            .iter()
            .map(|c| RoutingTarget::channel(c.name.clone(), c.detail.clone()))
            .collect()
    }

    fn team_minutes(&self, team: &TeamConfig) -> (u64, u64) {
        (
            team.first_warning_minutes
                .unwrap_or(self.thresholds.first_warning_minutes),
            team.second_warning_minutes
                .unwrap_or(self.thresholds.second_warning_minutes),
        )
    }

    fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(AppError::Config(
                "tick_interval_ms must be greater than zero".into(),
            ));
        }

        if self.snapshot.enabled && self.snapshot.interval_seconds == 0 {
            return Err(AppError::Config(
                "snapshot.interval_seconds must be greater than zero".into(),
            ));
        }

        validate_threshold_pair(
            "thresholds",
            self.thresholds.first_warning_minutes,
            self.thresholds.second_warning_minutes,
        )?;

        let mut names = HashSet::new();
        for channel in &self.channels {
            if channel.name.trim().is_empty() {
                return Err(AppError::Config("channel name must not be empty".into()));
            }
            if !names.insert(channel.name.as_str()) {
                return Err(AppError::Config(format!(
                    "duplicate channel name '{}'",
                    channel.name
                )));
            }
        }

        for team in &self.teams {
            if team.name.trim().is_empty() {
                return Err(AppError::Config("team name must not be empty".into()));
            }
            if !names.insert(team.name.as_str()) {
                return Err(AppError::Config(format!(
                    "team name '{}' duplicates another team or channel",
                    team.name
                )));
            }
            let (first, second) = self.team_minutes(team);
            validate_threshold_pair(&format!("team '{}'", team.name), first, second)?;
        }

        Ok(())
    }
}

fn validate_threshold_pair(scope: &str, first: u64, second: u64) -> Result<()> {
    for (field, minutes) in [
        ("first_warning_minutes", first),
        ("second_warning_minutes", second),
    ] {
        if minutes_to_duration(minutes).is_none() {
            return Err(AppError::Config(format!(
                "{scope}: {field} ({minutes}) is out of range"
            )));
        }
    }
    if first >= second {
        return Err(AppError::Config(format!(
            "{scope}: first_warning_minutes ({first}) must be less than \
             second_warning_minutes ({second})"
        )));
    }
    Ok(())
}
