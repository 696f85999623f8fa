//! Mission timer and alert engine.
//!
//! [`MissionEngine`] owns the team timers, the [`EventLog`], the
//! [`NoteTargetRegistry`] and the observer channel. It is constructed
//! explicitly and shared as `Arc<MissionEngine>` between the tick driver,
//! the HTTP mirror, the IPC control server and the snapshot exporter.
//!
//! Locks are always taken in the order teams → targets → log, and observer
//! notifications are sent only after every lock is released.

pub mod events;
pub mod log;
pub mod targets;
pub mod timer;
pub mod warning;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::GlobalConfig;
use crate::models::{
    EntryType, LogEntry, NewEntry, Relevance, RoutingTarget, SessionSnapshot, TeamId,
    TeamSnapshot, Thresholds,
};
use crate::{AppError, Result};

pub use events::{EngineEvent, EVENT_CHANNEL_CAPACITY};
pub use log::EventLog;
pub use targets::NoteTargetRegistry;
pub use timer::{format_elapsed, TeamTimer};
pub use warning::{evaluate, Evaluation, WarningTransition};

/// The shared core of a deployment session.
#[derive(Debug)]
pub struct MissionEngine {
    session_id: Uuid,
    default_thresholds: Thresholds,
    /// Timers in registration order; the tick visits them in this order.
    teams: RwLock<Vec<TeamTimer>>,
    next_team_id: AtomicU64,
    targets: RwLock<NoteTargetRegistry>,
    log: EventLog,
    events: broadcast::Sender<EngineEvent>,
}

impl MissionEngine {
    /// Create an engine with no teams.
    #[must_use]
    pub fn new(default_thresholds: Thresholds, fixed_channels: Vec<RoutingTarget>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            session_id: Uuid::new_v4(),
            default_thresholds,
            teams: RwLock::new(Vec::new()),
            next_team_id: AtomicU64::new(1),
            targets: RwLock::new(NoteTargetRegistry::new(fixed_channels)),
            log: EventLog::new(),
            events,
        }
    }

    /// Create an engine from configuration and register the configured roster.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` if a configured team cannot be
    /// registered (duplicate or empty name).
    pub fn from_config(config: &GlobalConfig) -> Result<Self> {
        let engine = Self::new(config.default_thresholds(), config.fixed_channels());
        for team in &config.teams {
            engine.register_team(&team.name, Some(config.team_thresholds(team)))?;
        }
        Ok(engine)
    }

    fn teams_read(&self) -> RwLockReadGuard<'_, Vec<TeamTimer>> {
        self.teams.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn teams_write(&self) -> RwLockWriteGuard<'_, Vec<TeamTimer>> {
        self.teams.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn targets_read(&self) -> RwLockReadGuard<'_, NoteTargetRegistry> {
        self.targets.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn targets_write(&self) -> RwLockWriteGuard<'_, NoteTargetRegistry> {
        self.targets.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, events: Vec<EngineEvent>) {
        for event in events {
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
    }

    /// Subscribe to change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Identifier of this deployment session.
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Session-wide default thresholds.
    #[must_use]
    pub fn default_thresholds(&self) -> Thresholds {
        self.default_thresholds
    }

    /// Direct read access to the log.
    #[must_use]
    pub fn log(&self) -> &EventLog {
        &self.log
    }

    // ── Roster ──────────────────────────────────────────

    /// Register a team and create its stopped timer.
    ///
    /// `thresholds` of `None` uses the session default. Rebuilds routing
    /// targets and records a `TeamEvent` entry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` if the name is empty or already used
    /// by a team or fixed channel.
    pub fn register_team(&self, name: &str, thresholds: Option<Thresholds>) -> Result<TeamId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("team name must not be empty".into()));
        }

        let mut teams = self.teams_write();
        let mut targets = self.targets_write();
        if teams.iter().any(|t| t.display_name() == name) || targets.is_fixed_channel(name) {
            return Err(AppError::InvalidInput(format!(
                "name '{name}' is already in use"
            )));
        }

        let id = TeamId(self.next_team_id.fetch_add(1, Ordering::SeqCst));
        let timer = TeamTimer::new(id, name, thresholds.unwrap_or(self.default_thresholds));
        let snapshot = timer.snapshot();
        teams.push(timer);

        let roster = rebuild_targets(&teams, &mut targets);
        drop(targets);
        let entry = self.log.append(NewEntry::new(
            EntryType::TeamEvent,
            format!("Team {name} registered"),
            name,
        ));
        drop(teams);

        info!(team = %name, team_id = %id, "team registered");
        self.notify(vec![
            EngineEvent::TimerChanged(snapshot),
            roster,
            EngineEvent::EntryAppended(entry),
        ]);
        Ok(id)
    }

    /// Remove a team, stopping its timer first if it is running.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the team does not exist.
    pub fn remove_team(&self, id: TeamId) -> Result<()> {
        self.remove_team_at(id, Instant::now())
    }

    /// [`remove_team`](Self::remove_team) with an explicit clock reading.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the team does not exist.
    pub fn remove_team_at(&self, id: TeamId, now: Instant) -> Result<()> {
        let mut teams = self.teams_write();
        let Some(index) = teams.iter().position(|t| t.id() == id) else {
            return Err(AppError::NotFound(format!("team {id}")));
        };

        let mut events = Vec::new();
        let mut timer = teams.remove(index);
        let name = timer.display_name().to_owned();

        if timer.is_running() {
            self.close_run(&mut timer, now, " (team removed)", &mut events);
        }

        let roster = {
            let mut targets = self.targets_write();
            rebuild_targets(&teams, &mut targets)
        };
        let entry = self.log.append(NewEntry::new(
            EntryType::TeamEvent,
            format!("Team {name} removed"),
            &name,
        ));
        drop(teams);

        info!(team = %name, team_id = %id, "team removed");
        events.push(roster);
        events.push(EngineEvent::EntryAppended(entry));
        self.notify(events);
        Ok(())
    }

    /// Look up a team by display name.
    #[must_use]
    pub fn find_team(&self, name: &str) -> Option<TeamId> {
        self.teams_read()
            .iter()
            .find(|t| t.display_name() == name)
            .map(TeamTimer::id)
    }

    /// Read one team.
    #[must_use]
    pub fn team(&self, id: TeamId) -> Option<TeamSnapshot> {
        self.teams_read()
            .iter()
            .find(|t| t.id() == id)
            .map(TeamTimer::snapshot)
    }

    /// Read every team in registration order.
    #[must_use]
    pub fn teams(&self) -> Vec<TeamSnapshot> {
        self.teams_read().iter().map(TeamTimer::snapshot).collect()
    }

    /// Replace a team's thresholds. The warning state is not lowered.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the team does not exist.
    pub fn set_thresholds(&self, id: TeamId, thresholds: Thresholds) -> Result<TeamSnapshot> {
        let mut teams = self.teams_write();
        let timer = find_mut(&mut teams, id)?;
        timer.set_thresholds(thresholds);
        let snapshot = timer.snapshot();
        let entry = self.log.append(NewEntry::new(
            EntryType::Info,
            format!(
                "Team {} warning thresholds set to {} / {}",
                snapshot.display_name,
                format_elapsed(thresholds.first()),
                format_elapsed(thresholds.second())
            ),
            &snapshot.display_name,
        ));
        drop(teams);

        self.notify(vec![
            EngineEvent::TimerChanged(snapshot.clone()),
            EngineEvent::EntryAppended(entry),
        ]);
        Ok(snapshot)
    }

    // ── Timer commands ──────────────────────────────────

    /// Start a team's timer. Returns `false` if it was already running.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the team does not exist.
    pub fn start_team(&self, id: TeamId) -> Result<bool> {
        self.start_team_at(id, Instant::now())
    }

    /// [`start_team`](Self::start_team) with an explicit clock reading.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the team does not exist.
    pub fn start_team_at(&self, id: TeamId, now: Instant) -> Result<bool> {
        let mut teams = self.teams_write();
        let timer = find_mut(&mut teams, id)?;
        if !timer.start(now) {
            return Ok(false);
        }
        let snapshot = timer.snapshot();
        let entry = self.log.append(NewEntry::new(
            EntryType::TimerStart,
            format!(
                "Team {} timer started at {}",
                snapshot.display_name,
                format_elapsed(timer.elapsed())
            ),
            &snapshot.display_name,
        ));
        drop(teams);

        info!(team = %snapshot.display_name, "timer started");
        self.notify(vec![
            EngineEvent::TimerChanged(snapshot),
            EngineEvent::EntryAppended(entry),
        ]);
        Ok(true)
    }

    /// Stop a team's timer. Returns `false` if it was not running.
    ///
    /// Warnings are evaluated one last time before the run interval closes,
    /// so a threshold crossed since the previous tick is still reported.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the team does not exist.
    pub fn stop_team(&self, id: TeamId) -> Result<bool> {
        self.stop_team_at(id, Instant::now())
    }

    /// [`stop_team`](Self::stop_team) with an explicit clock reading.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the team does not exist.
    pub fn stop_team_at(&self, id: TeamId, now: Instant) -> Result<bool> {
        let mut teams = self.teams_write();
        let timer = find_mut(&mut teams, id)?;
        if !timer.is_running() {
            return Ok(false);
        }

        let mut events = Vec::new();
        self.close_run(timer, now, "", &mut events);
        let snapshot = timer.snapshot();
        drop(teams);

        info!(
            team = %snapshot.display_name,
            elapsed_secs = snapshot.elapsed_seconds,
            "timer stopped"
        );
        events.push(EngineEvent::TimerChanged(snapshot));
        self.notify(events);
        Ok(true)
    }

    /// Reset a team's timer to stopped, zero, `Normal`.
    ///
    /// Returns `false` if the timer was already in that state.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the team does not exist.
    pub fn reset_team(&self, id: TeamId) -> Result<bool> {
        let mut teams = self.teams_write();
        let timer = find_mut(&mut teams, id)?;
        let previous = timer.elapsed();
        if !timer.reset() {
            return Ok(false);
        }
        let snapshot = timer.snapshot();
        let entry = self.log.append(NewEntry::new(
            EntryType::TimerReset,
            format!(
                "Team {} timer reset (was {})",
                snapshot.display_name,
                format_elapsed(previous)
            ),
            &snapshot.display_name,
        ));
        drop(teams);

        info!(team = %snapshot.display_name, "timer reset");
        self.notify(vec![
            EngineEvent::TimerChanged(snapshot),
            EngineEvent::EntryAppended(entry),
        ]);
        Ok(true)
    }

    /// Close a running timer's interval at `now`.
    ///
    /// Thresholds crossed since the last tick are recorded before the
    /// `TimerStop` entry. `suffix` is appended to the stop message.
    fn close_run(
        &self,
        timer: &mut TeamTimer,
        now: Instant,
        suffix: &str,
        events: &mut Vec<EngineEvent>,
    ) {
        timer.advance(now);
        for transition in timer.evaluate_warnings() {
            let entry = self.log.append(warning_entry(timer, transition));
            events.push(EngineEvent::EntryAppended(entry));
        }

        timer.stop(now);
        let entry = self.log.append(NewEntry::new(
            EntryType::TimerStop,
            format!(
                "Team {} timer stopped at {}{suffix}",
                timer.display_name(),
                format_elapsed(timer.elapsed())
            ),
            timer.display_name(),
        ));
        events.push(EngineEvent::EntryAppended(entry));
    }

    // ── Clock ───────────────────────────────────────────

    /// Advance every running timer to now and record warning transitions.
    ///
    /// Returns the warning entries appended by this tick.
    pub fn tick(&self) -> Vec<LogEntry> {
        self.tick_at(Instant::now())
    }

    /// [`tick`](Self::tick) with an explicit clock reading.
    pub fn tick_at(&self, now: Instant) -> Vec<LogEntry> {
        let mut events = Vec::new();
        let mut warnings = Vec::new();

        let mut teams = self.teams_write();
        for timer in teams.iter_mut().filter(|t| t.is_running()) {
            timer.advance(now);
            for transition in timer.evaluate_warnings() {
                let entry = self.log.append(warning_entry(timer, transition));
                warn!(
                    team = %timer.display_name(),
                    elapsed_secs = timer.elapsed().as_secs(),
                    level = ?transition,
                    "warning threshold reached"
                );
                warnings.push(entry.clone());
                events.push(EngineEvent::EntryAppended(entry));
            }
            events.push(EngineEvent::TimerChanged(timer.snapshot()));
        }
        drop(teams);

        self.notify(events);
        warnings
    }

    // ── Log ─────────────────────────────────────────────

    /// Append an entry (manual note, system event, ...).
    pub fn append(&self, entry: NewEntry) -> LogEntry {
        let entry = self.log.append(entry);
        self.notify(vec![EngineEvent::EntryAppended(entry.clone())]);
        entry
    }

    /// Append an operator note addressed to `target_name`.
    pub fn append_note(&self, content: &str, target_name: &str) -> LogEntry {
        self.append(NewEntry::manual(content, target_name))
    }

    /// Append a reply to an existing entry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if `parent_id` does not exist.
    pub fn append_reply(
        &self,
        parent_id: u64,
        content: &str,
        target_name: Option<String>,
    ) -> Result<LogEntry> {
        let entry = self.log.append_reply(parent_id, content, target_name)?;
        self.notify(vec![EngineEvent::EntryAppended(entry.clone())]);
        Ok(entry)
    }

    /// Ordered copy of the log under the given relevance policy.
    #[must_use]
    pub fn snapshot(&self, relevance: Relevance) -> Vec<LogEntry> {
        self.log.snapshot(|e| relevance.matches(e))
    }

    /// Entries of the conversation containing `entry_id`.
    #[must_use]
    pub fn thread_of(&self, entry_id: u64) -> Vec<LogEntry> {
        self.log.thread_of(entry_id)
    }

    // ── Targets ─────────────────────────────────────────

    /// Current routing targets, fixed channels first.
    #[must_use]
    pub fn targets(&self) -> Vec<RoutingTarget> {
        self.targets_read().targets().to_vec()
    }

    /// Currently selected routing target.
    #[must_use]
    pub fn selected_target(&self) -> Option<String> {
        self.targets_read().selected().map(str::to_owned)
    }

    /// Change the selected routing target.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no target has this name.
    pub fn select_target(&self, name: &str) -> Result<()> {
        if self.targets_write().select(name) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("routing target '{name}'")))
        }
    }

    /// One consistent read of teams, targets and log entries.
    #[must_use]
    pub fn session_snapshot(&self, relevance: Relevance) -> SessionSnapshot {
        let teams = self.teams_read();
        let targets = self.targets_read();
        let entries = self.snapshot(relevance);
        SessionSnapshot {
            session_id: self.session_id.to_string(),
            generated_at: Utc::now(),
            relevance,
            teams: teams.iter().map(TeamTimer::snapshot).collect(),
            targets: targets.targets().to_vec(),
            selected_target: targets.selected().map(str::to_owned),
            entries,
        }
    }
}

fn find_mut(teams: &mut [TeamTimer], id: TeamId) -> Result<&mut TeamTimer> {
    teams
        .iter_mut()
        .find(|t| t.id() == id)
        .ok_or_else(|| AppError::NotFound(format!("team {id}")))
}

fn rebuild_targets(teams: &[TeamTimer], targets: &mut NoteTargetRegistry) -> EngineEvent {
    let names: Vec<&str> = teams.iter().map(TeamTimer::display_name).collect();
    let selected = targets.rebuild(&names).map(str::to_owned);
    EngineEvent::RosterChanged {
        targets: targets.targets().to_vec(),
        selected,
    }
}

fn warning_entry(timer: &TeamTimer, transition: WarningTransition) -> NewEntry {
    let (label, threshold) = match transition {
        WarningTransition::FirstWarned => ("first", timer.thresholds().first()),
        WarningTransition::SecondWarned => ("second", timer.thresholds().second()),
    };
    NewEntry::new(
        transition.entry_type(),
        format!(
            "Team {} reached the {label} warning threshold ({}) after {}",
            timer.display_name(),
            format_elapsed(threshold),
            format_elapsed(timer.elapsed())
        ),
        timer.display_name(),
    )
}
