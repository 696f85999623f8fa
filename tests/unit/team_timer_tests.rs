//! Unit tests for the per-team timer.
//!
//! Covers start/stop/reset idempotence, elapsed accumulation across run
//! intervals, and the rule that stopped timers never change warning state.

use std::time::Duration;

use tokio::time::Instant;

use mission_timer::engine::TeamTimer;
use mission_timer::models::{TeamId, Thresholds, WarningState};

fn timer() -> TeamTimer {
    TeamTimer::new(TeamId(1), "Alpha", Thresholds::from_minutes(10, 20))
}

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

#[test]
fn new_timer_is_stopped_at_zero() {
    let t = timer();
    assert!(!t.is_running());
    assert_eq!(t.elapsed(), Duration::ZERO);
    assert_eq!(t.warning_state(), WarningState::Normal);
}

#[test]
fn start_is_noop_when_running() {
    let t0 = Instant::now();
    let mut t = timer();
    assert!(t.start(t0));
    assert!(!t.start(t0 + secs(5)), "second start must be a no-op");

    // The reference instant is the first start, not the second.
    t.advance(t0 + secs(30));
    assert_eq!(t.elapsed(), secs(30));
}

#[test]
fn stop_is_noop_when_stopped() {
    let mut t = timer();
    assert!(!t.stop(Instant::now()));
    assert_eq!(t.elapsed(), Duration::ZERO);
}

#[test]
fn elapsed_accumulates_across_run_intervals() {
    let t0 = Instant::now();
    let mut t = timer();

    t.start(t0);
    t.stop(t0 + secs(60));
    assert_eq!(t.elapsed(), secs(60));

    // Time passing while stopped does not count.
    t.advance(t0 + secs(600));
    assert_eq!(t.elapsed(), secs(60));

    t.start(t0 + secs(600));
    t.advance(t0 + secs(630));
    assert_eq!(t.elapsed(), secs(90));
}

#[test]
fn reset_clears_everything_and_is_always_permitted() {
    let t0 = Instant::now();
    let mut t = timer();
    t.start(t0);
    t.advance(t0 + secs(11 * 60));
    t.evaluate_warnings();
    assert_eq!(t.warning_state(), WarningState::FirstWarned);

    assert!(t.reset());
    assert!(!t.is_running());
    assert_eq!(t.elapsed(), Duration::ZERO);
    assert_eq!(t.warning_state(), WarningState::Normal);

    assert!(!t.reset(), "resetting a pristine timer changes nothing");
}

#[test]
fn never_started_timer_never_warns() {
    let t0 = Instant::now();
    let mut t = timer();
    for minute in 0..120 {
        t.advance(t0 + secs(minute * 60));
        assert!(t.evaluate_warnings().is_empty());
    }
    assert_eq!(t.warning_state(), WarningState::Normal);
    assert_eq!(t.elapsed(), Duration::ZERO);
}

#[test]
fn stopped_timer_keeps_its_warning_state() {
    let t0 = Instant::now();
    let mut t = timer();
    t.start(t0);
    t.advance(t0 + secs(12 * 60));
    t.evaluate_warnings();
    t.stop(t0 + secs(12 * 60));

    // Past the second threshold on the wall clock, but stopped.
    t.advance(t0 + secs(30 * 60));
    assert!(t.evaluate_warnings().is_empty());
    assert_eq!(t.warning_state(), WarningState::FirstWarned);
}

#[test]
fn snapshot_reports_thresholds_in_seconds() {
    let snap = timer().snapshot();
    assert_eq!(snap.display_name, "Alpha");
    assert_eq!(snap.first_threshold_seconds, 600);
    assert_eq!(snap.second_threshold_seconds, 1200);
    assert!(!snap.is_running);
}
