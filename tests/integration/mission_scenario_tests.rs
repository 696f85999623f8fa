//! End-to-end mission scenarios driven with explicit clock readings.
//!
//! Calls `start_team_at` / `tick_at` so the timeline is exact and no real
//! time passes.

use std::time::Duration;

use tokio::time::Instant;

use mission_timer::models::{EntryType, Relevance, WarningState};

use super::test_helpers::{alpha_engine, entries_of};

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

#[test]
fn alpha_escalates_once_per_threshold() {
    let (engine, alpha) = alpha_engine();
    let t0 = Instant::now();

    assert!(engine.start_team_at(alpha, t0).expect("start"));

    for s in 1..=9 {
        assert!(engine.tick_at(t0 + secs(s)).is_empty(), "no warning at {s}s");
    }

    let warnings = engine.tick_at(t0 + secs(10));
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].entry_type, EntryType::Warning1);
    assert_eq!(warnings[0].target_name, "Alpha");

    for s in 11..=19 {
        assert!(engine.tick_at(t0 + secs(s)).is_empty(), "no repeat at {s}s");
    }

    let warnings = engine.tick_at(t0 + secs(20));
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].entry_type, EntryType::Warning2);

    for s in 21..=40 {
        assert!(engine.tick_at(t0 + secs(s)).is_empty());
    }

    let team = engine.team(alpha).expect("Alpha exists");
    assert_eq!(team.warning_state, WarningState::SecondWarned);
    assert_eq!(team.elapsed_seconds, 40);

    let all = entries_of(&engine, &[EntryType::Warning1, EntryType::Warning2]);
    assert_eq!(all.len(), 2);
}

#[test]
fn long_gap_emits_both_warnings_in_order() {
    let (engine, alpha) = alpha_engine();
    let t0 = Instant::now();
    engine.start_team_at(alpha, t0).expect("start");

    let warnings = engine.tick_at(t0 + secs(25));
    let kinds: Vec<EntryType> = warnings.iter().map(|e| e.entry_type).collect();
    assert_eq!(kinds, vec![EntryType::Warning1, EntryType::Warning2]);
    assert!(warnings[0].id < warnings[1].id);
}

#[test]
fn stopped_time_does_not_count_toward_thresholds() {
    let (engine, alpha) = alpha_engine();
    let t0 = Instant::now();

    engine.start_team_at(alpha, t0).expect("start");
    engine.tick_at(t0 + secs(6));
    assert!(engine.stop_team_at(alpha, t0 + secs(6)).expect("stop"));

    // An hour on the ground does not count.
    assert!(engine.tick_at(t0 + secs(3600)).is_empty());
    assert_eq!(engine.team(alpha).expect("Alpha").elapsed_seconds, 6);

    engine.start_team_at(alpha, t0 + secs(3600)).expect("restart");
    assert!(engine.tick_at(t0 + secs(3603)).is_empty());
    let warnings = engine.tick_at(t0 + secs(3604));
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].entry_type, EntryType::Warning1);
}

#[test]
fn stop_reports_threshold_crossed_since_last_tick() {
    let (engine, alpha) = alpha_engine();
    let t0 = Instant::now();
    engine.start_team_at(alpha, t0).expect("start");
    engine.tick_at(t0 + secs(9));

    engine.stop_team_at(alpha, t0 + secs(11)).expect("stop");

    let kinds: Vec<EntryType> = engine
        .snapshot(Relevance::Full)
        .into_iter()
        .map(|e| e.entry_type)
        .filter(|k| matches!(k, EntryType::Warning1 | EntryType::TimerStop))
        .collect();
    assert_eq!(kinds, vec![EntryType::Warning1, EntryType::TimerStop]);
}

#[test]
fn reset_rearms_warnings() {
    let (engine, alpha) = alpha_engine();
    let t0 = Instant::now();
    engine.start_team_at(alpha, t0).expect("start");
    engine.tick_at(t0 + secs(12));
    engine.stop_team_at(alpha, t0 + secs(12)).expect("stop");

    assert!(engine.reset_team(alpha).expect("reset"));
    assert!(!engine.reset_team(alpha).expect("second reset"), "already pristine");

    let team = engine.team(alpha).expect("Alpha");
    assert_eq!(team.elapsed_seconds, 0);
    assert_eq!(team.warning_state, WarningState::Normal);
    assert!(!team.is_running);

    let t1 = t0 + secs(100);
    engine.start_team_at(alpha, t1).expect("start again");
    let warnings = engine.tick_at(t1 + secs(10));
    assert_eq!(warnings.len(), 1, "first warning fires again after reset");

    let first_warnings = entries_of(&engine, &[EntryType::Warning1]);
    assert_eq!(first_warnings.len(), 2);
}

#[test]
fn relevant_view_hides_timer_chatter() {
    let (engine, alpha) = alpha_engine();
    let t0 = Instant::now();
    engine.start_team_at(alpha, t0).expect("start");
    engine.tick_at(t0 + secs(10));
    engine.stop_team_at(alpha, t0 + secs(15)).expect("stop");
    engine.append_note("Alpha back at base", "Alpha");

    let relevant: Vec<EntryType> = engine
        .snapshot(Relevance::MissionRelevant)
        .into_iter()
        .map(|e| e.entry_type)
        .collect();
    assert_eq!(
        relevant,
        vec![EntryType::TeamEvent, EntryType::Warning1, EntryType::Manual]
    );

    let full = engine.snapshot(Relevance::Full);
    assert!(full.iter().any(|e| e.entry_type == EntryType::TimerStart));
    assert!(full.iter().any(|e| e.entry_type == EntryType::TimerStop));
}

#[test]
fn reply_chain_through_engine_caps_depth() {
    let (engine, _) = alpha_engine();
    let a = engine.append_note("Alpha at checkpoint", "Alpha");
    let b = engine.append_reply(a.id, "ok", None).expect("B");
    let c = engine.append_reply(b.id, "ok2", None).expect("C");
    let d = engine.append_reply(c.id, "ok3", None).expect("D");
    let e = engine.append_reply(d.id, "ok4", None).expect("E");

    let depths: Vec<u8> = [&b, &c, &d, &e].iter().map(|x| x.thread_depth).collect();
    assert_eq!(depths, vec![1, 2, 3, 3]);

    let thread: Vec<u64> = engine.thread_of(e.id).iter().map(|x| x.id).collect();
    assert_eq!(thread, vec![a.id, b.id, c.id, d.id, e.id]);

    let before = engine.log().len();
    assert!(engine.append_reply(9_999, "lost", None).is_err());
    assert_eq!(engine.log().len(), before);
}

#[test]
fn start_and_stop_are_idempotent() {
    let (engine, alpha) = alpha_engine();
    let t0 = Instant::now();
    assert!(!engine.stop_team_at(alpha, t0).expect("stop idle"));
    assert!(engine.start_team_at(alpha, t0).expect("start"));
    assert!(!engine.start_team_at(alpha, t0 + secs(1)).expect("start again"));

    let starts = entries_of(&engine, &[EntryType::TimerStart]);
    assert_eq!(starts.len(), 1);
}
