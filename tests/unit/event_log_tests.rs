//! Unit tests for the append-only mission log.
//!
//! Validates id assignment, reply threading with the depth cap, the
//! `NotFound` contract of replies, thread retrieval, and the canonical
//! relevance filter.

use std::collections::HashMap;

use chrono::{Duration, Utc};

use mission_timer::engine::EventLog;
use mission_timer::models::{EntryType, LogEntry, NewEntry, Relevance, MAX_THREAD_DEPTH};
use mission_timer::AppError;

#[test]
fn append_assigns_monotonic_ids_and_roots_threads() {
    let log = EventLog::new();
    let a = log.append(NewEntry::manual("first", "Radio"));
    let b = log.append(NewEntry::manual("second", "Radio"));

    assert!(b.id > a.id);
    assert_eq!(a.thread_id, a.id);
    assert_eq!(a.thread_depth, 0);
    assert!(a.reply_to_id.is_none());
    assert_eq!(log.len(), 2);
}

#[test]
fn explicit_timestamp_is_kept() {
    let log = EventLog::new();
    let ts = Utc::now() - Duration::hours(1);
    let entry = log.append(NewEntry::manual("late entry", "Radio").with_timestamp(ts));
    assert_eq!(entry.timestamp, ts);
}

#[test]
fn reply_chain_depth_caps_at_three() {
    let log = EventLog::new();
    let a = log.append(NewEntry::manual("Alpha at checkpoint", "Alpha"));
    let b = log.append_reply(a.id, "ok", None).expect("reply to A");
    let c = log.append_reply(b.id, "ok2", None).expect("reply to B");
    let d = log.append_reply(c.id, "ok3", None).expect("reply to C");
    let e = log.append_reply(d.id, "ok4", None).expect("reply to D");

    assert_eq!(b.thread_id, a.id);
    assert_eq!(b.thread_depth, 1);
    assert_eq!(b.reply_to_id, Some(a.id));
    assert_eq!(c.thread_depth, 2);
    assert_eq!(d.thread_depth, 3);
    assert_eq!(e.thread_depth, MAX_THREAD_DEPTH, "depth is clamped, not 4");
    assert_eq!(e.thread_id, a.id);
    assert_eq!(e.reply_to_id, Some(d.id));
}

#[test]
fn reply_to_missing_parent_fails_without_appending() {
    let log = EventLog::new();
    log.append(NewEntry::manual("only entry", "Radio"));

    let err = log
        .append_reply(999, "hello?", None)
        .expect_err("missing parent must fail");
    assert!(matches!(err, AppError::NotFound(_)), "got {err:?}");
    assert_eq!(log.len(), 1, "rejected reply must not be visible");
}

#[test]
fn reply_inherits_parent_target_unless_given() {
    let log = EventLog::new();
    let root = log.append(NewEntry::manual("need water", "Bravo"));

    let inherited = log.append_reply(root.id, "on the way", None).unwrap();
    assert_eq!(inherited.target_name, "Bravo");
    assert_eq!(inherited.entry_type, EntryType::Reply);

    let redirected = log
        .append_reply(root.id, "logistics informed", Some("Mission Lead".into()))
        .unwrap();
    assert_eq!(redirected.target_name, "Mission Lead");
}

#[test]
fn thread_of_returns_whole_conversation_in_order() {
    let log = EventLog::new();
    let root = log.append(NewEntry::manual("root", "Radio"));
    let other = log.append(NewEntry::manual("unrelated", "Radio"));
    let r1 = log.append_reply(root.id, "r1", None).unwrap();
    let r2 = log.append_reply(r1.id, "r2", None).unwrap();
    log.append_reply(other.id, "elsewhere", None).unwrap();

    let from_leaf: Vec<u64> = log.thread_of(r2.id).iter().map(|e| e.id).collect();
    assert_eq!(from_leaf, vec![root.id, r1.id, r2.id]);

    let from_root: Vec<u64> = log.thread_of(root.id).iter().map(|e| e.id).collect();
    assert_eq!(from_root, from_leaf);

    assert!(log.thread_of(12_345).is_empty());
}

#[test]
fn every_thread_id_is_a_reachable_root() {
    let log = EventLog::new();
    let a = log.append(NewEntry::manual("a", "Radio"));
    let b = log.append(NewEntry::manual("b", "Radio"));
    let mut last = a.id;
    for i in 0..6 {
        last = log.append_reply(last, format!("a{i}"), None).unwrap().id;
    }
    log.append_reply(b.id, "b1", None).unwrap();

    let all = log.snapshot(|_| true);
    let by_id: HashMap<u64, &LogEntry> = all.iter().map(|e| (e.id, e)).collect();
    for entry in &all {
        assert!(entry.thread_depth <= MAX_THREAD_DEPTH);
        let mut cursor = entry;
        while let Some(parent) = cursor.reply_to_id {
            cursor = by_id[&parent];
        }
        assert!(cursor.is_root());
        assert_eq!(entry.thread_id, cursor.id, "entry {}", entry.id);
    }
}

#[test]
fn relevance_filter_hides_routine_entries() {
    let log = EventLog::new();
    for entry_type in [
        EntryType::TimerStart,
        EntryType::TimerStop,
        EntryType::TimerReset,
        EntryType::Info,
        EntryType::Warning1,
        EntryType::Warning2,
        EntryType::TeamEvent,
        EntryType::SystemEvent,
        EntryType::Manual,
        EntryType::Error,
    ] {
        log.append(NewEntry::new(entry_type, format!("{entry_type:?}"), "Alpha"));
    }

    let full = log.snapshot(|e| Relevance::Full.matches(e));
    assert_eq!(full.len(), 10);

    let relevant: Vec<EntryType> = log
        .snapshot(|e| Relevance::MissionRelevant.matches(e))
        .into_iter()
        .map(|e| e.entry_type)
        .collect();
    assert_eq!(
        relevant,
        vec![
            EntryType::Warning1,
            EntryType::Warning2,
            EntryType::TeamEvent,
            EntryType::SystemEvent,
            EntryType::Manual,
            EntryType::Error,
        ]
    );
}

#[test]
fn snapshot_is_a_detached_copy() {
    let log = EventLog::new();
    log.append(NewEntry::manual("one", "Radio"));
    let snap = log.snapshot(|_| true);
    log.append(NewEntry::manual("two", "Radio"));

    assert_eq!(snap.len(), 1);
    assert_eq!(log.len(), 2);
}

#[test]
fn get_finds_entries_by_id() {
    let log = EventLog::new();
    assert!(log.is_empty());
    let a = log.append(NewEntry::manual("a", "Radio"));
    assert_eq!(log.get(a.id), Some(a));
    assert_eq!(log.get(42), None);
}
