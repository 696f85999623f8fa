//! Integration tests for the JSON snapshot exporter.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use mission_timer::export::{export_now, spawn_snapshot_task, JsonSnapshotWriter, SnapshotSink};
use mission_timer::models::{EntryType, Relevance};
use mission_timer::AppError;

use super::test_helpers::alpha_engine;

#[test]
fn export_writes_full_view_atomically() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("mission.json");
    let writer = JsonSnapshotWriter::new(path.clone()).expect("writer");

    let (engine, alpha) = alpha_engine();
    engine.start_team(alpha).expect("start");
    engine.append_note("Alpha at grid 4B", "Alpha");

    let count = export_now(&engine, &writer).expect("export");
    assert_eq!(count, 3);

    let snap = JsonSnapshotWriter::read(&path).expect("read back");
    assert_eq!(snap.relevance, Relevance::Full);
    assert_eq!(snap.entries.len(), 3);
    assert!(snap
        .entries
        .iter()
        .any(|e| e.entry_type == EntryType::TimerStart));
    assert_eq!(snap.teams[0].display_name, "Alpha");

    let leftovers: Vec<_> = std::fs::read_dir(path.parent().expect("parent"))
        .expect("list dir")
        .filter_map(std::result::Result::ok)
        .filter(|e| e.path() != path)
        .collect();
    assert!(leftovers.is_empty(), "temp files must be renamed away");
}

#[test]
fn later_export_replaces_earlier_one() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("mission.json");
    let writer = JsonSnapshotWriter::new(path.clone()).expect("writer");
    let (engine, _) = alpha_engine();

    export_now(&engine, &writer).expect("first export");
    engine.append_note("second note", "Radio");
    export_now(&engine, &writer).expect("second export");

    let snap = JsonSnapshotWriter::read(&path).expect("read back");
    assert_eq!(snap.entries.len(), 2);
    assert_eq!(snap.entries[1].content, "second note");
}

#[test]
fn reading_missing_or_malformed_snapshot_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("nope.json");
    assert!(matches!(
        JsonSnapshotWriter::read(&missing),
        Err(AppError::Snapshot(_))
    ));

    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, "{ not json").expect("write garbage");
    assert!(matches!(
        JsonSnapshotWriter::read(&garbage),
        Err(AppError::Snapshot(_))
    ));
}

#[tokio::test]
async fn cancelled_task_writes_final_snapshot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("mission.json");
    let writer = JsonSnapshotWriter::new(path.clone()).expect("writer");
    let sink: Arc<dyn SnapshotSink> = Arc::new(writer);

    let (engine, _) = alpha_engine();
    let cancel = CancellationToken::new();
    let handle = spawn_snapshot_task(
        Arc::clone(&engine),
        sink,
        Duration::from_secs(3600),
        cancel.clone(),
    );

    engine.append_note("last word", "Mission Lead");
    cancel.cancel();
    handle.await.expect("snapshot task joins");

    let snap = JsonSnapshotWriter::read(&path).expect("final snapshot");
    assert!(snap.entries.iter().any(|e| e.content == "last word"));
}

#[tokio::test(start_paused = true)]
async fn task_exports_on_interval() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("mission.json");
    let sink: Arc<dyn SnapshotSink> =
        Arc::new(JsonSnapshotWriter::new(path.clone()).expect("writer"));

    let (engine, _) = alpha_engine();
    let cancel = CancellationToken::new();
    let handle = spawn_snapshot_task(
        Arc::clone(&engine),
        sink,
        Duration::from_secs(30),
        cancel.clone(),
    );

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!path.exists(), "no snapshot before the first interval");

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(path.exists(), "snapshot written after one interval");

    cancel.cancel();
    handle.await.expect("snapshot task joins");
}
