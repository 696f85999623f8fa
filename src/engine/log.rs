//! Append-only mission log with a reply/thread index.
//!
//! All state lives behind one [`RwLock`]. Appends take the write lock for
//! the whole finalize-and-insert step, so a reader holding the read lock
//! always sees a complete, consistent prefix of the log. Snapshots are
//! copies; the live vector never leaves this module.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::{EntryType, LogEntry, NewEntry, MAX_THREAD_DEPTH};
use crate::{AppError, Result};

/// Lookup data kept per entry so parents can be found without a scan.
#[derive(Debug, Clone, Copy)]
struct EntryMeta {
    timestamp: DateTime<Utc>,
    thread_id: u64,
    thread_depth: u8,
}

#[derive(Debug, Default)]
struct LogState {
    /// Entries ordered by `(timestamp, insertion)`.
    entries: Vec<LogEntry>,
    meta: HashMap<u64, EntryMeta>,
    /// Thread root id to member ids in append order.
    threads: HashMap<u64, Vec<u64>>,
    last_id: u64,
}

impl LogState {
    /// Position of `id` in `entries`, located by timestamp then scanned.
    fn position(&self, id: u64) -> Option<usize> {
        let meta = self.meta.get(&id)?;
        let start = self
            .entries
            .partition_point(|e| e.timestamp < meta.timestamp);
        self.entries[start..]
            .iter()
            .take_while(|e| e.timestamp == meta.timestamp)
            .position(|e| e.id == id)
            .map(|offset| start + offset)
    }

    fn insert(&mut self, new: NewEntry, parent: Option<(u64, EntryMeta)>) -> LogEntry {
        self.last_id += 1;
        let id = self.last_id;

        let (reply_to_id, thread_id, thread_depth) = match parent {
            Some((parent_id, meta)) => (
                Some(parent_id),
                meta.thread_id,
                (meta.thread_depth + 1).min(MAX_THREAD_DEPTH),
            ),
            None => (None, id, 0),
        };

        let entry = LogEntry {
            id,
            content: new.content,
            timestamp: new.timestamp.unwrap_or_else(Utc::now),
            target_name: new.target_name,
            entry_type: new.entry_type,
            reply_to_id,
            thread_id,
            thread_depth,
        };

        self.meta.insert(
            id,
            EntryMeta {
                timestamp: entry.timestamp,
                thread_id,
                thread_depth,
            },
        );
        self.threads.entry(thread_id).or_default().push(id);

        let at = self
            .entries
            .partition_point(|e| e.timestamp <= entry.timestamp);
        self.entries.insert(at, entry.clone());
        entry
    }
}

/// Thread-safe, ordered, append-only collection of [`LogEntry`] values.
#[derive(Debug, Default)]
pub struct EventLog {
    state: RwLock<LogState>,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, LogState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LogState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Finalize and insert a root entry.
    ///
    /// Assigns the id, stamps the timestamp when unset, and makes the entry
    /// the root of its own thread.
    pub fn append(&self, entry: NewEntry) -> LogEntry {
        let appended = self.write().insert(entry, None);
        debug!(
            entry_id = appended.id,
            entry_type = ?appended.entry_type,
            target = %appended.target_name,
            "log entry appended"
        );
        appended
    }

    /// Append a reply to `parent_id`.
    ///
    /// The reply joins the parent's thread one level deeper, capped at
    /// [`MAX_THREAD_DEPTH`]. When `target_name` is `None` the parent's
    /// target is reused.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if `parent_id` does not exist; the log is
    /// left unchanged.
    pub fn append_reply(
        &self,
        parent_id: u64,
        content: impl Into<String>,
        target_name: Option<String>,
    ) -> Result<LogEntry> {
        let mut state = self.write();
        let Some(meta) = state.meta.get(&parent_id).copied() else {
            return Err(AppError::NotFound(format!("log entry {parent_id}")));
        };

        let target_name = match target_name {
            Some(name) => name,
            None => state
                .position(parent_id)
                .map(|pos| state.entries[pos].target_name.clone())
                .unwrap_or_default(),
        };

        let reply = state.insert(
            NewEntry::new(EntryType::Reply, content, target_name),
            Some((parent_id, meta)),
        );
        drop(state);

        debug!(
            entry_id = reply.id,
            parent_id,
            thread_id = reply.thread_id,
            depth = reply.thread_depth,
            "reply appended"
        );
        Ok(reply)
    }

    /// Ordered copy of every entry accepted by `filter`.
    pub fn snapshot<F>(&self, filter: F) -> Vec<LogEntry>
    where
        F: Fn(&LogEntry) -> bool,
    {
        self.read()
            .entries
            .iter()
            .filter(|e| filter(e))
            .cloned()
            .collect()
    }

    /// All entries sharing `entry_id`'s thread, oldest first.
    ///
    /// Unknown ids yield an empty list.
    #[must_use]
    pub fn thread_of(&self, entry_id: u64) -> Vec<LogEntry> {
        let state = self.read();
        let Some(meta) = state.meta.get(&entry_id) else {
            return Vec::new();
        };
        let Some(members) = state.threads.get(&meta.thread_id) else {
            return Vec::new();
        };

        let mut thread: Vec<LogEntry> = members
            .iter()
            .filter_map(|id| state.position(*id))
            .map(|pos| state.entries[pos].clone())
            .collect();
        thread.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        thread
    }

    /// Look up a single entry.
    #[must_use]
    pub fn get(&self, entry_id: u64) -> Option<LogEntry> {
        let state = self.read();
        state
            .position(entry_id)
            .map(|pos| state.entries[pos].clone())
    }

    /// Number of entries appended so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    /// Whether nothing has been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }
}
