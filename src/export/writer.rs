//! Atomic JSON snapshot writer.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use super::SnapshotSink;
use crate::models::SessionSnapshot;
use crate::{AppError, Result};

/// Writes each snapshot to a temp file beside `path`, then renames it over
/// `path`, so readers never observe a partially written file.
#[derive(Debug, Clone)]
pub struct JsonSnapshotWriter {
    path: PathBuf,
}

impl JsonSnapshotWriter {
    /// Construct a writer targeting `path`.
    ///
    /// Creates the parent directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Snapshot`] if the directory cannot be created.
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Snapshot(format!(
                    "failed to create snapshot directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        Ok(Self { path })
    }

    /// Destination file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back a snapshot previously written to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Snapshot`] if the file is missing or malformed.
    pub fn read(path: &Path) -> Result<SessionSnapshot> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Snapshot(format!("failed to read snapshot {}: {e}", path.display()))
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| AppError::Snapshot(format!("malformed snapshot {}: {e}", path.display())))
    }
}

impl SnapshotSink for JsonSnapshotWriter {
    fn write_snapshot(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| AppError::Snapshot(format!("failed to serialize snapshot: {e}")))?;

        let mut tmp = NamedTempFile::new_in(parent)
            .map_err(|e| AppError::Snapshot(format!("failed to create temporary file: {e}")))?;
        tmp.write_all(&json)
            .map_err(|e| AppError::Snapshot(format!("failed to write snapshot: {e}")))?;
        tmp.persist(&self.path).map_err(|e| {
            AppError::Snapshot(format!(
                "failed to replace {}: {}",
                self.path.display(),
                e.error
            ))
        })?;

        debug!(
            path = %self.path.display(),
            entries = snapshot.entries.len(),
            bytes = json.len(),
            "snapshot written"
        );
        Ok(())
    }
}
