//! Pre-apply snapshots used to revert notes
//!
//! Before a note is applied for the first time, its inspected values are
//! written to `<state dir>/<note id>.json`. The snapshot is kept across
//! re-applies so that revert always returns to the state before tuning.

use crate::error::{IoResultExt, Result, SaptuneError};
use crate::note::Note;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default state directory
pub const DEFAULT_STATE_DIR: &str = "/var/lib/saptune/saved_state";

/// Serialized inspected values of one note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteSnapshot {
    /// Note id
    pub note_id: String,
    /// Note title at the time of saving
    pub note_name: String,
    /// Host the snapshot was taken on
    pub hostname: String,
    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,
    /// Note-specific values, see [`Note::snapshot`]
    pub values: serde_json::Value,
}

impl NoteSnapshot {
    /// Capture the values of an inspected note
    pub fn capture(note: &dyn Note) -> Result<Self> {
        Ok(Self {
            note_id: note.id().to_string(),
            note_name: note.name().to_string(),
            hostname: hostname::get()
                .map(|h| h.to_string_lossy().to_string())
                .unwrap_or_else(|_| "localhost".to_string()),
            taken_at: Utc::now(),
            values: note.snapshot()?,
        })
    }
}

/// Directory of note snapshots
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Store in `dir`; created on first save
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the snapshots
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, note_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", note_id))
    }

    /// Whether a snapshot exists for the note
    pub fn contains(&self, note_id: &str) -> bool {
        self.path(note_id).exists()
    }

    /// Save the inspected state unless one is already stored.
    ///
    /// Returns `true` if a new snapshot was written.
    pub fn save(&self, inspected: &dyn Note) -> Result<bool> {
        let path = self.path(inspected.id());
        if path.exists() {
            tracing::debug!("Keeping existing snapshot {:?}", path);
            return Ok(false);
        }

        std::fs::create_dir_all(&self.dir).with_path(&self.dir)?;
        let snapshot = NoteSnapshot::capture(inspected)?;
        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(&path, json).with_path(&path)?;
        tracing::info!("Saved state of note {} to {:?}", inspected.id(), path);
        Ok(true)
    }

    /// Load the snapshot of a note
    pub fn load(&self, note_id: &str) -> Result<NoteSnapshot> {
        let path = self.path(note_id);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SaptuneError::NotFound(format!("saved state of note {}", note_id)))
            }
            Err(e) => return Err(SaptuneError::io(path, e)),
        };
        let snapshot: NoteSnapshot = serde_json::from_str(&content)?;
        if snapshot.note_id != note_id {
            return Err(SaptuneError::Snapshot(format!(
                "{:?} belongs to note {}",
                path, snapshot.note_id
            )));
        }
        Ok(snapshot)
    }

    /// Delete the snapshot of a note
    pub fn remove(&self, note_id: &str) -> Result<()> {
        let path = self.path(note_id);
        std::fs::remove_file(&path).with_path(path)
    }
}
