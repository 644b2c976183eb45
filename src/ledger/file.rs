//! File-based completion store.
//!
//! The client-local completion cache. Records for each (user, path) pair
//! are stored as a JSON file under `~/.waypoint/completions/`. Atomic
//! writes are achieved via temp file + rename pattern.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::config::completions_dir;
use crate::core::ActivityCompletion;
use crate::error::{Result, WaypointError};
use crate::ledger::CompletionStore;

/// File-based completion store.
///
/// Stores the completion list for each (user, path) pair as a JSON file
/// in a configurable directory.
#[derive(Debug, Clone)]
pub struct FileCompletionStore {
    /// Directory where completion files are stored.
    dir: PathBuf,
}

impl FileCompletionStore {
    /// Create a new file store with the default directory.
    ///
    /// Uses `~/.waypoint/completions/` or `$WAYPOINT_HOME/completions/`.
    pub fn new() -> Result<Self> {
        let dir = completions_dir().ok_or_else(|| {
            WaypointError::config("Could not determine completions directory (no home directory)")
        })?;
        Self::with_dir(dir)
    }

    /// Create a new file store with a custom directory.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| WaypointError::storage(&dir, e))?;
        }
        Ok(Self { dir })
    }

    /// Get the path for a (user, path) completion file.
    fn record_path(&self, user_id: &str, path_id: &str) -> PathBuf {
        self.dir.join(format!("{}__{}.json", user_id, path_id))
    }

    /// Get the path for a temp file used during atomic writes.
    fn temp_path(&self, user_id: &str, path_id: &str) -> PathBuf {
        self.dir.join(format!(".{}__{}.json.tmp", user_id, path_id))
    }

    /// Write a record list atomically using temp file + rename.
    fn atomic_write(
        &self,
        user_id: &str,
        path_id: &str,
        records: &[ActivityCompletion],
    ) -> Result<()> {
        let final_path = self.record_path(user_id, path_id);
        let temp_path = self.temp_path(user_id, path_id);

        let json = serde_json::to_string_pretty(records)?;

        {
            let mut file =
                fs::File::create(&temp_path).map_err(|e| WaypointError::storage(&temp_path, e))?;
            file.write_all(json.as_bytes())
                .map_err(|e| WaypointError::storage(&temp_path, e))?;
            file.sync_all()
                .map_err(|e| WaypointError::storage(&temp_path, e))?;
        }

        // Rename temp file to final path (atomic on POSIX)
        fs::rename(&temp_path, &final_path)
            .map_err(|e| WaypointError::storage(&final_path, e))?;

        Ok(())
    }
}

impl CompletionStore for FileCompletionStore {
    fn list(&self, user_id: &str, path_id: &str) -> Result<Vec<ActivityCompletion>> {
        let path = self.record_path(user_id, path_id);

        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).map_err(|e| WaypointError::storage(&path, e))?;
        let records: Vec<ActivityCompletion> = serde_json::from_str(&content)?;
        Ok(records)
    }

    fn upsert(&self, completion: &ActivityCompletion) -> Result<()> {
        let mut records = self.list(&completion.user_id, &completion.path_id)?;

        // Idempotent: the first recorded timestamp wins
        if records
            .iter()
            .any(|c| c.activity_id == completion.activity_id)
        {
            return Ok(());
        }

        records.push(completion.clone());
        self.atomic_write(&completion.user_id, &completion.path_id, &records)
    }

    fn replace(&self, user_id: &str, path_id: &str, records: &[ActivityCompletion]) -> Result<()> {
        self.atomic_write(user_id, path_id, records)
    }
}
