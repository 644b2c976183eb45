//! In-memory completion store.
//!
//! Thread-safe implementation of `CompletionStore` used as the session
//! local cache for anonymous users and in unit tests.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::core::ActivityCompletion;
use crate::error::Result;
use crate::ledger::CompletionStore;

/// In-memory completion store.
///
/// Records are stored per (user, path) key and lost when the store is
/// dropped.
#[derive(Debug, Default)]
pub struct MemoryCompletionStore {
    records: RwLock<HashMap<(String, String), Vec<ActivityCompletion>>>,
}

impl MemoryCompletionStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all (user, path) pairs.
    pub fn len(&self) -> usize {
        self.records.read().unwrap().values().map(Vec::len).sum()
    }

    /// Check if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all records from the store.
    pub fn clear(&self) {
        self.records.write().unwrap().clear();
    }
}

impl CompletionStore for MemoryCompletionStore {
    fn list(&self, user_id: &str, path_id: &str) -> Result<Vec<ActivityCompletion>> {
        let records = self.records.read().unwrap();
        Ok(records
            .get(&(user_id.to_string(), path_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn upsert(&self, completion: &ActivityCompletion) -> Result<()> {
        let mut records = self.records.write().unwrap();
        let entry = records
            .entry((completion.user_id.clone(), completion.path_id.clone()))
            .or_default();

        // Idempotent: the first recorded timestamp wins
        if !entry.iter().any(|c| c.activity_id == completion.activity_id) {
            entry.push(completion.clone());
        }
        Ok(())
    }

    fn replace(&self, user_id: &str, path_id: &str, new: &[ActivityCompletion]) -> Result<()> {
        let mut records = self.records.write().unwrap();
        records.insert((user_id.to_string(), path_id.to_string()), new.to_vec());
        Ok(())
    }
}
