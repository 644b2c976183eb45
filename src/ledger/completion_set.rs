//! Reconciled in-memory view of a user's completions.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::core::{week_key, ActivityCompletion, ActivityRef};
use crate::curriculum::CurriculumWeek;

/// The set of completed activity ids for one (user, path), plus a derived
/// map of per-week start timestamps.
///
/// A week's start is anchored to the earliest `completed_at` among its
/// activities. Rebuilt from store records on every load; insertions keep
/// the derived map consistent so a fresh completion immediately affects
/// time-lock checks.
#[derive(Debug, Clone, Default)]
pub struct CompletionSet {
    completed: HashSet<String>,
    week_starts: HashMap<String, DateTime<Utc>>,
}

impl CompletionSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the set from a list of store records.
    ///
    /// Records whose activity id does not parse still count as completed,
    /// but cannot contribute a week start; they are logged and skipped for
    /// the derived map.
    pub fn from_records(records: &[ActivityCompletion]) -> Self {
        let mut set = Self::new();
        for record in records {
            set.insert(record);
        }
        set
    }

    /// Record a completion, keeping the earliest timestamp per week.
    pub fn insert(&mut self, record: &ActivityCompletion) {
        self.completed.insert(record.activity_id.clone());

        match ActivityRef::parse(&record.activity_id) {
            Ok(aref) => {
                let entry = self
                    .week_starts
                    .entry(aref.week_key())
                    .or_insert(record.completed_at);
                if record.completed_at < *entry {
                    *entry = record.completed_at;
                }
            }
            Err(err) => {
                tracing::warn!(
                    "completion {} has no parseable week: {}",
                    record.activity_id,
                    err
                );
            }
        }
    }

    /// Whether an activity has been completed.
    pub fn contains(&self, activity_id: &str) -> bool {
        self.completed.contains(activity_id)
    }

    /// Number of completed activities in the given curriculum week.
    pub fn completed_in(&self, week: &CurriculumWeek) -> u32 {
        week.activities
            .iter()
            .filter(|a| self.contains(&a.id))
            .count() as u32
    }

    /// When the given week was first started, if any of its activities has
    /// ever been completed.
    pub fn week_started_at(&self, month: u32, week_number: u32) -> Option<DateTime<Utc>> {
        self.week_starts.get(&week_key(month, week_number)).copied()
    }

    /// Total number of completed activities.
    pub fn len(&self) -> usize {
        self.completed.len()
    }

    /// Whether nothing has been completed.
    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }
}
