//! Completion store trait for Waypoint.
//!
//! This module defines the `CompletionStore` trait implemented by both the
//! durable backend store and the client-local cache.

use std::sync::Arc;

use crate::core::ActivityCompletion;
use crate::error::Result;

/// Trait for completion ledger backends.
///
/// Implementations persist activity completions per (user, path).
/// Upserts are idempotent: the (user, path, activity) triple is unique,
/// and the first recorded timestamp wins.
pub trait CompletionStore: Send + Sync {
    /// List all completions for a (user, path) pair.
    ///
    /// Returns an empty list when nothing has been recorded.
    fn list(&self, user_id: &str, path_id: &str) -> Result<Vec<ActivityCompletion>>;

    /// Record a completion.
    ///
    /// Recording the same activity twice is not an error; the existing
    /// record and its timestamp are kept.
    fn upsert(&self, completion: &ActivityCompletion) -> Result<()>;

    /// Replace all completions for a (user, path) pair.
    ///
    /// Used when mirroring an authoritative durable result into the local
    /// cache.
    fn replace(&self, user_id: &str, path_id: &str, records: &[ActivityCompletion]) -> Result<()>;
}

/// Blanket implementation of CompletionStore for Arc-wrapped stores.
///
/// Allows using `Arc<T>` where `T: CompletionStore` is expected, which is
/// useful for sharing a store between the reconciler and tests.
impl<T: CompletionStore + ?Sized> CompletionStore for Arc<T> {
    fn list(&self, user_id: &str, path_id: &str) -> Result<Vec<ActivityCompletion>> {
        (**self).list(user_id, path_id)
    }

    fn upsert(&self, completion: &ActivityCompletion) -> Result<()> {
        (**self).upsert(completion)
    }

    fn replace(&self, user_id: &str, path_id: &str, records: &[ActivityCompletion]) -> Result<()> {
        (**self).replace(user_id, path_id, records)
    }
}
