//! Dual-store reconciliation for the completion ledger.
//!
//! The reconciler merges the durable backend view with the client-local
//! cache: durable wins when it returns a non-empty result, otherwise the
//! local cache is used unchanged. Writes go to both stores, and a durable
//! write failure degrades to cache-only rather than surfacing to the
//! caller.

use tracing::{debug, warn};

use crate::core::ActivityCompletion;
use crate::error::{FailOpen, Result};
use crate::ledger::{CompletionSet, CompletionStore};

/// Reconciles a durable completion store with a client-local cache.
pub struct SyncReconciler {
    /// Durable backend store (authoritative when reachable and non-empty).
    durable: Box<dyn CompletionStore>,
    /// Client-local cache (fallback, always written).
    local: Box<dyn CompletionStore>,
}

impl SyncReconciler {
    /// Create a new reconciler over a durable store and a local cache.
    pub fn new(durable: Box<dyn CompletionStore>, local: Box<dyn CompletionStore>) -> Self {
        Self { durable, local }
    }

    /// Load the reconciled completion set for a (user, path) pair.
    ///
    /// A non-empty durable result is authoritative: it replaces the local
    /// cache and becomes the returned set. An empty or failed durable
    /// fetch falls back to the local cache unchanged; the failure is
    /// logged, not propagated.
    pub fn load(&self, user_id: &str, path_id: &str) -> CompletionSet {
        match self.durable.list(user_id, path_id) {
            Ok(records) if !records.is_empty() => {
                if let Err(err) = self.local.replace(user_id, path_id, &records) {
                    warn!(
                        "failed to mirror durable completions into local cache for {}/{}: {}",
                        user_id, path_id, err
                    );
                }
                CompletionSet::from_records(&records)
            }
            Ok(_) => {
                debug!(
                    "durable store empty for {}/{}, using local cache",
                    user_id, path_id
                );
                self.load_local(user_id, path_id)
            }
            Err(err) => {
                warn!(
                    "durable store unreachable for {}/{}: {} (falling back to local cache)",
                    user_id, path_id, err
                );
                self.load_local(user_id, path_id)
            }
        }
    }

    fn load_local(&self, user_id: &str, path_id: &str) -> CompletionSet {
        let records = self
            .local
            .list(user_id, path_id)
            .fail_open_default("listing local completion cache");
        CompletionSet::from_records(&records)
    }

    /// Record a completion in both stores.
    ///
    /// The durable upsert is best-effort: a failure is logged and
    /// swallowed so the unlock flow is never blocked by backend
    /// unavailability. The local cache write is the one that must
    /// succeed; its error is the only one returned. The two stores may be
    /// transiently inconsistent until the next `load`.
    pub fn record(&self, completion: &ActivityCompletion) -> Result<()> {
        if let Err(err) = self.durable.upsert(completion) {
            warn!(
                "durable upsert failed for {} ({}): {} (kept in local cache only)",
                completion.activity_id, completion.user_id, err
            );
        }

        self.local.upsert(completion)
    }
}
