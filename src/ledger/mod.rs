//! Completion ledger for Waypoint.
//!
//! The ledger is the append-only record of finished activities, the basis
//! for both prerequisite and time-lock checks. Two stores back it: a
//! durable backend store and a client-local cache, reconciled on load with
//! a "durable wins when non-empty, else local" policy.

mod completion_set;
mod file;
mod memory;
mod reconciler;
mod traits;

pub use completion_set::CompletionSet;
pub use file::FileCompletionStore;
pub use memory::MemoryCompletionStore;
pub use reconciler::SyncReconciler;
pub use traits::CompletionStore;
