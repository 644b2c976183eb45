//! Waypoint - Path Progression & Access Gating Engine
//!
//! Waypoint decides, for a learner enrolled in a multi-month curriculum,
//! which weekly unit of content they may currently open, and how the
//! trial-and-subscription boundary interacts with the strict prerequisite
//! chain. It consumes a read-only curriculum index and an entitlement
//! signal, reconciles a durable completion ledger with a client-local
//! cache, and emits per-week access verdicts.

pub mod config;
pub mod core;
pub mod curriculum;
pub mod engine;
pub mod error;
pub mod ledger;

pub use config::GatingConfig;
pub use core::{
    AccessEvaluator, ActivityCompletion, ActivityRef, EnrollmentBook, EntitlementOracle,
    EntitlementSnapshot, LockReason, PathEnrollment, PathKind, WeekAccessStatus,
};
pub use curriculum::{
    CurriculumActivity, CurriculumIndex, CurriculumMonth, CurriculumWeek, StaticCurriculum,
};
pub use engine::ProgressEngine;
pub use error::{Result, WaypointError};
pub use ledger::{
    CompletionSet, CompletionStore, FileCompletionStore, MemoryCompletionStore, SyncReconciler,
};
