//! Core domain logic for Waypoint.
//!
//! Domain types, the access evaluator, and the enrollment lifecycle.

pub mod enrollment;
pub mod evaluator;
pub mod types;

pub use enrollment::EnrollmentBook;
pub use evaluator::AccessEvaluator;
pub use types::{
    week_key, ActivityCompletion, ActivityRef, EntitlementOracle, EntitlementSnapshot, LockReason,
    PathEnrollment, PathKind, WeekAccessStatus,
};
