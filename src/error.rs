//! Unified error types for Waypoint.
//!
//! Errors split into three families: domain violations (illegal switch,
//! double enrollment) are rejected synchronously with no state change;
//! data absence is handled by conservative fallback rules in the evaluator
//! rather than errors; durable-store I/O failures are caught, logged, and
//! degrade to local-cache-only operation.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Waypoint operations.
#[derive(Error, Debug)]
pub enum WaypointError {
    /// I/O errors from local cache file operations.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Durable ledger store errors (fetch or upsert failures).
    #[error("ledger error: {message}")]
    Ledger { message: String },

    /// JSON or TOML parsing/serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Domain rule violations (illegal switch, double enrollment).
    #[error("domain violation: {message}")]
    Domain { message: String },

    /// No active enrollment found for a user.
    #[error("no active enrollment for user: {user_id}")]
    EnrollmentNotFound { user_id: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },
}

/// A specialized Result type for Waypoint operations.
pub type Result<T> = std::result::Result<T, WaypointError>;

impl WaypointError {
    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a durable ledger error.
    pub fn ledger(message: impl Into<String>) -> Self {
        Self::Ledger {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a domain violation error.
    pub fn domain(message: impl Into<String>) -> Self {
        Self::Domain {
            message: message.into(),
        }
    }

    /// Create an enrollment-not-found error.
    pub fn enrollment_not_found(user_id: impl Into<String>) -> Self {
        Self::EnrollmentNotFound {
            user_id: user_id.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this error may be swallowed in favor of degraded operation.
    ///
    /// Infrastructure errors (storage, ledger, serde, config) degrade to
    /// local-cache-only operation. Domain violations never do: they carry
    /// a rule rejection the caller must see.
    pub fn is_fail_open(&self) -> bool {
        !matches!(
            self,
            Self::Domain { .. } | Self::EnrollmentNotFound { .. }
        )
    }
}

impl From<io::Error> for WaypointError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for WaypointError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Trait for fail-open error handling.
///
/// The reconciler uses these methods to log a durable-store failure and
/// continue on the local cache rather than propagating to the caller.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;

    /// Handle an error by logging a warning and returning the provided fallback.
    fn fail_open_with(self, context: &str, fallback: T) -> T;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using default)", context, err);
                T::default()
            }
        }
    }

    fn fail_open_with(self, context: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using fallback)", context, err);
                fallback
            }
        }
    }
}
