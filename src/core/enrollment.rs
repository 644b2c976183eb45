//! Path enrollment lifecycle for Waypoint.
//!
//! Tracks a user's enrollment history and enforces the lifecycle rules:
//! one active enrollment per user, at most one switch inside the trial
//! window, and trial budget preserved across a switch.

use chrono::{DateTime, Utc};

use crate::config::GatingConfig;
use crate::core::types::{PathEnrollment, PathKind};
use crate::error::{Result, WaypointError};

/// A user's enrollment history.
///
/// Superseded enrollments are deactivated, never deleted; the full history
/// stays available. All lifecycle mutations go through this struct.
#[derive(Debug, Clone)]
pub struct EnrollmentBook {
    /// Owning user.
    user_id: String,
    /// All enrollments, oldest first.
    history: Vec<PathEnrollment>,
}

impl EnrollmentBook {
    /// Create an empty book for a user.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            history: Vec::new(),
        }
    }

    /// Rebuild a book from stored history.
    pub fn from_history(user_id: impl Into<String>, history: Vec<PathEnrollment>) -> Self {
        Self {
            user_id: user_id.into(),
            history,
        }
    }

    /// The user's current enrollment, if any.
    pub fn active(&self) -> Option<&PathEnrollment> {
        self.history.iter().find(|e| e.is_active)
    }

    /// Full enrollment history, oldest first.
    pub fn history(&self) -> &[PathEnrollment] {
        &self.history
    }

    /// Enroll the user in a track.
    ///
    /// Fails with a domain error if an active enrollment already exists.
    /// The trial window opens at `now` and runs for the configured number
    /// of days.
    pub fn enroll(
        &mut self,
        path_kind: PathKind,
        now: DateTime<Utc>,
        config: &GatingConfig,
    ) -> Result<&PathEnrollment> {
        if let Some(active) = self.active() {
            return Err(WaypointError::domain(format!(
                "user {} already has an active enrollment in {}",
                self.user_id, active.path_kind
            )));
        }

        let enrollment = PathEnrollment::new(
            self.user_id.clone(),
            path_kind,
            now,
            config.trial.trial_days,
        );
        self.history.push(enrollment);
        Ok(self.history.last().unwrap())
    }

    /// Switch the active enrollment to a different track.
    ///
    /// Fails with a domain error when the switch budget is spent or the
    /// trial window has closed. On success the old enrollment is
    /// deactivated and kept as history; the new enrollment inherits the
    /// consumed switch count and the *remaining* trial budget, not a fresh
    /// window.
    pub fn switch(
        &mut self,
        new_kind: PathKind,
        now: DateTime<Utc>,
        config: &GatingConfig,
    ) -> Result<&PathEnrollment> {
        let active_idx = self
            .history
            .iter()
            .position(|e| e.is_active)
            .ok_or_else(|| WaypointError::enrollment_not_found(&self.user_id))?;

        let active = &self.history[active_idx];
        if active.switches_used >= config.trial.max_switches {
            return Err(WaypointError::domain(format!(
                "path switch already used ({} of {})",
                active.switches_used, config.trial.max_switches
            )));
        }

        let elapsed_days = active.days_since_start(now);
        if elapsed_days > config.trial.trial_days {
            return Err(WaypointError::domain(format!(
                "switch window closed: {} days since enrollment (limit {})",
                elapsed_days, config.trial.trial_days
            )));
        }

        let switches_used = active.switches_used + 1;
        let remaining_days = config.trial.trial_days - elapsed_days;

        self.history[active_idx].is_active = false;

        let mut enrollment =
            PathEnrollment::new(self.user_id.clone(), new_kind, now, remaining_days);
        enrollment.switches_used = switches_used;
        self.history.push(enrollment);
        Ok(self.history.last().unwrap())
    }

    /// Mark the active enrollment's curriculum as completed.
    ///
    /// Sets `completed_at` and leaves the enrollment active: a finished
    /// path is not automatically deactivated.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<()> {
        let active = self
            .history
            .iter_mut()
            .find(|e| e.is_active)
            .ok_or_else(|| WaypointError::enrollment_not_found(&self.user_id))?;

        if active.completed_at.is_none() {
            active.completed_at = Some(now);
        }
        Ok(())
    }
}
