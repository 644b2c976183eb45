//! Session-level engine facade for Waypoint.
//!
//! Wires the collaborators together the way a session uses them: the
//! enrollment and curriculum are loaded once, the completion ledger is
//! reconciled once, and access verdicts are computed on demand from
//! current wall-clock time.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::GatingConfig;
use crate::core::{
    AccessEvaluator, ActivityCompletion, EntitlementOracle, EntitlementSnapshot, PathEnrollment,
    WeekAccessStatus,
};
use crate::curriculum::CurriculumIndex;
use crate::error::Result;
use crate::ledger::{CompletionSet, SyncReconciler};

/// Per-session progression engine.
///
/// Holds the reconciled completion set and the entitlement snapshot for
/// one user's active enrollment, and answers week access queries against
/// them. State is refreshed explicitly via [`ProgressEngine::reload`];
/// verdicts themselves are derived and never stored.
pub struct ProgressEngine {
    curriculum: Arc<dyn CurriculumIndex>,
    reconciler: SyncReconciler,
    oracle: Box<dyn EntitlementOracle>,
    config: GatingConfig,
    enrollment: PathEnrollment,
    completions: CompletionSet,
    entitlement: EntitlementSnapshot,
}

impl ProgressEngine {
    /// Create an engine for one session.
    ///
    /// Reconciles the completion ledger and fetches the entitlement
    /// snapshot immediately.
    pub fn new(
        curriculum: Arc<dyn CurriculumIndex>,
        reconciler: SyncReconciler,
        oracle: Box<dyn EntitlementOracle>,
        config: GatingConfig,
        enrollment: PathEnrollment,
    ) -> Self {
        let completions = reconciler.load(&enrollment.user_id, &enrollment.id);
        let entitlement = oracle.entitlement(&enrollment.user_id);
        Self {
            curriculum,
            reconciler,
            oracle,
            config,
            enrollment,
            completions,
            entitlement,
        }
    }

    /// Re-reconcile the ledger and refresh the entitlement snapshot.
    pub fn reload(&mut self) {
        self.completions = self
            .reconciler
            .load(&self.enrollment.user_id, &self.enrollment.id);
        self.entitlement = self.oracle.entitlement(&self.enrollment.user_id);
    }

    /// The enrollment this session is operating on.
    pub fn enrollment(&self) -> &PathEnrollment {
        &self.enrollment
    }

    /// The reconciled completion set.
    pub fn completions(&self) -> &CompletionSet {
        &self.completions
    }

    fn evaluator(&self) -> AccessEvaluator<'_> {
        AccessEvaluator::new(
            self.curriculum.as_ref(),
            &self.completions,
            &self.entitlement,
            &self.enrollment,
            &self.config,
        )
    }

    /// Access verdict for one week, or `None` if the curriculum does not
    /// define it.
    pub fn week_status(
        &self,
        month: u32,
        week_number: u32,
        now: DateTime<Utc>,
    ) -> Option<WeekAccessStatus> {
        self.evaluator().evaluate(month, week_number, now)
    }

    /// Access verdicts for every defined week of a month, in order.
    pub fn month_statuses(&self, month: u32, now: DateTime<Utc>) -> Vec<WeekAccessStatus> {
        self.evaluator().month_statuses(month, now)
    }

    /// Record an explicit manual completion.
    ///
    /// Idempotent: recording the same activity twice yields exactly one
    /// record. Writes through the reconciler (durable best-effort, local
    /// always) and updates the in-memory set so subsequent verdicts see
    /// the completion immediately.
    pub fn record_activity(&mut self, activity_id: &str, now: DateTime<Utc>) -> Result<()> {
        let completion = ActivityCompletion::new(
            activity_id,
            self.enrollment.user_id.clone(),
            self.enrollment.id.clone(),
            now,
        );
        self.reconciler.record(&completion)?;
        self.completions.insert(&completion);
        Ok(())
    }

    /// Record a scoring event from the quiz/drill layer.
    ///
    /// Records a completion only when `score` meets the configured pass
    /// threshold. Returns whether anything was recorded.
    pub fn record_score(
        &mut self,
        activity_id: &str,
        score: f64,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        if score < self.config.scoring.pass_threshold {
            return Ok(false);
        }
        self.record_activity(activity_id, now)?;
        Ok(true)
    }

    /// Check whether every defined activity of every defined month is
    /// complete, and stamp the enrollment's completion time if so.
    ///
    /// The enrollment stays active; persisting the updated record is the
    /// caller's concern. Returns whether the curriculum is complete.
    pub fn curriculum_complete(&mut self, now: DateTime<Utc>) -> bool {
        let months = self.curriculum.months(self.enrollment.path_kind);
        if months.is_empty() {
            return false;
        }
        for month in months {
            let Some(month_def) = self.curriculum.month(self.enrollment.path_kind, month) else {
                continue;
            };
            for week in &month_def.weeks {
                if self.completions.completed_in(week) < week.activities.len() as u32 {
                    return false;
                }
            }
        }
        if self.enrollment.completed_at.is_none() {
            self.enrollment.completed_at = Some(now);
        }
        true
    }
}
