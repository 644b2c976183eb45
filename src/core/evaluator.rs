//! Access evaluation for Waypoint.
//!
//! The evaluator decides, for one (month, week) pair, whether the learner
//! may open that week right now. It is a pure function of the curriculum,
//! the reconciled completion set, the entitlement snapshot, the active
//! enrollment, and a single wall-clock instant. Its output is derived and
//! never persisted.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::config::GatingConfig;
use crate::core::types::{EntitlementSnapshot, LockReason, PathEnrollment, WeekAccessStatus};
use crate::curriculum::{preceding_week, CurriculumIndex};
use crate::ledger::CompletionSet;

/// Week access evaluator.
///
/// Borrows all of its inputs; `now` is taken once per evaluation and
/// threaded through every rule so a verdict cannot flip between two rule
/// checks within the same call.
pub struct AccessEvaluator<'a> {
    curriculum: &'a dyn CurriculumIndex,
    completions: &'a CompletionSet,
    entitlement: &'a EntitlementSnapshot,
    enrollment: &'a PathEnrollment,
    config: &'a GatingConfig,
}

impl<'a> AccessEvaluator<'a> {
    /// Create a new evaluator over the given collaborators.
    pub fn new(
        curriculum: &'a dyn CurriculumIndex,
        completions: &'a CompletionSet,
        entitlement: &'a EntitlementSnapshot,
        enrollment: &'a PathEnrollment,
        config: &'a GatingConfig,
    ) -> Self {
        Self {
            curriculum,
            completions,
            entitlement,
            enrollment,
            config,
        }
    }

    /// Compute the access verdict for one week.
    ///
    /// Rules, in order, first match wins:
    /// 1. The first global week: unlocked, reason `free`.
    /// 2. Past the free global-week threshold without entitlement:
    ///    `premium_required`. Checked before prerequisites so a user is
    ///    never told to finish last week when the real blocker is
    ///    payment. Weeks inside the threshold skip only this gate.
    /// 3. Preceding week defined and not fully complete:
    ///    `incomplete_previous`. A zero-activity week is vacuously
    ///    complete.
    /// 4. Fewer than `cooldown_days` since the preceding week was first
    ///    started: `time_locked`, with the remaining days.
    /// 5. Otherwise unlocked with no gating reason.
    ///
    /// Progress fields for the requested week are filled in on every
    /// branch so a caller can show progress even on a locked week.
    /// Returns `None` when the curriculum does not define the week or the
    /// month is not 1-based; the caller must not render it.
    pub fn evaluate(
        &self,
        month: u32,
        week_number: u32,
        now: DateTime<Utc>,
    ) -> Option<WeekAccessStatus> {
        let month_def = self.curriculum.month(self.enrollment.path_kind, month)?;
        let week_def = month_def.week(week_number)?;

        let total_activities = week_def.activities.len() as u32;
        let activities_completed = self.completions.completed_in(week_def);
        let is_complete = activities_completed == total_activities;

        let status = |is_unlocked, reason, days_until_unlock| WeekAccessStatus {
            month,
            week_number,
            is_unlocked,
            reason,
            days_until_unlock,
            activities_completed,
            total_activities,
            is_complete,
        };

        let weeks_per_month = self.config.schedule.weeks_per_month;
        // Months are 1-based; a month-0 entry is not a valid address even
        // if a curriculum defines one.
        let global_week = month.checked_sub(1)? * weeks_per_month + week_number;

        // Rule 1: the permanent trial sample, free regardless of entitlement
        if global_week == 1 {
            return Some(status(true, Some(LockReason::Free), None));
        }

        // Rule 2: premium gate, evaluated before prerequisites. The free
        // threshold exempts early weeks from this gate only; they still
        // walk the prerequisite and cooldown rules below.
        if global_week > self.config.schedule.free_weeks && !self.entitlement.has_access {
            return Some(status(false, Some(LockReason::PremiumRequired), None));
        }

        let previous = preceding_week(month, week_number, weeks_per_month);

        // Rule 3: prerequisite chain on the immediately preceding week
        if let Some((prev_month, prev_week)) = previous {
            if let Some(prev_def) = self
                .curriculum
                .month(self.enrollment.path_kind, prev_month)
                .and_then(|m| m.week(prev_week))
            {
                let prev_total = prev_def.activities.len() as u32;
                if self.completions.completed_in(prev_def) < prev_total {
                    return Some(status(false, Some(LockReason::IncompletePrevious), None));
                }
            }
        }

        // Rule 4: cooldown since the preceding week was first started
        if let Some((prev_month, prev_week)) = previous {
            match self.completions.week_started_at(prev_month, prev_week) {
                Some(started_at) => {
                    let elapsed_days = now.signed_duration_since(started_at).num_days();
                    let cooldown = self.config.schedule.cooldown_days;
                    if elapsed_days < cooldown {
                        return Some(status(
                            false,
                            Some(LockReason::TimeLocked),
                            Some(cooldown - elapsed_days),
                        ));
                    }
                }
                None => {
                    // No start anchor for the preceding week. Treat as not
                    // time-locked rather than locking forever on missing
                    // data; rule 3 already gates a never-begun non-trivial
                    // week.
                    warn!(
                        "no start timestamp for m{}-w{} of {}; skipping time lock",
                        prev_month, prev_week, self.enrollment.id
                    );
                }
            }
        }

        // Rule 5: open
        Some(status(true, None, None))
    }

    /// Evaluate every week the curriculum defines for a month, in order.
    pub fn month_statuses(&self, month: u32, now: DateTime<Utc>) -> Vec<WeekAccessStatus> {
        let Some(month_def) = self.curriculum.month(self.enrollment.path_kind, month) else {
            return Vec::new();
        };
        month_def
            .weeks
            .iter()
            .filter_map(|w| self.evaluate(month, w.week_number, now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ActivityCompletion, PathKind};
    use crate::curriculum::StaticCurriculum;
    use chrono::Duration;

    struct Fixture {
        curriculum: StaticCurriculum,
        completions: CompletionSet,
        entitlement: EntitlementSnapshot,
        enrollment: PathEnrollment,
        config: GatingConfig,
    }

    impl Fixture {
        /// 2 months of 4 weeks, one activity per week, premium user.
        fn new(now: DateTime<Utc>) -> Self {
            Self {
                curriculum: StaticCurriculum::uniform(PathKind::Foundation, 2, 4, 1),
                completions: CompletionSet::new(),
                entitlement: EntitlementSnapshot::premium("subscription"),
                enrollment: PathEnrollment::new("user-1", PathKind::Foundation, now, 30),
                config: GatingConfig::default(),
            }
        }

        fn complete(&mut self, activity_id: &str, at: DateTime<Utc>) {
            self.completions.insert(&ActivityCompletion::new(
                activity_id,
                "user-1",
                self.enrollment.id.clone(),
                at,
            ));
        }

        fn evaluator(&self) -> AccessEvaluator<'_> {
            AccessEvaluator::new(
                &self.curriculum,
                &self.completions,
                &self.entitlement,
                &self.enrollment,
                &self.config,
            )
        }
    }

    #[test]
    fn test_first_global_week_is_free_without_entitlement() {
        let now = Utc::now();
        let mut fixture = Fixture::new(now);
        fixture.entitlement = EntitlementSnapshot::none();

        let status = fixture.evaluator().evaluate(1, 1, now).unwrap();

        assert!(status.is_unlocked);
        assert_eq!(status.reason, Some(LockReason::Free));
        assert_eq!(status.days_until_unlock, None);
    }

    #[test]
    fn test_premium_gate_past_free_threshold() {
        let now = Utc::now();
        let mut fixture = Fixture::new(now);
        fixture.entitlement = EntitlementSnapshot::none();
        // Prerequisites satisfied, so payment is the only blocker
        fixture.complete("foundation-m1-w1-a1", now - Duration::days(10));

        let status = fixture.evaluator().evaluate(1, 2, now).unwrap();

        assert!(!status.is_unlocked);
        assert_eq!(status.reason, Some(LockReason::PremiumRequired));
    }

    #[test]
    fn test_premium_gate_precedes_prerequisite_gate() {
        let now = Utc::now();
        let mut fixture = Fixture::new(now);
        fixture.entitlement = EntitlementSnapshot::none();
        // Week 1 untouched: both gates would fire, premium must win

        let status = fixture.evaluator().evaluate(1, 2, now).unwrap();
        assert_eq!(status.reason, Some(LockReason::PremiumRequired));
    }

    #[test]
    fn test_incomplete_previous_blocks() {
        let now = Utc::now();
        let fixture = Fixture::new(now);

        let status = fixture.evaluator().evaluate(1, 2, now).unwrap();

        assert!(!status.is_unlocked);
        assert_eq!(status.reason, Some(LockReason::IncompletePrevious));
    }

    #[test]
    fn test_incomplete_previous_wraps_across_months() {
        let now = Utc::now();
        let fixture = Fixture::new(now);

        // Month 2 week 1's predecessor is month 1 week 4
        let status = fixture.evaluator().evaluate(2, 1, now).unwrap();
        assert_eq!(status.reason, Some(LockReason::IncompletePrevious));
    }

    #[test]
    fn test_time_lock_scenario() {
        // User completes month 1 week 1's single activity on day 0
        let day0 = Utc::now() - Duration::days(7);
        let mut fixture = Fixture::new(day0);
        fixture.complete("foundation-m1-w1-a1", day0);

        // Day 3: still locked with 4 days to go
        let status = fixture
            .evaluator()
            .evaluate(1, 2, day0 + Duration::days(3))
            .unwrap();
        assert!(!status.is_unlocked);
        assert_eq!(status.reason, Some(LockReason::TimeLocked));
        assert_eq!(status.days_until_unlock, Some(4));

        // Day 7: cooldown elapsed
        let status = fixture
            .evaluator()
            .evaluate(1, 2, day0 + Duration::days(7))
            .unwrap();
        assert!(status.is_unlocked);
        assert_eq!(status.reason, None);
        assert_eq!(status.days_until_unlock, None);
    }

    #[test]
    fn test_zero_activity_predecessor_is_vacuously_complete() {
        let now = Utc::now();
        let mut fixture = Fixture::new(now);
        fixture.curriculum = {
            use crate::curriculum::{CurriculumMonth, CurriculumWeek};
            StaticCurriculum::uniform(PathKind::Foundation, 1, 4, 1).with_month(
                PathKind::Foundation,
                CurriculumMonth {
                    month: 1,
                    weeks: vec![
                        CurriculumWeek {
                            week_number: 1,
                            activities: vec![],
                        },
                        CurriculumWeek {
                            week_number: 2,
                            activities: vec![crate::curriculum::CurriculumActivity {
                                id: "foundation-m1-w2-a1".to_string(),
                            }],
                        },
                    ],
                },
            )
        };

        // Predecessor has no activities and no start timestamp: neither the
        // prerequisite gate nor the time lock fires
        let status = fixture.evaluator().evaluate(1, 2, now).unwrap();
        assert!(status.is_unlocked);
        assert_eq!(status.reason, None);
    }

    #[test]
    fn test_missing_start_timestamp_is_not_time_locked() {
        use crate::curriculum::{CurriculumActivity, CurriculumMonth, CurriculumWeek};

        let now = Utc::now();
        let mut fixture = Fixture::new(now);
        // Week 1's activity carries an opaque legacy id: completing it
        // satisfies the prerequisite check but contributes no week-start
        // anchor, so the time-lock check has nothing to measure from.
        fixture.curriculum = StaticCurriculum::new().with_month(
            PathKind::Foundation,
            CurriculumMonth {
                month: 1,
                weeks: vec![
                    CurriculumWeek {
                        week_number: 1,
                        activities: vec![CurriculumActivity {
                            id: "legacy-opaque-id".to_string(),
                        }],
                    },
                    CurriculumWeek {
                        week_number: 2,
                        activities: vec![CurriculumActivity {
                            id: "foundation-m1-w2-a1".to_string(),
                        }],
                    },
                ],
            },
        );
        fixture.complete("legacy-opaque-id", now);

        let status = fixture.evaluator().evaluate(1, 2, now).unwrap();
        assert!(status.is_unlocked);
        assert_eq!(status.reason, None);
    }

    #[test]
    fn test_raised_free_threshold_keeps_prerequisite_chain() {
        let now = Utc::now();
        let mut fixture = Fixture::new(now);
        fixture.config.schedule.free_weeks = 2;

        // Week 1 is the only unconditionally free week
        let status = fixture.evaluator().evaluate(1, 1, now).unwrap();
        assert_eq!(status.reason, Some(LockReason::Free));

        // Week 2 is inside the threshold but week 1 is untouched, so the
        // prerequisite gate still fires
        let status = fixture.evaluator().evaluate(1, 2, now).unwrap();
        assert!(!status.is_unlocked);
        assert_eq!(status.reason, Some(LockReason::IncompletePrevious));
    }

    #[test]
    fn test_free_threshold_exempts_premium_gate_only() {
        let now = Utc::now();
        let mut fixture = Fixture::new(now);
        fixture.config.schedule.free_weeks = 2;
        fixture.entitlement = EntitlementSnapshot::none();
        fixture.complete("foundation-m1-w1-a1", now - Duration::days(10));
        fixture.complete("foundation-m1-w2-a1", now - Duration::days(10));

        // Week 2: inside the threshold, prerequisites met, no payment
        // needed
        let status = fixture.evaluator().evaluate(1, 2, now).unwrap();
        assert!(status.is_unlocked);
        assert_eq!(status.reason, None);

        // Week 3: past the threshold, payment is the blocker
        let status = fixture.evaluator().evaluate(1, 3, now).unwrap();
        assert_eq!(status.reason, Some(LockReason::PremiumRequired));
    }

    #[test]
    fn test_month_zero_yields_none() {
        use crate::curriculum::{CurriculumActivity, CurriculumMonth, CurriculumWeek};

        let now = Utc::now();
        let mut fixture = Fixture::new(now);
        // A month-0 entry can be registered but is never addressable
        fixture.curriculum = fixture.curriculum.with_month(
            PathKind::Foundation,
            CurriculumMonth {
                month: 0,
                weeks: vec![CurriculumWeek {
                    week_number: 1,
                    activities: vec![CurriculumActivity {
                        id: "foundation-m0-w1-a1".to_string(),
                    }],
                }],
            },
        );

        assert!(fixture.evaluator().evaluate(0, 1, now).is_none());
    }

    #[test]
    fn test_undefined_week_yields_none() {
        let now = Utc::now();
        let fixture = Fixture::new(now);

        assert!(fixture.evaluator().evaluate(3, 1, now).is_none());
        assert!(fixture.evaluator().evaluate(1, 5, now).is_none());
    }

    #[test]
    fn test_progress_fields_populated_on_locked_week() {
        let now = Utc::now();
        let mut fixture = Fixture::new(now);
        fixture.curriculum = StaticCurriculum::uniform(PathKind::Foundation, 2, 4, 3);
        fixture.entitlement = EntitlementSnapshot::none();
        fixture.complete("foundation-m1-w3-a1", now);
        fixture.complete("foundation-m1-w3-a2", now);

        // Week 3 is premium-locked, yet its own progress is reported
        let status = fixture.evaluator().evaluate(1, 3, now).unwrap();
        assert_eq!(status.reason, Some(LockReason::PremiumRequired));
        assert_eq!(status.activities_completed, 2);
        assert_eq!(status.total_activities, 3);
        assert!(!status.is_complete);
    }

    #[test]
    fn test_month_statuses_in_order() {
        let now = Utc::now();
        let fixture = Fixture::new(now);

        let statuses = fixture.evaluator().month_statuses(1, now);
        assert_eq!(statuses.len(), 4);
        assert_eq!(
            statuses.iter().map(|s| s.week_number).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        // Only the free week is open at the start
        assert!(statuses[0].is_unlocked);
        assert!(statuses[1..].iter().all(|s| !s.is_unlocked));
    }

    #[test]
    fn test_month_statuses_undefined_month_is_empty() {
        let now = Utc::now();
        let fixture = Fixture::new(now);
        assert!(fixture.evaluator().month_statuses(9, now).is_empty());
    }

    #[test]
    fn test_full_progression_through_month_boundary() {
        let day0 = Utc::now() - Duration::days(40);
        let mut fixture = Fixture::new(day0);

        // Complete weeks 1..=4 of month 1, each a week apart
        for week in 1..=4u32 {
            fixture.complete(
                &format!("foundation-m1-w{week}-a1"),
                day0 + Duration::days((week as i64 - 1) * 7),
            );
        }

        // Month 2 week 1: predecessor complete and cooldown elapsed
        let now = day0 + Duration::days(30);
        let status = fixture.evaluator().evaluate(2, 1, now).unwrap();
        assert!(status.is_unlocked);
        assert_eq!(status.reason, None);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Premium gate fires on every non-free week for free users,
            // whatever the completion state
            #[test]
            fn prop_no_access_past_threshold_is_premium_required(
                month in 1u32..=2,
                week in 1u32..=4,
                completed_weeks in 0u32..=8,
            ) {
                let now = Utc::now();
                let mut fixture = Fixture::new(now);
                fixture.entitlement = EntitlementSnapshot::none();
                for gw in 0..completed_weeks {
                    let m = gw / 4 + 1;
                    let w = gw % 4 + 1;
                    fixture.complete(
                        &format!("foundation-m{m}-w{w}-a1"),
                        now - Duration::days(60),
                    );
                }

                let status = fixture.evaluator().evaluate(month, week, now).unwrap();
                let global_week = (month - 1) * 4 + week;

                if global_week == 1 {
                    prop_assert!(status.is_unlocked);
                    prop_assert_eq!(status.reason, Some(LockReason::Free));
                } else {
                    prop_assert!(!status.is_unlocked);
                    prop_assert_eq!(status.reason, Some(LockReason::PremiumRequired));
                }
            }

            // An incomplete predecessor never lets the week unlock, even
            // with full entitlement
            #[test]
            fn prop_incomplete_predecessor_never_unlocks(
                month in 1u32..=2,
                week in 1u32..=4,
            ) {
                let now = Utc::now();
                let fixture = Fixture::new(now);

                let status = fixture.evaluator().evaluate(month, week, now).unwrap();
                let global_week = (month - 1) * 4 + week;

                if global_week > 1 {
                    prop_assert!(!status.is_unlocked);
                    prop_assert_eq!(status.reason, Some(LockReason::IncompletePrevious));
                }
            }

            // Progress fields reflect the requested week on every branch
            #[test]
            fn prop_progress_fields_always_populated(
                month in 1u32..=2,
                week in 1u32..=4,
                has_access in any::<bool>(),
            ) {
                let now = Utc::now();
                let mut fixture = Fixture::new(now);
                fixture.entitlement = if has_access {
                    EntitlementSnapshot::premium("subscription")
                } else {
                    EntitlementSnapshot::none()
                };

                let status = fixture.evaluator().evaluate(month, week, now).unwrap();
                prop_assert_eq!(status.total_activities, 1);
                prop_assert!(status.activities_completed <= status.total_activities);
                prop_assert_eq!(
                    status.is_complete,
                    status.activities_completed == status.total_activities
                );
            }
        }
    }
}
