//! Curriculum index for Waypoint.
//!
//! The curriculum is an immutable, read-only tree of months, weeks, and
//! activities supplied by the content layer. The engine never authors or
//! mutates it; it only looks weeks up when evaluating access.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::PathKind;

/// A single activity within a curriculum week.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurriculumActivity {
    /// Stable activity identifier (`"{kind}-m{month}-w{week}-a{index}"`).
    pub id: String,
}

/// An ordered week of activities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurriculumWeek {
    /// Week number within the month (1-based).
    pub week_number: u32,
    /// Ordered activities for the week. May be empty.
    pub activities: Vec<CurriculumActivity>,
}

/// An ordered month of weeks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurriculumMonth {
    /// Month number within the track (1-based).
    pub month: u32,
    /// Ordered weeks for the month.
    pub weeks: Vec<CurriculumWeek>,
}

impl CurriculumMonth {
    /// Look up a week by its number.
    pub fn week(&self, week_number: u32) -> Option<&CurriculumWeek> {
        self.weeks.iter().find(|w| w.week_number == week_number)
    }
}

/// Read-only lookup from (track, month) to its weeks and activities.
pub trait CurriculumIndex: Send + Sync {
    /// Get the curriculum for one month of a track.
    ///
    /// Returns `None` when the track does not define that month.
    fn month(&self, kind: PathKind, month: u32) -> Option<&CurriculumMonth>;

    /// All month numbers a track defines, ascending.
    ///
    /// Months need not be contiguous; completeness checks must visit
    /// every defined month, not probe from 1 until a gap.
    fn months(&self, kind: PathKind) -> Vec<u32>;
}

/// In-memory curriculum backed by a map.
///
/// Built once at startup (or in tests) and handed to the engine.
#[derive(Debug, Default)]
pub struct StaticCurriculum {
    months: HashMap<(PathKind, u32), CurriculumMonth>,
}

impl StaticCurriculum {
    /// Create an empty curriculum.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a month to a track, replacing any existing entry.
    pub fn with_month(mut self, kind: PathKind, month: CurriculumMonth) -> Self {
        self.months.insert((kind, month.month), month);
        self
    }

    /// Build a uniform track: `months` months of `weeks_per_month` weeks
    /// with `activities_per_week` activities each.
    pub fn uniform(
        kind: PathKind,
        months: u32,
        weeks_per_month: u32,
        activities_per_week: u32,
    ) -> Self {
        let mut curriculum = Self::new();
        for month in 1..=months {
            let weeks = (1..=weeks_per_month)
                .map(|week_number| CurriculumWeek {
                    week_number,
                    activities: (1..=activities_per_week)
                        .map(|index| CurriculumActivity {
                            id: format!("{kind}-m{month}-w{week_number}-a{index}"),
                        })
                        .collect(),
                })
                .collect();
            curriculum = curriculum.with_month(kind, CurriculumMonth { month, weeks });
        }
        curriculum
    }
}

impl CurriculumIndex for StaticCurriculum {
    fn month(&self, kind: PathKind, month: u32) -> Option<&CurriculumMonth> {
        self.months.get(&(kind, month))
    }

    fn months(&self, kind: PathKind) -> Vec<u32> {
        let mut months: Vec<u32> = self
            .months
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, m)| *m)
            .collect();
        months.sort_unstable();
        months
    }
}

/// The (month, week) pair immediately preceding the given week.
///
/// Wraps from week 1 of month M to the last week of month M-1. Returns
/// `None` for the first global week, which has no predecessor.
pub fn preceding_week(month: u32, week_number: u32, weeks_per_month: u32) -> Option<(u32, u32)> {
    if week_number > 1 {
        Some((month, week_number - 1))
    } else if month > 1 {
        Some((month - 1, weeks_per_month))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_curriculum_shape() {
        let curriculum = StaticCurriculum::uniform(PathKind::Foundation, 2, 4, 3);

        let month = curriculum.month(PathKind::Foundation, 1).unwrap();
        assert_eq!(month.weeks.len(), 4);
        assert_eq!(month.weeks[0].activities.len(), 3);
        assert_eq!(month.weeks[0].activities[0].id, "foundation-m1-w1-a1");

        assert!(curriculum.month(PathKind::Foundation, 3).is_none());
        assert!(curriculum.month(PathKind::Fluency, 1).is_none());
    }

    #[test]
    fn test_month_week_lookup() {
        let curriculum = StaticCurriculum::uniform(PathKind::Mastery, 1, 4, 1);
        let month = curriculum.month(PathKind::Mastery, 1).unwrap();

        assert_eq!(month.week(2).unwrap().week_number, 2);
        assert!(month.week(5).is_none());
    }

    #[test]
    fn test_months_are_sorted_and_kind_scoped() {
        let gap_month = CurriculumMonth {
            month: 5,
            weeks: vec![],
        };
        let curriculum = StaticCurriculum::uniform(PathKind::Foundation, 2, 4, 1)
            .with_month(PathKind::Foundation, gap_month)
            .with_month(
                PathKind::Fluency,
                CurriculumMonth {
                    month: 1,
                    weeks: vec![],
                },
            );

        assert_eq!(curriculum.months(PathKind::Foundation), vec![1, 2, 5]);
        assert_eq!(curriculum.months(PathKind::Fluency), vec![1]);
        assert!(curriculum.months(PathKind::Mastery).is_empty());
    }

    #[test]
    fn test_with_month_replaces() {
        let empty_month = CurriculumMonth {
            month: 1,
            weeks: vec![],
        };
        let curriculum = StaticCurriculum::uniform(PathKind::Foundation, 1, 4, 2)
            .with_month(PathKind::Foundation, empty_month.clone());

        assert_eq!(
            curriculum.month(PathKind::Foundation, 1),
            Some(&empty_month)
        );
    }

    #[test]
    fn test_preceding_week_within_month() {
        assert_eq!(preceding_week(1, 3, 4), Some((1, 2)));
        assert_eq!(preceding_week(2, 2, 4), Some((2, 1)));
    }

    #[test]
    fn test_preceding_week_wraps_to_previous_month() {
        assert_eq!(preceding_week(2, 1, 4), Some((1, 4)));
        assert_eq!(preceding_week(3, 1, 5), Some((2, 5)));
    }

    #[test]
    fn test_preceding_week_none_for_first_global_week() {
        assert_eq!(preceding_week(1, 1, 4), None);
    }
}
