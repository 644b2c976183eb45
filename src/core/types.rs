//! Domain types for Waypoint.
//!
//! These types cover the durable records (enrollments, activity
//! completions), the derived access verdict, and the entitlement snapshot
//! consumed from the billing side.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WaypointError};

/// Curriculum track a learner can enroll in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    /// Ground-up track for new learners.
    Foundation,
    /// Conversational-focus track.
    Fluency,
    /// Advanced track for returning learners.
    Mastery,
}

impl PathKind {
    /// Stable lowercase name used in activity identifiers.
    pub fn as_str(&self) -> &'static str {
        match self {
            PathKind::Foundation => "foundation",
            PathKind::Fluency => "fluency",
            PathKind::Mastery => "mastery",
        }
    }
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PathKind {
    type Err = WaypointError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "foundation" => Ok(PathKind::Foundation),
            "fluency" => Ok(PathKind::Fluency),
            "mastery" => Ok(PathKind::Mastery),
            other => Err(WaypointError::serde(format!("unknown path kind: {other}"))),
        }
    }
}

/// A user's enrollment in a curriculum track.
///
/// At most one enrollment per user is active at any time. A switched
/// enrollment is deactivated, never deleted; it remains as history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathEnrollment {
    /// Unique enrollment identifier.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Enrolled curriculum track.
    pub path_kind: PathKind,
    /// When the enrollment began.
    pub started_at: DateTime<Utc>,
    /// Number of path switches consumed (0 or 1).
    pub switches_used: u32,
    /// End of the trial window, if one applies.
    pub trial_ends_at: Option<DateTime<Utc>>,
    /// Whether this is the user's current enrollment.
    pub is_active: bool,
    /// When the full curriculum was completed, if it has been.
    pub completed_at: Option<DateTime<Utc>>,
}

impl PathEnrollment {
    /// Create a new active enrollment starting at `now`.
    pub fn new(
        user_id: impl Into<String>,
        path_kind: PathKind,
        now: DateTime<Utc>,
        trial_days: i64,
    ) -> Self {
        let user_id = user_id.into();
        Self {
            id: format!("{}-{}-{}", user_id, path_kind, now.timestamp_millis()),
            user_id,
            path_kind,
            started_at: now,
            switches_used: 0,
            trial_ends_at: Some(now + Duration::days(trial_days)),
            is_active: true,
            completed_at: None,
        }
    }

    /// Days elapsed since the enrollment started, floored to whole days.
    pub fn days_since_start(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.started_at).num_days()
    }
}

/// A recorded activity completion.
///
/// Unique per (user, path, activity); recording the same activity twice is
/// idempotent. Never mutated, never deleted except by account-level reset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityCompletion {
    /// Stable activity key encoding track, month, week, and index.
    pub activity_id: String,
    /// Owning user.
    pub user_id: String,
    /// Enrollment the completion belongs to.
    pub path_id: String,
    /// When the activity was first completed.
    pub completed_at: DateTime<Utc>,
}

impl ActivityCompletion {
    /// Create a completion record at `now`.
    pub fn new(
        activity_id: impl Into<String>,
        user_id: impl Into<String>,
        path_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            activity_id: activity_id.into(),
            user_id: user_id.into(),
            path_id: path_id.into(),
            completed_at: now,
        }
    }
}

/// Parsed form of a stable activity identifier.
///
/// The wire format is `"{kind}-m{month}-w{week}-a{index}"`, e.g.
/// `foundation-m2-w3-a1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityRef {
    pub kind: PathKind,
    pub month: u32,
    pub week: u32,
    pub index: u32,
}

impl ActivityRef {
    /// Build the stable string identifier for this activity.
    pub fn id(&self) -> String {
        format!(
            "{}-m{}-w{}-a{}",
            self.kind, self.month, self.week, self.index
        )
    }

    /// Key identifying the week this activity belongs to.
    ///
    /// Used to group completions when deriving per-week start timestamps.
    pub fn week_key(&self) -> String {
        week_key(self.month, self.week)
    }

    /// Parse an activity identifier.
    pub fn parse(id: &str) -> Result<Self> {
        let mut parts = id.rsplitn(4, '-');
        let index = parts.next();
        let week = parts.next();
        let month = parts.next();
        let kind = parts.next();

        let (Some(kind), Some(month), Some(week), Some(index)) = (kind, month, week, index) else {
            return Err(WaypointError::serde(format!("malformed activity id: {id}")));
        };

        let month = month
            .strip_prefix('m')
            .and_then(|m| m.parse::<u32>().ok())
            .ok_or_else(|| WaypointError::serde(format!("malformed activity id: {id}")))?;
        let week = week
            .strip_prefix('w')
            .and_then(|w| w.parse::<u32>().ok())
            .ok_or_else(|| WaypointError::serde(format!("malformed activity id: {id}")))?;
        let index = index
            .strip_prefix('a')
            .and_then(|a| a.parse::<u32>().ok())
            .ok_or_else(|| WaypointError::serde(format!("malformed activity id: {id}")))?;

        Ok(Self {
            kind: kind.parse()?,
            month,
            week,
            index,
        })
    }
}

/// Key identifying a (month, week) pair within a track.
pub fn week_key(month: u32, week: u32) -> String {
    format!("m{month}-w{week}")
}

/// Why a week is locked, or why it is open for free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockReason {
    /// Open without entitlement: the permanent trial sample.
    Free,
    /// Past the free threshold without entitlement.
    PremiumRequired,
    /// The immediately preceding week has unfinished activities.
    IncompletePrevious,
    /// The cooldown since the preceding week started has not elapsed.
    TimeLocked,
}

/// Access verdict for a single week.
///
/// Derived, never persisted: recomputed on every query from the other
/// entities plus current time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeekAccessStatus {
    /// Curriculum month (1-based).
    pub month: u32,
    /// Week number within the month (1-based).
    pub week_number: u32,
    /// Whether the presentation layer may open this week.
    pub is_unlocked: bool,
    /// Gating reason, if any rule fired.
    pub reason: Option<LockReason>,
    /// Whole days until a time-locked week unlocks.
    pub days_until_unlock: Option<i64>,
    /// Completed activities in this week.
    pub activities_completed: u32,
    /// Total activities defined for this week.
    pub total_activities: u32,
    /// Whether every defined activity is complete.
    pub is_complete: bool,
}

/// Snapshot of a user's premium entitlement.
///
/// Externally supplied and treated as ground truth for premium gating; the
/// engine does not re-derive billing state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntitlementSnapshot {
    /// Whether the user currently has paid/premium access.
    pub has_access: bool,
    /// Plan tier name (subscription, trial, institutional grant).
    pub tier: String,
    /// When a trial-based entitlement expires, if applicable.
    pub trial_ends_at: Option<DateTime<Utc>>,
}

impl EntitlementSnapshot {
    /// Snapshot for a user with no premium access.
    pub fn none() -> Self {
        Self {
            has_access: false,
            tier: "free".to_string(),
            trial_ends_at: None,
        }
    }

    /// Snapshot for a user with full premium access.
    pub fn premium(tier: impl Into<String>) -> Self {
        Self {
            has_access: true,
            tier: tier.into(),
            trial_ends_at: None,
        }
    }
}

/// Collaborator answering "does this user currently have premium access".
pub trait EntitlementOracle: Send + Sync {
    /// Fetch the current entitlement snapshot for a user.
    fn entitlement(&self, user_id: &str) -> EntitlementSnapshot;
}
