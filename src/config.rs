//! Configuration loading for Waypoint.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. User config (`~/.waypoint/config.toml`)
//! 3. Defaults (lowest priority)
//!
//! All configuration is optional. The engine runs with sensible defaults
//! when no config exists.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, WaypointError};

/// Main configuration struct for Waypoint gating behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GatingConfig {
    /// Curriculum schedule shape and unlock pacing.
    pub schedule: ScheduleConfig,
    /// Trial window and path-switch limits.
    pub trial: TrialConfig,
    /// Activity scoring thresholds.
    pub scoring: ScoringConfig,
}

/// Curriculum schedule configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Number of weeks in each curriculum month.
    pub weeks_per_month: u32,
    /// Global weeks unlocked without entitlement (the permanent trial sample).
    pub free_weeks: u32,
    /// Days that must elapse since a week was started before the next unlocks.
    pub cooldown_days: i64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            weeks_per_month: 4,
            free_weeks: 1,
            cooldown_days: 7,
        }
    }
}

/// Trial window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrialConfig {
    /// Length of the trial window in days, counted from enrollment start.
    pub trial_days: i64,
    /// Maximum number of path switches permitted within the trial window.
    pub max_switches: u32,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            trial_days: 30,
            max_switches: 1,
        }
    }
}

/// Activity scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    /// Score fraction at or above which a scored activity counts as complete.
    pub pass_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            pass_threshold: 0.8,
        }
    }
}

/// Minimum valid weeks_per_month value.
pub const MIN_WEEKS_PER_MONTH: u32 = 1;

impl ScheduleConfig {
    /// Check if a weeks_per_month value is valid (must be >= 1).
    pub fn is_valid_weeks_per_month(value: u32) -> bool {
        value >= MIN_WEEKS_PER_MONTH
    }

    /// Check if a cooldown_days value is valid (must be non-negative).
    pub fn is_valid_cooldown_days(value: i64) -> bool {
        value >= 0
    }
}

impl ScoringConfig {
    /// Check if a pass_threshold value is valid (must be in [0.0, 1.0] and finite).
    pub fn is_valid_pass_threshold(value: f64) -> bool {
        value.is_finite() && (0.0..=1.0).contains(&value)
    }
}

impl TrialConfig {
    /// Check if a trial_days value is valid (must be >= 1).
    pub fn is_valid_trial_days(value: i64) -> bool {
        value >= 1
    }
}

impl GatingConfig {
    /// Load configuration with the full precedence chain.
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables
    /// 2. User config (`~/.waypoint/config.toml`)
    /// 3. Defaults
    pub fn load() -> Self {
        let mut config = GatingConfig::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        config.apply_env_overrides();
        config
    }

    /// Load user config from `~/.waypoint/config.toml`.
    fn load_user_config() -> Option<GatingConfig> {
        let home = waypoint_home()?;
        let config_path = home.join("config.toml");
        Self::load_from_file(&config_path).ok()
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<GatingConfig> {
        let content = fs::read_to_string(path).map_err(|e| WaypointError::storage(path, e))?;
        toml::from_str(&content).map_err(|e| WaypointError::config(e.to_string()))
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        // WAYPOINT_WEEKS_PER_MONTH
        if let Ok(val) = env::var("WAYPOINT_WEEKS_PER_MONTH") {
            match val.parse::<u32>() {
                Ok(n) => {
                    if ScheduleConfig::is_valid_weeks_per_month(n) {
                        self.schedule.weeks_per_month = n;
                    } else {
                        eprintln!(
                            "Warning: Invalid WAYPOINT_WEEKS_PER_MONTH value '{}'. \
                            Must be >= {}. Using default '{}'.",
                            n, MIN_WEEKS_PER_MONTH, self.schedule.weeks_per_month
                        );
                    }
                }
                Err(_) => eprintln!(
                    "Warning: Invalid WAYPOINT_WEEKS_PER_MONTH value '{}'. \
                    Expected a positive integer. Using default '{}'.",
                    val, self.schedule.weeks_per_month
                ),
            }
        }

        // WAYPOINT_FREE_WEEKS
        if let Ok(val) = env::var("WAYPOINT_FREE_WEEKS") {
            match val.parse::<u32>() {
                Ok(n) => self.schedule.free_weeks = n,
                Err(_) => eprintln!(
                    "Warning: Invalid WAYPOINT_FREE_WEEKS value '{}'. \
                    Expected a non-negative integer. Using default '{}'.",
                    val, self.schedule.free_weeks
                ),
            }
        }

        // WAYPOINT_COOLDOWN_DAYS
        if let Ok(val) = env::var("WAYPOINT_COOLDOWN_DAYS") {
            match val.parse::<i64>() {
                Ok(n) => {
                    if ScheduleConfig::is_valid_cooldown_days(n) {
                        self.schedule.cooldown_days = n;
                    } else {
                        eprintln!(
                            "Warning: Invalid WAYPOINT_COOLDOWN_DAYS value '{}'. \
                            Must be >= 0. Using default '{}'.",
                            n, self.schedule.cooldown_days
                        );
                    }
                }
                Err(_) => eprintln!(
                    "Warning: Invalid WAYPOINT_COOLDOWN_DAYS value '{}'. \
                    Expected a non-negative integer. Using default '{}'.",
                    val, self.schedule.cooldown_days
                ),
            }
        }

        // WAYPOINT_TRIAL_DAYS
        if let Ok(val) = env::var("WAYPOINT_TRIAL_DAYS") {
            match val.parse::<i64>() {
                Ok(n) => {
                    if TrialConfig::is_valid_trial_days(n) {
                        self.trial.trial_days = n;
                    } else {
                        eprintln!(
                            "Warning: Invalid WAYPOINT_TRIAL_DAYS value '{}'. \
                            Must be >= 1. Using default '{}'.",
                            n, self.trial.trial_days
                        );
                    }
                }
                Err(_) => eprintln!(
                    "Warning: Invalid WAYPOINT_TRIAL_DAYS value '{}'. \
                    Expected a positive integer. Using default '{}'.",
                    val, self.trial.trial_days
                ),
            }
        }

        // WAYPOINT_MAX_SWITCHES
        if let Ok(val) = env::var("WAYPOINT_MAX_SWITCHES") {
            match val.parse::<u32>() {
                Ok(n) => self.trial.max_switches = n,
                Err(_) => eprintln!(
                    "Warning: Invalid WAYPOINT_MAX_SWITCHES value '{}'. \
                    Expected a non-negative integer. Using default '{}'.",
                    val, self.trial.max_switches
                ),
            }
        }

        // WAYPOINT_PASS_THRESHOLD
        if let Ok(val) = env::var("WAYPOINT_PASS_THRESHOLD") {
            match val.parse::<f64>() {
                Ok(n) => {
                    if ScoringConfig::is_valid_pass_threshold(n) {
                        self.scoring.pass_threshold = n;
                    } else {
                        eprintln!(
                            "Warning: Invalid WAYPOINT_PASS_THRESHOLD value '{}'. \
                            Must be in range [0.0, 1.0]. Using default '{}'.",
                            n, self.scoring.pass_threshold
                        );
                    }
                }
                Err(_) => eprintln!(
                    "Warning: Invalid WAYPOINT_PASS_THRESHOLD value '{}'. \
                    Expected a decimal number. Using default '{}'.",
                    val, self.scoring.pass_threshold
                ),
            }
        }
    }

    /// Merge another config into this one.
    ///
    /// The `other` config takes precedence. Merging is field-by-field: each
    /// non-default field from `other` is applied to `self`, so a config file
    /// only needs to specify its customizations.
    fn merge(mut self, other: GatingConfig) -> Self {
        let default_schedule = ScheduleConfig::default();
        if other.schedule.weeks_per_month != default_schedule.weeks_per_month {
            self.schedule.weeks_per_month = other.schedule.weeks_per_month;
        }
        if other.schedule.free_weeks != default_schedule.free_weeks {
            self.schedule.free_weeks = other.schedule.free_weeks;
        }
        if other.schedule.cooldown_days != default_schedule.cooldown_days {
            self.schedule.cooldown_days = other.schedule.cooldown_days;
        }

        let default_trial = TrialConfig::default();
        if other.trial.trial_days != default_trial.trial_days {
            self.trial.trial_days = other.trial.trial_days;
        }
        if other.trial.max_switches != default_trial.max_switches {
            self.trial.max_switches = other.trial.max_switches;
        }

        let default_scoring = ScoringConfig::default();
        if (other.scoring.pass_threshold - default_scoring.pass_threshold).abs() > f64::EPSILON {
            self.scoring.pass_threshold = other.scoring.pass_threshold;
        }

        self
    }
}

/// Get the Waypoint home directory.
///
/// Checks `WAYPOINT_HOME` environment variable first, then falls back to
/// `~/.waypoint`.
pub fn waypoint_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("WAYPOINT_HOME") {
        if home.is_empty() {
            tracing::warn!("WAYPOINT_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("WAYPOINT_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    dirs::home_dir().map(|home| home.join(".waypoint"))
}

/// Get the local completion cache directory.
///
/// Returns `<waypoint_home>/completions/`.
pub fn completions_dir() -> Option<PathBuf> {
    waypoint_home().map(|h| h.join("completions"))
}
