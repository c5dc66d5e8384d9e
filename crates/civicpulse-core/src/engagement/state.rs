//! Engagement state and the activity records that drive it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rules::{compute_level, compute_permission_tier, PermissionTier};

/// Per-identity engagement counters.
///
/// Level and permission tier are not fields: they are recomputed from
/// `points` on every access so a stale stored value can never win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementState {
    pub points: u32,
    pub streak: u32,
    pub last_activity_at: Option<DateTime<Utc>>,
}

impl EngagementState {
    pub fn new(points: u32, streak: u32, last_activity_at: Option<DateTime<Utc>>) -> Self {
        Self {
            points,
            streak,
            last_activity_at,
        }
    }

    pub fn level(&self) -> u32 {
        compute_level(self.points)
    }

    pub fn permission_tier(&self) -> PermissionTier {
        compute_permission_tier(self.points)
    }
}

/// Outcome of answering a single quiz question. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub quiz_id: String,
    /// `None` when the timer ran out before anything was selected.
    pub selected_option: Option<String>,
    pub is_correct: bool,
    pub elapsed_secs: u32,
    pub time_limit_secs: u32,
}

impl QuizAttempt {
    pub fn timed_out(&self) -> bool {
        self.elapsed_secs >= self.time_limit_secs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollVote {
    pub poll_id: String,
    pub option_id: String,
}
