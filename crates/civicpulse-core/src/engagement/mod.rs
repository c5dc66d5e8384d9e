//! Engagement scoring engine.
//!
//! Pure functions only: level, permission tier and the activity transitions
//! over [`EngagementState`]. No I/O, no clocks (callers pass `now`), no
//! shared state, so any number of callers may use it concurrently.

mod rules;
mod scoring;
mod state;
mod unlocks;

pub use rules::{
    check_permission, compute_level, compute_permission_tier, ContentAction, PermissionTier,
    COMMENT_THRESHOLD, DISCUSS_THRESHOLD, LEVEL_DIVISOR, POLL_REWARD, QUIZ_REWARD,
};
pub use scoring::{is_same_calendar_day, record_poll_vote, record_quiz_completion};
pub use state::{EngagementState, PollVote, QuizAttempt};
pub use unlocks::{next_unlock, unlocked_features, Feature, UnlockRequirement};
