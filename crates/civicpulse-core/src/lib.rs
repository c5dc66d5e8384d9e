//! # CivicPulse Core Library
//!
//! Engagement scoring and permission tiers for a civic-learning app.
//! Members earn points by answering quizzes and voting in polls, points
//! determine a level and a permission tier, and the tier gates what they
//! may post in the community. The `civicpulse` CLI is a thin layer over
//! this crate.
//!
//! ## Architecture
//!
//! - **Engagement**: pure scoring functions over [`EngagementState`]
//! - **Storage**: SQLite profile and content store with transactional
//!   read-modify-write, plus TOML configuration
//! - **Feed**: live profile snapshots pushed to subscribers after each commit
//! - **Catalog / Pulse**: the quizzes and polls on offer, and the daily pick
//!
//! ## Key Components
//!
//! - [`Database`]: profile and community persistence
//! - [`Config`]: application configuration management
//! - [`ProfileFeed`]: change notifications keyed by identity

pub mod catalog;
pub mod community;
pub mod engagement;
pub mod error;
pub mod feed;
pub mod poll;
pub mod profile;
pub mod pulse;
pub mod quiz;
pub mod storage;

pub use catalog::Catalog;
pub use community::{Comment, Discussion, Report};
pub use engagement::{
    check_permission, compute_level, compute_permission_tier, next_unlock, record_poll_vote,
    record_quiz_completion, unlocked_features, ContentAction, EngagementState, Feature,
    PermissionTier, PollVote, QuizAttempt, UnlockRequirement,
};
pub use error::{ConfigError, CoreError, DatabaseError, PermissionError, ValidationError};
pub use feed::{ProfileFeed, Subscription};
pub use poll::Poll;
pub use profile::{Profile, ProfileView};
pub use pulse::{choose_pulse, CivicPulse, PulseSelector};
pub use quiz::Quiz;
pub use storage::{Config, Database, QuizOutcome, RetryPolicy};
