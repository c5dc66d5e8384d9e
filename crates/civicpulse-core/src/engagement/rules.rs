//! Canonical scoring constants and the pure derivations built on them.
//!
//! Level and permission tier are always derived from points through the two
//! functions in this module. Nothing else compares points against a
//! threshold.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PermissionError;

/// Points per level.
pub const LEVEL_DIVISOR: u32 = 10;

/// Minimum points for the [`PermissionTier::Comment`] tier.
pub const COMMENT_THRESHOLD: u32 = 5;

/// Minimum points for the [`PermissionTier::Discuss`] tier.
pub const DISCUSS_THRESHOLD: u32 = 20;

/// Points awarded for a correctly answered quiz.
pub const QUIZ_REWARD: u32 = 5;

/// Points awarded for a poll vote.
pub const POLL_REWARD: u32 = 3;

const _: () = assert!(LEVEL_DIVISOR > 0);
const _: () = assert!(COMMENT_THRESHOLD <= DISCUSS_THRESHOLD);

/// Community content-creation rights, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionTier {
    Locked,
    Comment,
    Discuss,
}

impl PermissionTier {
    pub fn can_comment(self) -> bool {
        self >= PermissionTier::Comment
    }

    pub fn can_discuss(self) -> bool {
        self >= PermissionTier::Discuss
    }

    /// Points needed to reach this tier.
    pub const fn threshold(self) -> u32 {
        match self {
            PermissionTier::Locked => 0,
            PermissionTier::Comment => COMMENT_THRESHOLD,
            PermissionTier::Discuss => DISCUSS_THRESHOLD,
        }
    }
}

/// Content creation gated by [`PermissionTier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentAction {
    /// Replying to an existing discussion.
    Comment,
    /// Starting a new discussion thread.
    Discuss,
}

impl ContentAction {
    pub const fn required_tier(self) -> PermissionTier {
        match self {
            ContentAction::Comment => PermissionTier::Comment,
            ContentAction::Discuss => PermissionTier::Discuss,
        }
    }
}

impl fmt::Display for ContentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentAction::Comment => f.write_str("commenting"),
            ContentAction::Discuss => f.write_str("starting a discussion"),
        }
    }
}

/// `floor(points / LEVEL_DIVISOR) + 1`.
pub fn compute_level(points: u32) -> u32 {
    points / LEVEL_DIVISOR + 1
}

pub fn compute_permission_tier(points: u32) -> PermissionTier {
    if points >= DISCUSS_THRESHOLD {
        PermissionTier::Discuss
    } else if points >= COMMENT_THRESHOLD {
        PermissionTier::Comment
    } else {
        PermissionTier::Locked
    }
}

/// Check that `points` grants the tier `action` needs.
///
/// # Errors
/// Returns [`PermissionError::InsufficientTier`] when the derived tier is
/// below the required one.
pub fn check_permission(points: u32, action: ContentAction) -> Result<(), PermissionError> {
    let actual = compute_permission_tier(points);
    let required = action.required_tier();
    if actual >= required {
        Ok(())
    } else {
        Err(PermissionError::InsufficientTier {
            action,
            required,
            actual,
            points,
        })
    }
}
