//! Unlock guidance shown next to a profile.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::rules::{compute_permission_tier, PermissionTier};

/// Community feature unlocked by reaching a permission tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Comments,
    Discussions,
}

impl Feature {
    pub const fn tier(self) -> PermissionTier {
        match self {
            Feature::Comments => PermissionTier::Comment,
            Feature::Discussions => PermissionTier::Discuss,
        }
    }

    fn noun(self) -> &'static str {
        match self {
            Feature::Comments => "comments",
            Feature::Discussions => "discussions",
        }
    }
}

const FEATURES: [Feature; 2] = [Feature::Comments, Feature::Discussions];

/// The next feature still locked and the points total that unlocks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockRequirement {
    pub feature: Feature,
    pub points_required: u32,
    pub points_remaining: u32,
}

impl fmt::Display for UnlockRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Earn {} points to unlock {}",
            self.points_required,
            self.feature.noun()
        )
    }
}

pub fn unlocked_features(points: u32) -> Vec<Feature> {
    let tier = compute_permission_tier(points);
    FEATURES
        .into_iter()
        .filter(|feature| tier >= feature.tier())
        .collect()
}

/// `None` once every feature is unlocked.
pub fn next_unlock(points: u32) -> Option<UnlockRequirement> {
    let tier = compute_permission_tier(points);
    FEATURES
        .into_iter()
        .find(|feature| tier < feature.tier())
        .map(|feature| {
            let required = feature.tier().threshold();
            UnlockRequirement {
                feature,
                points_required: required,
                points_remaining: required - points,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_unlocked_at_zero() {
        assert!(unlocked_features(0).is_empty());
        let next = next_unlock(0).unwrap();
        assert_eq!(next.feature, Feature::Comments);
        assert_eq!(next.points_remaining, 5);
        assert_eq!(next.to_string(), "Earn 5 points to unlock comments");
    }

    #[test]
    fn comments_then_discussions() {
        assert_eq!(unlocked_features(5), vec![Feature::Comments]);
        let next = next_unlock(12).unwrap();
        assert_eq!(next.feature, Feature::Discussions);
        assert_eq!(next.points_remaining, 8);
        assert_eq!(next.to_string(), "Earn 20 points to unlock discussions");
    }

    #[test]
    fn everything_unlocked_at_discuss_threshold() {
        assert_eq!(
            unlocked_features(20),
            vec![Feature::Comments, Feature::Discussions]
        );
        assert_eq!(next_unlock(20), None);
    }
}
