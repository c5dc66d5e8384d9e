//! User profile record as held by the profile store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engagement::{next_unlock, unlocked_features, EngagementState, Feature, PermissionTier};

/// Username given to new profiles.
pub const DEFAULT_USERNAME: &str = "Civic Learner";

/// Persisted profile. Level and tier are derived, see [`ProfileView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub uid: String,
    pub username: String,
    pub email: String,
    pub bio: String,
    #[serde(flatten)]
    pub engagement: EngagementState,
    pub quizzes_completed: u32,
    pub created_at: DateTime<Utc>,
}

/// Profile plus everything derived from its points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub profile: Profile,
    pub level: u32,
    pub permission_tier: PermissionTier,
    pub unlocked_features: Vec<Feature>,
    pub next_unlock: Option<String>,
}

impl Profile {
    pub fn new(uid: impl Into<String>, email: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            uid: uid.into(),
            username: DEFAULT_USERNAME.to_string(),
            email: email.into(),
            bio: String::new(),
            engagement: EngagementState::default(),
            quizzes_completed: 0,
            created_at,
        }
    }

    pub fn level(&self) -> u32 {
        self.engagement.level()
    }

    pub fn permission_tier(&self) -> PermissionTier {
        self.engagement.permission_tier()
    }

    pub fn view(&self) -> ProfileView {
        let points = self.engagement.points;
        ProfileView {
            profile: self.clone(),
            level: self.level(),
            permission_tier: self.permission_tier(),
            unlocked_features: unlocked_features(points),
            next_unlock: next_unlock(points).map(|req| req.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_profile_defaults() {
        let profile = Profile::new("u1", "a@example.com", Utc::now());
        assert_eq!(profile.username, DEFAULT_USERNAME);
        assert_eq!(profile.engagement, EngagementState::default());
        assert_eq!(profile.level(), 1);
    }

    #[test]
    fn view_derives_from_points() {
        let mut profile = Profile::new("u1", "", Utc::now());
        profile.engagement.points = 12;
        let view = profile.view();
        assert_eq!(view.level, 2);
        assert_eq!(view.permission_tier, PermissionTier::Comment);
        assert_eq!(view.unlocked_features, vec![Feature::Comments]);
        assert_eq!(view.next_unlock.as_deref(), Some("Earn 20 points to unlock discussions"));
    }

    #[test]
    fn view_serializes_flat() {
        let profile = Profile::new("u1", "", Utc::now());
        let json = serde_json::to_value(profile.view()).unwrap();
        assert_eq!(json["uid"], "u1");
        assert_eq!(json["points"], 0);
        assert_eq!(json["permission_tier"], "locked");
    }
}
