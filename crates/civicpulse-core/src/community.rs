//! Discussion threads, comments and moderation reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Reason recorded when a report does not give one.
pub const DEFAULT_REPORT_REASON: &str = "Inappropriate content";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discussion {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_uid: String,
    pub author_username: String,
    pub comment_count: u32,
    pub views: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub discussion_id: String,
    pub author_uid: String,
    pub author_username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub discussion_id: String,
    pub reported_by: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// Trim `value` and reject it if nothing is left.
pub fn validate_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}

/// Compact relative age: "Just now", "5m", "3h", "2d".
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(then);
    let minutes = diff.num_minutes();
    let hours = diff.num_hours();
    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m")
    } else if hours < 24 {
        format!("{hours}h")
    } else {
        format!("{}d", diff.num_days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn time_ago_buckets() {
        let now = Utc::now();
        assert_eq!(time_ago(now - Duration::seconds(30), now), "Just now");
        assert_eq!(time_ago(now - Duration::minutes(5), now), "5m");
        assert_eq!(time_ago(now - Duration::minutes(59), now), "59m");
        assert_eq!(time_ago(now - Duration::hours(3), now), "3h");
        assert_eq!(time_ago(now - Duration::hours(49), now), "2d");
    }

    #[test]
    fn future_timestamps_read_as_just_now() {
        let now = Utc::now();
        assert_eq!(time_ago(now + Duration::minutes(10), now), "Just now");
    }

    #[test]
    fn validate_text_trims() {
        assert_eq!(validate_text("title", "  Turnout  ").unwrap(), "Turnout");
        assert_eq!(
            validate_text("title", "   ").unwrap_err(),
            ValidationError::EmptyField("title")
        );
    }
}
