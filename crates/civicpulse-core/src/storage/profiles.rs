//! Profile store: engagement records and poll votes.

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::database::{
    format_timestamp, is_constraint_violation, parse_counter, parse_timestamp, Database,
};
use crate::community::validate_text;
use crate::engagement::{record_poll_vote, record_quiz_completion, EngagementState, QuizAttempt};
use crate::error::{DatabaseError, PermissionError, Result, ValidationError};
use crate::poll::Poll;
use crate::profile::Profile;

const PROFILE_COLUMNS: &str = "uid, username, email, bio, points, streak, last_activity_at, quizzes_completed, created_at";

/// Result of applying a quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOutcome {
    pub profile: Profile,
    pub points_awarded: u32,
    pub streak_extended: bool,
}

struct RawProfile {
    uid: String,
    username: String,
    email: String,
    bio: String,
    points: i64,
    streak: i64,
    last_activity_at: Option<String>,
    quizzes_completed: i64,
    created_at: String,
}

impl RawProfile {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            uid: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            bio: row.get(3)?,
            points: row.get(4)?,
            streak: row.get(5)?,
            last_activity_at: row.get(6)?,
            quizzes_completed: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    fn into_profile(self) -> Result<Profile> {
        let uid = self.uid;
        let last_activity_at = self
            .last_activity_at
            .as_deref()
            .map(|raw| parse_timestamp(&uid, "last_activity_at", raw))
            .transpose()?;
        Ok(Profile {
            engagement: EngagementState {
                points: parse_counter(&uid, "points", self.points)?,
                streak: parse_counter(&uid, "streak", self.streak)?,
                last_activity_at,
            },
            quizzes_completed: parse_counter(&uid, "quizzes_completed", self.quizzes_completed)?,
            created_at: parse_timestamp(&uid, "created_at", &self.created_at)?,
            username: self.username,
            email: self.email,
            bio: self.bio,
            uid,
        })
    }
}

pub(super) fn read_profile(conn: &Connection, uid: &str) -> Result<Profile> {
    let raw = conn
        .query_row(
            &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE uid = ?1"),
            params![uid],
            RawProfile::from_row,
        )
        .optional()?
        .ok_or_else(|| DatabaseError::not_found("profile", uid))?;
    raw.into_profile()
}

fn write_engagement(conn: &Connection, profile: &Profile) -> Result<()> {
    conn.execute(
        "UPDATE profiles
         SET points = ?2, streak = ?3, last_activity_at = ?4, quizzes_completed = ?5
         WHERE uid = ?1",
        params![
            profile.uid,
            profile.engagement.points,
            profile.engagement.streak,
            profile.engagement.last_activity_at.as_ref().map(format_timestamp),
            profile.quizzes_completed,
        ],
    )?;
    Ok(())
}

impl Database {
    /// Create the profile on first sign-in; return the existing one otherwise.
    pub fn create_profile_if_missing(
        &self,
        uid: &str,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Profile> {
        let uid = validate_text("uid", uid)?;
        let (profile, created) = self.write("create profile", |tx| {
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO profiles (uid, username, email, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![uid, self.default_username(), email, format_timestamp(&now)],
            )?;
            Ok((read_profile(tx, &uid)?, inserted == 1))
        })?;
        if created {
            tracing::info!(uid = %profile.uid, "created profile");
            self.feed().publish(&profile);
        }
        Ok(profile)
    }

    /// # Errors
    /// [`DatabaseError::NotFound`] when no profile exists for `uid`.
    pub fn profile(&self, uid: &str) -> Result<Profile> {
        read_profile(self.conn(), uid)
    }

    pub fn update_username(&self, uid: &str, username: &str) -> Result<Profile> {
        let username = validate_text("username", username)?;
        self.update_text_fields(uid, Some(&username), None)
    }

    /// An empty bio is allowed.
    pub fn update_bio(&self, uid: &str, bio: &str) -> Result<Profile> {
        self.update_text_fields(uid, None, Some(bio.trim()))
    }

    pub fn update_profile(&self, uid: &str, username: &str, bio: &str) -> Result<Profile> {
        let username = validate_text("username", username)?;
        self.update_text_fields(uid, Some(&username), Some(bio.trim()))
    }

    fn update_text_fields(
        &self,
        uid: &str,
        username: Option<&str>,
        bio: Option<&str>,
    ) -> Result<Profile> {
        let profile = self.write("update profile", |tx| {
            let changed = tx.execute(
                "UPDATE profiles
                 SET username = COALESCE(?2, username), bio = COALESCE(?3, bio)
                 WHERE uid = ?1",
                params![uid, username, bio],
            )?;
            if changed == 0 {
                return Err(DatabaseError::not_found("profile", uid).into());
            }
            read_profile(tx, uid)
        })?;
        self.feed().publish(&profile);
        Ok(profile)
    }

    /// Apply a quiz attempt observed at `now` in the caller's local zone.
    ///
    /// Incorrect attempts are not written at all. Correct ones are applied
    /// as one read-modify-write on the stored snapshot.
    pub fn apply_quiz_attempt<Tz: TimeZone>(
        &self,
        uid: &str,
        attempt: &QuizAttempt,
        now: &DateTime<Tz>,
    ) -> Result<QuizOutcome> {
        if !attempt.is_correct {
            tracing::debug!(uid, quiz = %attempt.quiz_id, "incorrect attempt, nothing to award");
            return Ok(QuizOutcome {
                profile: self.profile(uid)?,
                points_awarded: 0,
                streak_extended: false,
            });
        }

        let outcome = self.write("quiz award", |tx| {
            let mut profile = read_profile(tx, uid)?;
            let before = profile.engagement.clone();
            profile.engagement = record_quiz_completion(&before, attempt, now);
            profile.quizzes_completed = profile.quizzes_completed.saturating_add(1);
            write_engagement(tx, &profile)?;
            Ok(QuizOutcome {
                points_awarded: profile.engagement.points - before.points,
                streak_extended: profile.engagement.streak > before.streak,
                profile,
            })
        })?;

        tracing::info!(
            uid,
            quiz = %attempt.quiz_id,
            points = outcome.profile.engagement.points,
            streak = outcome.profile.engagement.streak,
            "quiz reward applied"
        );
        self.feed().publish(&outcome.profile);
        Ok(outcome)
    }

    /// Record a vote and award its points in one transaction.
    ///
    /// # Errors
    /// - [`ValidationError::UnknownOption`] if `option_id` is not offered.
    /// - [`PermissionError::AlreadyVoted`] if `uid` already voted in `poll`;
    ///   no points are awarded in that case.
    pub fn apply_poll_vote(
        &self,
        uid: &str,
        poll: &Poll,
        option_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Profile> {
        if !poll.has_option(option_id) {
            return Err(ValidationError::UnknownOption {
                parent: poll.id.clone(),
                option: option_id.to_string(),
            }
            .into());
        }

        let profile = self.write("poll vote", |tx| {
            let mut profile = read_profile(tx, uid)?;
            let inserted = tx.execute(
                "INSERT INTO poll_votes (uid, poll_id, option_id, voted_at) VALUES (?1, ?2, ?3, ?4)",
                params![uid, poll.id, option_id, format_timestamp(&now)],
            );
            match inserted {
                Ok(_) => {}
                Err(err) if is_constraint_violation(&err) => {
                    return Err(PermissionError::AlreadyVoted {
                        poll_id: poll.id.clone(),
                    }
                    .into());
                }
                Err(err) => return Err(err.into()),
            }
            profile.engagement = record_poll_vote(&profile.engagement);
            write_engagement(tx, &profile)?;
            Ok(profile)
        })?;

        tracing::info!(uid, poll = %poll.id, points = profile.engagement.points, "poll vote recorded");
        self.feed().publish(&profile);
        Ok(profile)
    }

    /// Option the identity picked in `poll_id`, if it voted.
    pub fn voted_option(&self, uid: &str, poll_id: &str) -> Result<Option<String>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT option_id FROM poll_votes WHERE uid = ?1 AND poll_id = ?2",
                params![uid, poll_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// `poll` with stored votes added to its base tallies.
    pub fn poll_tally(&self, poll: &Poll) -> Result<Poll> {
        let mut stmt = self.conn().prepare(
            "SELECT option_id, COUNT(*) FROM poll_votes WHERE poll_id = ?1 GROUP BY option_id",
        )?;
        let rows = stmt.query_map(params![poll.id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut tallied = poll.clone();
        for row in rows {
            let (option_id, count) = row?;
            if let Some(option) = tallied.options.iter_mut().find(|o| o.id == option_id) {
                option.votes += u64::try_from(count).unwrap_or(0);
            }
        }
        Ok(tallied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::engagement::PermissionTier;
    use crate::error::CoreError;
    use chrono::FixedOffset;

    fn ist(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(5 * 3600 + 1800)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
    }

    fn correct(quiz_id: &str) -> QuizAttempt {
        let catalog = Catalog::builtin();
        catalog.find_quiz(quiz_id).unwrap().attempt(Some("a".into()), 5)
    }

    fn setup() -> Database {
        let db = Database::open_memory().unwrap();
        db.create_profile_if_missing("u1", "u1@example.com", Utc::now()).unwrap();
        db
    }

    #[test]
    fn create_is_idempotent() {
        let db = setup();
        db.apply_poll_vote("u1", &Catalog::builtin().polls[0], "a", Utc::now()).unwrap();
        let again = db.create_profile_if_missing("u1", "other@example.com", Utc::now()).unwrap();
        assert_eq!(again.email, "u1@example.com");
        assert_eq!(again.username, "Civic Learner");
        assert_eq!(again.engagement.points, 3);
    }

    #[test]
    fn missing_profile_is_not_found() {
        let db = Database::open_memory().unwrap();
        assert!(matches!(
            db.profile("ghost"),
            Err(CoreError::Database(DatabaseError::NotFound { .. }))
        ));
        assert!(db.update_bio("ghost", "hi").is_err());
    }

    #[test]
    fn update_text_fields() {
        let db = setup();
        db.update_username("u1", "  Asha ").unwrap();
        let profile = db.update_bio("u1", "Civics nerd").unwrap();
        assert_eq!(profile.username, "Asha");
        assert_eq!(profile.bio, "Civics nerd");

        let profile = db.update_profile("u1", "Ravi", "").unwrap();
        assert_eq!(profile.username, "Ravi");
        assert_eq!(profile.bio, "");

        assert!(db.update_username("u1", "  ").is_err());
        assert_eq!(db.profile("u1").unwrap().username, "Ravi");
    }

    #[test]
    fn quiz_awards_and_streaks() {
        let db = setup();
        let first = db.apply_quiz_attempt("u1", &correct("q1"), &ist(2026, 3, 1, 9, 0)).unwrap();
        assert_eq!(first.points_awarded, 5);
        assert!(first.streak_extended);

        let second = db.apply_quiz_attempt("u1", &correct("q3"), &ist(2026, 3, 1, 20, 0)).unwrap();
        assert_eq!(second.profile.engagement.points, 10);
        assert_eq!(second.profile.engagement.streak, 1);
        assert!(!second.streak_extended);

        let third = db.apply_quiz_attempt("u1", &correct("q1"), &ist(2026, 3, 2, 0, 1)).unwrap();
        assert_eq!(third.profile.engagement.streak, 2);
        assert_eq!(third.profile.quizzes_completed, 3);
    }

    #[test]
    fn incorrect_quiz_leaves_profile_untouched() {
        let db = setup();
        let before = db.profile("u1").unwrap();
        let wrong = Catalog::builtin().find_quiz("q2").unwrap().attempt(Some("a".into()), 3);
        let outcome = db.apply_quiz_attempt("u1", &wrong, &ist(2026, 3, 1, 9, 0)).unwrap();
        assert_eq!(outcome.points_awarded, 0);
        assert_eq!(outcome.profile, before);
        assert_eq!(db.profile("u1").unwrap(), before);
    }

    #[test]
    fn poll_vote_is_at_most_once() {
        let db = setup();
        let poll = Catalog::builtin().polls[0].clone();
        let profile = db.apply_poll_vote("u1", &poll, "a", Utc::now()).unwrap();
        assert_eq!(profile.engagement.points, 3);
        assert_eq!(profile.engagement.streak, 0);

        let err = db.apply_poll_vote("u1", &poll, "b", Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::Permission(PermissionError::AlreadyVoted { .. })));
        assert_eq!(db.profile("u1").unwrap().engagement.points, 3);
        assert_eq!(db.voted_option("u1", &poll.id).unwrap().as_deref(), Some("a"));
    }

    #[test]
    fn poll_vote_rejects_unknown_option() {
        let db = setup();
        let poll = Catalog::builtin().polls[0].clone();
        let err = db.apply_poll_vote("u1", &poll, "zzz", Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::UnknownOption { .. })));
        assert_eq!(db.voted_option("u1", &poll.id).unwrap(), None);
    }

    #[test]
    fn poll_vote_without_profile_records_nothing() {
        let db = Database::open_memory().unwrap();
        let poll = Catalog::builtin().polls[0].clone();
        assert!(db.apply_poll_vote("ghost", &poll, "a", Utc::now()).is_err());
        assert_eq!(db.voted_option("ghost", &poll.id).unwrap(), None);
    }

    #[test]
    fn tally_adds_stored_votes() {
        let db = setup();
        db.create_profile_if_missing("u2", "", Utc::now()).unwrap();
        let poll = Catalog::builtin().polls[0].clone();
        db.apply_poll_vote("u1", &poll, "a", Utc::now()).unwrap();
        db.apply_poll_vote("u2", &poll, "b", Utc::now()).unwrap();
        let tally = db.poll_tally(&poll).unwrap();
        assert_eq!(tally.options[0].votes, 11);
        assert_eq!(tally.options[1].votes, 6);
        assert_eq!(tally.total_votes(), 17);
    }

    #[test]
    fn vote_at_seventeen_unlocks_discussions() {
        let db = setup();
        db.conn()
            .execute("UPDATE profiles SET points = 17 WHERE uid = 'u1'", [])
            .unwrap();
        let poll = Catalog::builtin().polls[0].clone();
        let profile = db.apply_poll_vote("u1", &poll, "a", Utc::now()).unwrap();
        assert_eq!(profile.engagement.points, 20);
        assert_eq!(profile.permission_tier(), PermissionTier::Discuss);
    }

    #[test]
    fn negative_points_are_rejected_on_read() {
        let db = setup();
        db.conn()
            .execute("UPDATE profiles SET points = -3 WHERE uid = 'u1'", [])
            .unwrap();
        assert!(matches!(
            db.profile("u1"),
            Err(CoreError::Database(DatabaseError::CorruptRecord { field: "points", .. }))
        ));
    }

    #[test]
    fn writes_publish_snapshots() {
        let db = setup();
        let sub = db.subscribe("u1").unwrap();
        assert_eq!(sub.current().unwrap().engagement.points, 0);
        db.apply_quiz_attempt("u1", &correct("q1"), &Utc::now()).unwrap();
        assert_eq!(sub.current().unwrap().engagement.points, 5);
    }
}
