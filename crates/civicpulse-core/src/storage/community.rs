//! Content store: discussions, comments and reports.
//!
//! Creation rights come from the author's stored points, read inside the
//! same transaction as the insert.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::database::{format_timestamp, parse_counter, parse_timestamp, Database};
use super::profiles::read_profile;
use crate::community::{validate_text, Comment, Discussion, Report, DEFAULT_REPORT_REASON};
use crate::engagement::{check_permission, ContentAction};
use crate::error::{DatabaseError, PermissionError, Result};

const DISCUSSION_COLUMNS: &str =
    "id, title, content, author_uid, author_username, comment_count, views, created_at";

struct RawDiscussion {
    id: String,
    title: String,
    content: String,
    author_uid: String,
    author_username: String,
    comment_count: i64,
    views: i64,
    created_at: String,
}

impl RawDiscussion {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            author_uid: row.get(3)?,
            author_username: row.get(4)?,
            comment_count: row.get(5)?,
            views: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn into_discussion(self) -> Result<Discussion> {
        Ok(Discussion {
            comment_count: parse_counter(&self.id, "comment_count", self.comment_count)?,
            views: parse_counter(&self.id, "views", self.views)?,
            created_at: parse_timestamp(&self.id, "created_at", &self.created_at)?,
            title: self.title,
            content: self.content,
            author_uid: self.author_uid,
            author_username: self.author_username,
            id: self.id,
        })
    }
}

fn read_discussion(conn: &Connection, id: &str) -> Result<Discussion> {
    conn.query_row(
        &format!("SELECT {DISCUSSION_COLUMNS} FROM discussions WHERE id = ?1"),
        params![id],
        RawDiscussion::from_row,
    )
    .optional()?
    .ok_or_else(|| DatabaseError::not_found("discussion", id))?
    .into_discussion()
}

impl Database {
    /// Start a discussion. Requires the Discuss tier.
    pub fn create_discussion(
        &self,
        uid: &str,
        title: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Discussion> {
        let title = validate_text("title", title)?;
        let content = validate_text("content", content)?;

        let discussion = self.write("create discussion", |tx| {
            let author = read_profile(tx, uid)?;
            check_permission(author.engagement.points, ContentAction::Discuss)?;
            let discussion = Discussion {
                id: Uuid::new_v4().to_string(),
                title: title.clone(),
                content: content.clone(),
                author_uid: author.uid,
                author_username: author.username,
                comment_count: 0,
                views: 0,
                created_at: now,
            };
            tx.execute(
                "INSERT INTO discussions (id, title, content, author_uid, author_username, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    discussion.id,
                    discussion.title,
                    discussion.content,
                    discussion.author_uid,
                    discussion.author_username,
                    format_timestamp(&discussion.created_at),
                ],
            )?;
            Ok(discussion)
        })?;

        tracing::info!(uid, id = %discussion.id, "discussion created");
        Ok(discussion)
    }

    /// Reply to a discussion. Requires the Comment tier.
    pub fn add_comment(
        &self,
        uid: &str,
        discussion_id: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Comment> {
        let text = validate_text("text", text)?;

        let comment = self.write("add comment", |tx| {
            let author = read_profile(tx, uid)?;
            check_permission(author.engagement.points, ContentAction::Comment)?;
            let comment = Comment {
                id: Uuid::new_v4().to_string(),
                discussion_id: discussion_id.to_string(),
                author_uid: author.uid,
                author_username: author.username,
                text: text.clone(),
                created_at: now,
            };
            let bumped = tx.execute(
                "UPDATE discussions SET comment_count = comment_count + 1 WHERE id = ?1",
                params![discussion_id],
            )?;
            if bumped == 0 {
                return Err(DatabaseError::not_found("discussion", discussion_id).into());
            }
            tx.execute(
                "INSERT INTO comments (id, discussion_id, author_uid, author_username, text, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    comment.id,
                    comment.discussion_id,
                    comment.author_uid,
                    comment.author_username,
                    comment.text,
                    format_timestamp(&comment.created_at),
                ],
            )?;
            Ok(comment)
        })?;

        tracing::info!(uid, discussion = discussion_id, "comment added");
        Ok(comment)
    }

    pub fn discussion(&self, id: &str) -> Result<Discussion> {
        read_discussion(self.conn(), id)
    }

    /// Newest first.
    pub fn list_discussions(&self) -> Result<Vec<Discussion>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {DISCUSSION_COLUMNS} FROM discussions ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt.query_map([], RawDiscussion::from_row)?;
        let mut discussions = Vec::new();
        for row in rows {
            discussions.push(row?.into_discussion()?);
        }
        Ok(discussions)
    }

    /// Oldest first.
    pub fn list_comments(&self, discussion_id: &str) -> Result<Vec<Comment>> {
        read_discussion(self.conn(), discussion_id)?;
        let mut stmt = self.conn().prepare(
            "SELECT id, discussion_id, author_uid, author_username, text, created_at
             FROM comments WHERE discussion_id = ?1
             ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![discussion_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut comments = Vec::new();
        for row in rows {
            let (id, discussion_id, author_uid, author_username, text, created_at) = row?;
            let created_at = parse_timestamp(&id, "created_at", &created_at)?;
            comments.push(Comment {
                id,
                discussion_id,
                author_uid,
                author_username,
                text,
                created_at,
            });
        }
        Ok(comments)
    }

    /// Delete a discussion and its comments. Only the author may do this.
    pub fn delete_discussion(&self, uid: &str, id: &str) -> Result<()> {
        self.write("delete discussion", |tx| {
            let discussion = read_discussion(tx, id)?;
            if discussion.author_uid != uid {
                return Err(PermissionError::NotAuthor { id: id.to_string() }.into());
            }
            tx.execute("DELETE FROM comments WHERE discussion_id = ?1", params![id])?;
            tx.execute("DELETE FROM discussions WHERE id = ?1", params![id])?;
            Ok(())
        })?;
        tracing::info!(uid, id, "discussion deleted");
        Ok(())
    }

    /// File a moderation report. Open to every tier.
    pub fn report_discussion(
        &self,
        uid: &str,
        discussion_id: &str,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Report> {
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REPORT_REASON)
            .to_string();

        let report = self.write("report discussion", |tx| {
            read_discussion(tx, discussion_id)?;
            let report = Report {
                id: Uuid::new_v4().to_string(),
                discussion_id: discussion_id.to_string(),
                reported_by: uid.to_string(),
                reason: reason.clone(),
                created_at: now,
            };
            tx.execute(
                "INSERT INTO reports (id, discussion_id, reported_by, reason, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    report.id,
                    report.discussion_id,
                    report.reported_by,
                    report.reason,
                    format_timestamp(&report.created_at),
                ],
            )?;
            Ok(report)
        })?;

        tracing::warn!(uid, discussion = discussion_id, reason = %report.reason, "discussion reported");
        Ok(report)
    }

    pub fn reports_for(&self, discussion_id: &str) -> Result<Vec<Report>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, discussion_id, reported_by, reason, created_at
             FROM reports WHERE discussion_id = ?1 ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![discussion_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut reports = Vec::new();
        for row in rows {
            let (id, discussion_id, reported_by, reason, created_at) = row?;
            let created_at = parse_timestamp(&id, "created_at", &created_at)?;
            reports.push(Report {
                id,
                discussion_id,
                reported_by,
                reason,
                created_at,
            });
        }
        Ok(reports)
    }

    pub fn record_view(&self, id: &str) -> Result<()> {
        self.write("record view", |tx| {
            let changed = tx.execute(
                "UPDATE discussions SET views = views + 1 WHERE id = ?1",
                params![id],
            )?;
            if changed == 0 {
                return Err(DatabaseError::not_found("discussion", id).into());
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engagement::PermissionTier;
    use crate::error::CoreError;
    use chrono::Duration;

    fn db_with(points: &[(&str, u32)]) -> Database {
        let db = Database::open_memory().unwrap();
        for (uid, pts) in points {
            db.create_profile_if_missing(uid, "", Utc::now()).unwrap();
            db.conn()
                .execute("UPDATE profiles SET points = ?2 WHERE uid = ?1", params![uid, pts])
                .unwrap();
        }
        db
    }

    #[test]
    fn discussion_requires_discuss_tier() {
        let db = db_with(&[("low", 19), ("high", 20)]);
        let err = db.create_discussion("low", "Turnout", "Why so low?", Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Permission(PermissionError::InsufficientTier {
                actual: PermissionTier::Comment,
                ..
            })
        ));
        let d = db.create_discussion("high", " Turnout ", "Why so low?", Utc::now()).unwrap();
        assert_eq!(d.title, "Turnout");
        assert_eq!(d.author_username, "Civic Learner");
    }

    #[test]
    fn comment_requires_comment_tier_and_bumps_count() {
        let db = db_with(&[("author", 25), ("locked", 4), ("commenter", 5)]);
        let d = db.create_discussion("author", "Budget", "Thoughts?", Utc::now()).unwrap();

        assert!(matches!(
            db.add_comment("locked", &d.id, "hi", Utc::now()),
            Err(CoreError::Permission(_))
        ));
        db.add_comment("commenter", &d.id, "Agree", Utc::now()).unwrap();
        db.add_comment("author", &d.id, "Thanks", Utc::now() + Duration::seconds(1)).unwrap();

        assert_eq!(db.discussion(&d.id).unwrap().comment_count, 2);
        let texts: Vec<_> = db.list_comments(&d.id).unwrap().into_iter().map(|c| c.text).collect();
        assert_eq!(texts, vec!["Agree", "Thanks"]);
    }

    #[test]
    fn comment_on_missing_discussion_fails_cleanly() {
        let db = db_with(&[("commenter", 5)]);
        assert!(matches!(
            db.add_comment("commenter", "nope", "hello", Utc::now()),
            Err(CoreError::Database(DatabaseError::NotFound { .. }))
        ));
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn empty_text_is_rejected() {
        let db = db_with(&[("author", 25)]);
        assert!(matches!(
            db.create_discussion("author", "  ", "body", Utc::now()),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn discussions_list_newest_first() {
        let db = db_with(&[("author", 25)]);
        let now = Utc::now();
        db.create_discussion("author", "Old", "a", now - Duration::hours(2)).unwrap();
        db.create_discussion("author", "New", "b", now).unwrap();
        let titles: Vec<_> = db.list_discussions().unwrap().into_iter().map(|d| d.title).collect();
        assert_eq!(titles, vec!["New", "Old"]);
    }

    #[test]
    fn only_author_deletes() {
        let db = db_with(&[("author", 25), ("other", 25)]);
        let d = db.create_discussion("author", "Mine", "body", Utc::now()).unwrap();
        db.add_comment("other", &d.id, "reply", Utc::now()).unwrap();

        assert!(matches!(
            db.delete_discussion("other", &d.id),
            Err(CoreError::Permission(PermissionError::NotAuthor { .. }))
        ));
        db.delete_discussion("author", &d.id).unwrap();
        assert!(db.list_discussions().unwrap().is_empty());
        assert!(db.list_comments(&d.id).is_err());
    }

    #[test]
    fn reports_default_reason() {
        let db = db_with(&[("author", 25), ("locked", 0)]);
        let d = db.create_discussion("author", "Topic", "body", Utc::now()).unwrap();
        let r = db.report_discussion("locked", &d.id, None, Utc::now()).unwrap();
        assert_eq!(r.reason, DEFAULT_REPORT_REASON);
        db.report_discussion("locked", &d.id, Some("spam"), Utc::now()).unwrap();
        let reasons: Vec<_> = db.reports_for(&d.id).unwrap().into_iter().map(|r| r.reason).collect();
        assert_eq!(reasons, vec![DEFAULT_REPORT_REASON.to_string(), "spam".to_string()]);
        assert!(db.report_discussion("locked", "missing", None, Utc::now()).is_err());
    }

    #[test]
    fn views_increment() {
        let db = db_with(&[("author", 25)]);
        let d = db.create_discussion("author", "Topic", "body", Utc::now()).unwrap();
        db.record_view(&d.id).unwrap();
        db.record_view(&d.id).unwrap();
        assert_eq!(db.discussion(&d.id).unwrap().views, 2);
        assert!(db.record_view("missing").is_err());
    }
}
