//! Database schema migrations for civicpulse.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.
//!
//! Level and permission tier have no columns on purpose. They are derived
//! from `points` on every read.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(from = current_version, to = SCHEMA_VERSION, "migrated database schema");
    }
    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 for a fresh database.
pub fn get_schema_version(conn: &Connection) -> SqliteResult<i32> {
    match conn.query_row("SELECT version FROM schema_version", [], |row| row.get::<_, i32>(0)) {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(err) => Err(err),
    }
}

fn set_schema_version(tx: &rusqlite::Transaction<'_>, version: i32) -> SqliteResult<()> {
    tx.execute("DELETE FROM schema_version", [])?;
    tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: profiles and poll votes.
///
/// `poll_votes` carries the (uid, poll_id) primary key that enforces one
/// vote per identity per poll.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS profiles (
            uid               TEXT PRIMARY KEY,
            username          TEXT NOT NULL,
            email             TEXT NOT NULL DEFAULT '',
            bio               TEXT NOT NULL DEFAULT '',
            points            INTEGER NOT NULL DEFAULT 0,
            streak            INTEGER NOT NULL DEFAULT 0,
            last_activity_at  TEXT,
            quizzes_completed INTEGER NOT NULL DEFAULT 0,
            created_at        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS poll_votes (
            uid       TEXT NOT NULL,
            poll_id   TEXT NOT NULL,
            option_id TEXT NOT NULL,
            voted_at  TEXT NOT NULL,
            PRIMARY KEY (uid, poll_id)
        );

        CREATE INDEX IF NOT EXISTS idx_poll_votes_poll ON poll_votes(poll_id, option_id);",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: community content.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS discussions (
            id              TEXT PRIMARY KEY,
            title           TEXT NOT NULL,
            content         TEXT NOT NULL,
            author_uid      TEXT NOT NULL,
            author_username TEXT NOT NULL,
            comment_count   INTEGER NOT NULL DEFAULT 0,
            views           INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS comments (
            id              TEXT PRIMARY KEY,
            discussion_id   TEXT NOT NULL REFERENCES discussions(id) ON DELETE CASCADE,
            author_uid      TEXT NOT NULL,
            author_username TEXT NOT NULL,
            text            TEXT NOT NULL,
            created_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS reports (
            id            TEXT PRIMARY KEY,
            discussion_id TEXT NOT NULL,
            reported_by   TEXT NOT NULL,
            reason        TEXT NOT NULL,
            created_at    TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_discussions_created_at ON discussions(created_at);
        CREATE INDEX IF NOT EXISTS idx_comments_discussion ON comments(discussion_id, created_at);",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()
}
