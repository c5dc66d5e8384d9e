//! SQLite-backed profile and content store.
//!
//! Provides persistent storage for:
//! - One engagement profile per identity
//! - Poll votes (one per identity per poll)
//! - Discussions, comments and moderation reports
//!
//! Every read-modify-write runs inside a `BEGIN IMMEDIATE` transaction, so
//! two writers for the same identity serialize on the database lock instead
//! of both computing from the same prior snapshot. A writer that loses the
//! race gets a retryable [`DatabaseError::Locked`] and is re-run from a
//! fresh read by the [`RetryPolicy`].

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior};

use super::config::{Config, StoreConfig};
use super::data_dir;
use super::migrations;
use super::retry::RetryPolicy;
use crate::error::{CoreError, DatabaseError, Result};
use crate::feed::{ProfileFeed, Subscription};
use crate::profile::DEFAULT_USERNAME;

/// Database file name inside the data directory.
pub const DATABASE_FILE: &str = "civicpulse.db";

/// SQLite store for profiles and community content.
pub struct Database {
    conn: Connection,
    feed: ProfileFeed,
    retry: RetryPolicy,
    default_username: String,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/civicpulse/civicpulse.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(config: &Config) -> Result<Self> {
        let path = data_dir()?.join(DATABASE_FILE);
        Self::open_at(&path, config)
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: &Path, config: &Config) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("opened database at {}", path.display());
        Self::init(conn, config)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| DatabaseError::OpenFailed {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Self::init(conn, &Config::default())
    }

    fn init(conn: Connection, config: &Config) -> Result<Self> {
        configure(&conn, &config.store)?;
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        let default_username = if config.profile.default_username.trim().is_empty() {
            DEFAULT_USERNAME.to_string()
        } else {
            config.profile.default_username.trim().to_string()
        };
        Ok(Self {
            conn,
            feed: ProfileFeed::new(),
            retry: config.store.retry_policy(),
            default_username,
        })
    }

    /// Share a feed with other handles so their commits reach the same
    /// subscribers.
    pub fn with_feed(mut self, feed: ProfileFeed) -> Self {
        self.feed = feed;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn feed(&self) -> &ProfileFeed {
        &self.feed
    }

    /// Subscribe to committed profile snapshots for `uid`.
    ///
    /// The subscription starts from the stored profile, or empty when the
    /// identity has none yet.
    pub fn subscribe(&self, uid: &str) -> Result<Subscription> {
        let current = match self.profile(uid) {
            Ok(profile) => Some(profile),
            Err(CoreError::Database(DatabaseError::NotFound { .. })) => None,
            Err(err) => return Err(err),
        };
        Ok(self.feed.subscribe_from(uid, current))
    }

    pub(super) fn default_username(&self) -> &str {
        &self.default_username
    }

    /// Run `op` in an immediate transaction, retrying on lock contention.
    ///
    /// `op` is re-invoked from scratch on every attempt, so anything it reads
    /// inside the transaction is fresh.
    pub(super) fn write<T>(
        &self,
        what: &str,
        mut op: impl FnMut(&Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        self.retry.run(what, || {
            let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
            let value = op(&tx)?;
            tx.commit()?;
            Ok(value)
        })
    }
}

fn configure(conn: &Connection, store: &StoreConfig) -> Result<()> {
    conn.busy_timeout(store.busy_timeout())?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(())
}

/// Fixed-width UTC timestamps so text ordering matches time ordering.
pub(super) fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(super) fn parse_timestamp(id: &str, field: &'static str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            DatabaseError::CorruptRecord {
                id: id.to_string(),
                field,
                value: raw.to_string(),
            }
            .into()
        })
}

/// Counters are stored as INTEGER; anything outside `u32` is corruption.
pub(super) fn parse_counter(id: &str, field: &'static str, raw: i64) -> Result<u32> {
    u32::try_from(raw).map_err(|_| {
        DatabaseError::CorruptRecord {
            id: id.to_string(),
            field,
            value: raw.to_string(),
        }
        .into()
    })
}

pub(super) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
