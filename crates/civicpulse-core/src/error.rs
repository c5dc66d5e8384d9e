//! Core error types for civicpulse-core.
//!
//! The scoring engine itself is total and never fails. Everything here
//! originates at the edges: the SQLite store, the TOML configuration, input
//! validation and community permission checks.

use std::path::PathBuf;
use thiserror::Error;

use crate::engagement::{ContentAction, PermissionTier};

/// Core error type for civicpulse-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Community permission errors
    #[error("Permission denied: {0}")]
    Permission(#[from] PermissionError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Whether repeating the same operation may succeed.
    ///
    /// Only contention on the store qualifies. Everything else is either a
    /// caller mistake or a broken store and must be surfaced.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Database(err) if err.is_retryable())
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked or busy
    #[error("Database is locked")]
    Locked,

    /// Requested record does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A persisted record holds a value the engine cannot represent
    #[error("Corrupt record for '{id}': field '{field}' holds {value:?}")]
    CorruptRecord {
        id: String,
        field: &'static str,
        value: String,
    },
}

impl DatabaseError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, DatabaseError::Locked)
    }

    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        DatabaseError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Text field is empty after trimming
    #[error("'{0}' must not be empty")]
    EmptyField(&'static str),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Quiz id not present in the catalog
    #[error("Unknown quiz: {0}")]
    UnknownQuiz(String),

    /// Poll id not present in the catalog
    #[error("Unknown poll: {0}")]
    UnknownPoll(String),

    /// Option id not offered by the poll or quiz
    #[error("Unknown option '{option}' for {parent}")]
    UnknownOption { parent: String, option: String },
}

/// Community permission errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PermissionError {
    /// Author's points do not reach the tier the action requires
    #[error("{action} requires the {required:?} tier, current tier is {actual:?} ({points} points)")]
    InsufficientTier {
        action: ContentAction,
        required: PermissionTier,
        actual: PermissionTier,
        points: u32,
    },

    /// Only the author may delete a discussion
    #[error("discussion {id} belongs to another author")]
    NotAuthor { id: String },

    /// Identity already voted in this poll
    #[error("already voted in poll {poll_id}")]
    AlreadyVoted { poll_id: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if matches!(
                    e.code,
                    rusqlite::ErrorCode::DatabaseLocked | rusqlite::ErrorCode::DatabaseBusy
                ) {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_sqlite_errors_are_retryable() {
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        let err = CoreError::from(busy);
        assert!(err.is_retryable());
    }

    #[test]
    fn other_errors_are_fatal() {
        let err = CoreError::from(DatabaseError::not_found("profile", "u1"));
        assert!(!err.is_retryable());

        let err = CoreError::from(ValidationError::EmptyField("title"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn permission_error_message_names_tiers() {
        let err = PermissionError::InsufficientTier {
            action: ContentAction::Discuss,
            required: PermissionTier::Discuss,
            actual: PermissionTier::Comment,
            points: 12,
        };
        let msg = err.to_string();
        assert!(msg.contains("Discuss"));
        assert!(msg.contains("12 points"));
    }
}
