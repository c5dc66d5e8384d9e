mod community;
mod config;
pub mod database;
pub mod migrations;
mod profiles;
mod retry;

pub use config::{Config, ProfileConfig, PulseConfig, PulseStrategy, StoreConfig};
pub use database::Database;
pub use profiles::QuizOutcome;
pub use retry::RetryPolicy;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/civicpulse[-dev]/` based on CIVICPULSE_ENV.
///
/// Set CIVICPULSE_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the data directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("CIVICPULSE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("civicpulse-dev")
    } else {
        base_dir.join("civicpulse")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
