//! TOML-based application configuration.
//!
//! Stores:
//! - Defaults for newly created profiles
//! - Pulse selection strategy and seed
//! - Store contention handling (busy timeout, write retries)
//! - An optional replacement quiz/poll catalog
//!
//! Scoring thresholds and rewards are deliberately absent: they are
//! compile-time constants in [`crate::engagement`].
//!
//! Configuration is stored at `~/.config/civicpulse/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use super::retry::RetryPolicy;
use crate::error::ConfigError;
use crate::profile::DEFAULT_USERNAME;
use crate::pulse::{FirstEligible, PulseSelector, RandomSelector};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_username")]
    pub default_username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PulseStrategy {
    Random,
    First,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseConfig {
    #[serde(default = "default_strategy")]
    pub strategy: PulseStrategy,
    /// Fixed seed for reproducible picks (random strategy only).
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default = "default_max_write_attempts")]
    pub max_write_attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// TOML catalog replacing the built-in quizzes and polls.
    #[serde(default)]
    pub catalog_path: Option<String>,
    /// Default tracing filter when CIVICPULSE_LOG is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub pulse: PulseConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_username() -> String {
    DEFAULT_USERNAME.to_string()
}
fn default_strategy() -> PulseStrategy {
    PulseStrategy::Random
}
fn default_busy_timeout_ms() -> u64 {
    5_000
}
fn default_max_write_attempts() -> u32 {
    3
}
fn default_retry_backoff_ms() -> u64 {
    50
}
fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            default_username: default_username(),
        }
    }
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            seed: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: default_busy_timeout_ms(),
            max_write_attempts: default_max_write_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: None,
            log_filter: default_log_filter(),
            profile: ProfileConfig::default(),
            pulse: PulseConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

/// Non-negative integer that TOML can hold (TOML integers are i64).
fn toml_integer(value: &str) -> Result<u64, String> {
    let n = value
        .parse::<u64>()
        .map_err(|_| format!("cannot parse '{value}' as number"))?;
    if i64::try_from(n).is_err() {
        return Err(format!("{value} exceeds the largest TOML integer ({})", i64::MAX));
    }
    Ok(n)
}

impl StoreConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_write_attempts, Duration::from_millis(self.retry_backoff_ms))
    }
}

impl PulseConfig {
    pub fn selector(&self) -> Box<dyn PulseSelector> {
        match self.strategy {
            PulseStrategy::Random => Box::new(RandomSelector::new(self.seed)),
            PulseStrategy::First => Box::new(FirstEligible),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    /// `nullable` keys accept "" or "none" to clear them whatever they hold.
    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
        nullable: bool,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let clears = nullable && matches!(value, "" | "none");
            let new_value = match existing {
                _ if clears => serde_json::Value::Null,
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => {
                    let n = toml_integer(value).map_err(invalid)?;
                    serde_json::Value::Number(n.into())
                }
                // Unset optionals: numbers stay numbers.
                serde_json::Value::Null => match value.parse::<u64>() {
                    Ok(_) => serde_json::Value::Number(toml_integer(value).map_err(invalid)?.into()),
                    Err(_) => serde_json::Value::String(value.into()),
                },
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// `config.toml` inside the data directory.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing defaults if the file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(err) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: err.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        let defaults = serde_json::to_value(Self::default()).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        let nullable = Self::get_json_value_by_path(&defaults, key).is_some_and(|v| v.is_null());
        Self::set_json_value_by_path(&mut json, key, value, nullable)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|err| {
            tracing::warn!("falling back to default config: {err}");
            Self::default()
        })
    }

    /// Path of the replacement catalog, if configured.
    pub fn catalog_path(&self) -> Option<PathBuf> {
        self.catalog_path.as_deref().map(PathBuf::from)
    }
}
