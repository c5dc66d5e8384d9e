pub mod comment;
pub mod config;
pub mod discussion;
pub mod poll;
pub mod profile;
pub mod pulse;
pub mod quiz;
pub mod unlocks;

use chrono::Utc;
use civicpulse_core::{Catalog, Config, CoreError, Database, Profile};
use serde::Serialize;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Everything a command needs besides its own arguments.
pub struct Context {
    user: Option<String>,
    pub config: Config,
}

impl Context {
    pub fn new(user: Option<String>, config: Config) -> Self {
        Self { user, config }
    }

    pub fn user(&self) -> CliResult<&str> {
        self.user
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| "no identity given; pass --user or set CIVICPULSE_USER".into())
    }

    pub fn open_db(&self) -> Result<Database, CoreError> {
        Database::open(&self.config)
    }

    /// Make sure the acting identity has a profile, as sign-in would.
    pub fn sign_in(&self, db: &Database) -> CliResult<Profile> {
        Ok(db.create_profile_if_missing(self.user()?, "", Utc::now())?)
    }

    pub fn catalog(&self) -> Result<Catalog, CoreError> {
        match self.config.catalog_path() {
            Some(path) => Catalog::load(&path),
            None => Ok(Catalog::builtin()),
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
