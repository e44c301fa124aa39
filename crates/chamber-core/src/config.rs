//! Store configuration.
//!
//! Layers, lowest priority first: built-in defaults, an optional TOML file,
//! then `CHAMBER_*` environment variables.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_DATABASE_PATH: &str = "chamber.db";
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config source error: {0}")]
    Source(#[from] config::ConfigError),

    #[error("Config file not found: {0}")]
    MissingFile(PathBuf),
}

/// An account created (or password-reset) every time the store opens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    crate::models::ROLE_STAFF.to_string()
}

/// Settings for opening the clinic database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub database_path: PathBuf,
    pub busy_timeout_ms: u64,
    pub seed_users: Vec<SeedUser>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            seed_users: Vec::new(),
        }
    }
}

impl StoreConfig {
    /// Load configuration, reading `path` if given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::MissingFile(path.to_path_buf()));
            }
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(Environment::with_prefix("CHAMBER"));

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}
