//! Layered settings: defaults, optional TOML file, then environment.
//!
//! Environment variables use the `THREADEDCOMMENTS__` prefix with `__`
//! between sections, e.g. `THREADEDCOMMENTS__TREE__PATH_DIGITS=12`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use threadedcomments_core::config::{TreeConfig, DEFAULT_PATH_DIGITS, DEFAULT_PATH_SEPARATOR};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_NAME: &str = "threadedcomments";

/// Database file used when nothing else is configured.
pub const DEFAULT_DB_FILE: &str = "threadedcomments.db";

const ENV_PREFIX: &str = "THREADEDCOMMENTS";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub tree: TreeConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub path: PathBuf,
    pub busy_timeout_ms: u64,
}

impl DatabaseSettings {
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Settings {
    /// Load settings.
    ///
    /// With `config_file` set the file must exist; otherwise
    /// `threadedcomments.toml` is read from the working directory if present.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("database.path", DEFAULT_DB_FILE)?
            .set_default("database.busy_timeout_ms", 5000)?
            .set_default("tree.path_separator", DEFAULT_PATH_SEPARATOR)?
            .set_default("tree.path_digits", i64::try_from(DEFAULT_PATH_DIGITS).unwrap_or(10))?
            .set_default("tree.stamp_siblings", true)?;

        let builder = match config_file {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_NAME).required(false)),
        };

        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
