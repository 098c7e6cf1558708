//! Handles settings for the application. Configuration is read from
//! `settings.toml` (or the file passed with `--config`) and overridden by
//! `BUDGETMAPPER__*` environment variables.
//!
//! See `settings.example.toml` for the configuration.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "settings";

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Blobs {
    pub chunk_size: usize,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub blobs: Blobs,
}

impl Settings {
    /// Load the settings. The file is optional unless `path` is given.
    pub fn new(path: Option<&str>) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .set_default("database.sqlite", "budgetmapper.db")?
            .set_default("blobs.chunk_size", engine::DEFAULT_CHUNK_SIZE as u64)?
            .add_source(
                File::with_name(path.unwrap_or(DEFAULT_CONFIG_PATH)).required(path.is_some()),
            )
            .add_source(Environment::with_prefix("BUDGETMAPPER").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let settings = Settings::new(None).unwrap();
        assert_eq!(settings.app.level, "info");
        assert_eq!(
            settings.database,
            Database::Sqlite("budgetmapper.db".to_string())
        );
        assert_eq!(settings.blobs.chunk_size, 65536);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(Settings::new(Some("does/not/exist.toml")).is_err());
    }
}
