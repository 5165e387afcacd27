//! Configuration for the flashcards binary.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub study: StudyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Reads the config at `path`, or the platform default location.
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::config_path) else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "flashcards")
            .map(|d| d.config_dir().join("config.toml"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "flashcards")
        .map(|d| d.data_dir().join("flashcards.sqlite3"))
        .unwrap_or_else(|| PathBuf::from("db.sqlite3"))
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyConfig {
    /// User the CLI reads and writes review records as.
    #[serde(default = "default_user")]
    pub user: String,
}

fn default_user() -> String {
    "local".to_string()
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            user: default_user(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// tracing-subscriber filter directive, overridden by RUST_LOG.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml("[study]\nuser = \"alice\"\n").unwrap();
        assert_eq!(config.study.user, "alice");
        assert_eq!(config.logging.filter, "info");
        assert_eq!(config.database, DatabaseConfig::default());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        assert!(matches!(
            Config::from_toml("[study\nuser ="),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(dir.path().join("absent.toml").as_path())).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("config.toml");
        let mut config = Config::default();
        config.database.path = dir.path().join("cards.sqlite3");
        config.logging.filter = "debug".to_string();

        config.save(&path).unwrap();
        assert_eq!(Config::load(Some(path.as_path())).unwrap(), config);
    }
}
