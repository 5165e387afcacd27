//! Error type shared by the scheduler boundary, persistence and ingestion.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Rejected at the boundary: bad rating, missing field, empty card text.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
