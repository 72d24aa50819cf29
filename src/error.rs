use thiserror::Error;

use crate::models::ArticleStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Article not found: {0}")]
    ArticleNotFound(i64),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: ArticleStatus,
        to: ArticleStatus,
    },

    #[error("Invalid callback data: {0}")]
    InvalidCallback(String),

    #[error("Claude API error: {0}")]
    ClaudeApi(String),

    #[error("Telegram API error: {0}")]
    TelegramApi(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Declared failure of an external collaborator (scraper, translator,
/// classifier). Stage runners turn these into a `failed` article instead of
/// propagating them.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("runtime failure: {0}")]
    Runtime(String),
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(e: reqwest::Error) -> Self {
        CollaboratorError::Runtime(e.to_string())
    }
}

impl From<serde_json::Error> for CollaboratorError {
    fn from(e: serde_json::Error) -> Self {
        CollaboratorError::Validation(e.to_string())
    }
}
