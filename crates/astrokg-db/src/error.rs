//! Relational store error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Missing required input: {0}")]
    MissingInput(String),

    #[error("Paper not found: {0}")]
    PaperNotFound(String),

    #[error("Invalid database URL: {0}")]
    InvalidUrl(String),
}
