use thiserror::Error;

/// Errors from loading configuration and parsing the shared vocabularies.
#[derive(Debug, Error)]
pub enum AstroError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AstroError>;
