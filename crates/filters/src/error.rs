//! Error types for filters

use thiserror::Error;

/// Filter errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Language detection failed: {0}")]
    Detection(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for filter operations
pub type Result<T> = std::result::Result<T, Error>;
