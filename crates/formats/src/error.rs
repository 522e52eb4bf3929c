//! Error types for format readers and writers

use std::path::PathBuf;
use thiserror::Error;

/// Format reader/writer errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid byte sequence at line {line}: {detail}")]
    Decode { line: usize, detail: String },

    #[error("Undecodable characters at line {line}")]
    BadDecode { line: usize },

    #[error("Malformed JSON at line {line}: {source}")]
    BadJson {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Output path must end in .jsonl.gz: {0}")]
    InvalidOutputPath(PathBuf),

    #[error("Invalid file: {0}")]
    InvalidFile(String),

    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Source line the error refers to, for per-line errors
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Decode { line, .. } | Error::BadDecode { line } | Error::BadJson { line, .. } => {
                Some(*line)
            }
            _ => None,
        }
    }
}

/// Result type alias for format operations
pub type Result<T> = std::result::Result<T, Error>;
