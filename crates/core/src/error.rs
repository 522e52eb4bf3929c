//! Error types for the cleaning pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input file {0} does not exist")]
    InputNotFound(PathBuf),

    #[error("Output file must have .jsonl.gz extension: {0}")]
    InvalidOutputPath(PathBuf),

    #[error(transparent)]
    Format(textscrub_formats::Error),

    #[error(transparent)]
    Filter(#[from] textscrub_filters::Error),

    #[error("Download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Input line the failure refers to, for per-line read errors
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Format(e) => e.line(),
            _ => None,
        }
    }
}

impl From<textscrub_formats::Error> for Error {
    fn from(e: textscrub_formats::Error) -> Self {
        match e {
            textscrub_formats::Error::InvalidOutputPath(path) => Error::InvalidOutputPath(path),
            other => Error::Format(other),
        }
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;
