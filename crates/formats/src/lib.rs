//! Line-delimited JSON input and output for dataset cleaning
//!
//! This crate provides a streaming JSONL reader with per-line error
//! policies and an atomic, gzip-compressed JSONL writer.

pub mod convert;
pub mod error;
pub mod jsonl;
pub mod record;
pub mod writer;

pub use convert::decompress_jsonl_gz;
pub use error::{Error, Result};
pub use jsonl::{
    DecodeErrors, ErrorPolicy, JsonlConfig, JsonlReader, RecordValidator, RequiredFields,
    TextEncoding,
};
pub use record::Record;
pub use writer::{
    validate_jsonl_gz_path, write_atomically, write_jsonl_gz, FileTransaction, JsonlGzWriter,
};
