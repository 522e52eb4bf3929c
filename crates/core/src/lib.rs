//! Dataset cleaning pipeline
//!
//! This crate ties the JSONL reader, PII masking and record filter into a
//! per-file processor with atomic output, plus a best-effort batch driver
//! and a dataset downloader.

pub mod batch;
pub mod download;
pub mod error;
pub mod loader;
pub mod processor;

pub use batch::{process_all, BatchSummary, FileReport};
pub use download::{
    download_all, download_dataset, DownloadManifest, DownloadSummary, ManifestEntry,
    DEFAULT_TIMEOUT,
};
pub use error::{Error, Result};
pub use loader::{DollyLoader, FieldLoader, Loader, LoaderKind};
pub use processor::{FileProcessor, ProcessorBuilder, RunStats};
