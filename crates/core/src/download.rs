//! Dataset download helper
//!
//! Fetches a URL into a temporary file next to the destination and renames
//! it into place once the body is complete. A body shorter than its
//! `Content-Length` is reported by the HTTP client as a read error, so a
//! truncated transfer never reaches the destination. No retries.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use textscrub_formats::FileTransaction;
use tracing::{error, info};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// One dataset to fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub url: String,
    pub dest: PathBuf,
}

/// List of datasets to fetch before processing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadManifest {
    #[serde(default)]
    pub datasets: Vec<ManifestEntry>,
}

/// Result of [`download_all`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct DownloadSummary {
    pub downloaded: Vec<PathBuf>,
    pub failed: Vec<(String, String)>,
}

fn download_error(url: &str, reason: impl ToString) -> Error {
    Error::Download {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

/// Download `url` to `dest`, skipping the request if `dest` already has content
pub fn download_dataset(url: &str, dest: impl AsRef<Path>, timeout: Duration) -> Result<PathBuf> {
    let dest = dest.as_ref();

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    if fs::metadata(dest).map(|m| m.len() > 0).unwrap_or(false) {
        info!("File already exists at {:?}. Skipping download.", dest);
        return Ok(dest.to_path_buf());
    }

    info!("Downloading dataset from {} to {:?}", url, dest);

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| download_error(url, e))?;

    let mut response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| download_error(url, e))?;

    let mut tx = FileTransaction::begin(dest)?;
    let written = response
        .copy_to(&mut tx)
        .map_err(|e| download_error(url, e))?;

    tx.commit()?;
    info!("Successfully downloaded {} ({} bytes) to {:?}", url, written, dest);
    Ok(dest.to_path_buf())
}

/// Fetch every manifest entry in order, continuing past failures
pub fn download_all(manifest: &DownloadManifest, timeout: Duration) -> DownloadSummary {
    let mut summary = DownloadSummary::default();

    for entry in &manifest.datasets {
        match download_dataset(&entry.url, &entry.dest, timeout) {
            Ok(path) => summary.downloaded.push(path),
            Err(e) => {
                error!("Failed to download {}: {}", entry.name, e);
                summary.failed.push((entry.name.clone(), e.to_string()));
            }
        }
    }

    summary
}
