//! Configuration file support for cleaning runs

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use textscrub_core::{DownloadManifest, FileProcessor, LoaderKind, ProcessorBuilder};
use textscrub_filters::{DetectorConfig, FilterConfig, TokenizerKind, WhatlangDetector};
use textscrub_formats::{JsonlConfig, RequiredFields};

/// Complete cleaning configuration. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    pub tokenizer: TokenizerKind,
    pub reader: JsonlConfig,
    pub filter: FilterConfig,
    pub detector: DetectorConfig,
    pub loader: LoaderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validator: Option<ValidatorConfig>,
}

/// Record validation applied while reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    pub required_fields: Vec<String>,
}

impl CleanConfig {
    /// Load configuration from a file (YAML or TOML)
    pub fn load(path: &Path) -> Result<Self> {
        load_file(path)
    }

    /// Build a processor from this configuration
    pub fn build_processor(&self) -> Result<FileProcessor> {
        let mut reader = self.reader.clone();
        if let Some(validator) = &self.validator {
            reader = reader.with_validator(RequiredFields::new(validator.required_fields.clone()));
        }

        let detector = WhatlangDetector::new(self.detector.clone())
            .context("Invalid detector configuration")?;
        let tokenizer = self
            .tokenizer
            .build()
            .context("Failed to load tokenizer")?;

        ProcessorBuilder::new()
            .reader_config(reader)
            .filter_config(self.filter.clone())
            .loader(self.loader.build())
            .detector(Box::new(detector))
            .tokenizer(tokenizer)
            .build()
            .context("Invalid filter configuration")
    }
}

/// Load a download manifest (YAML or TOML)
pub fn load_manifest(path: &Path) -> Result<DownloadManifest> {
    load_file(path)
}

fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

    match extension {
        "yaml" | "yml" => serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
        "toml" => toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
        _ => Err(anyhow::anyhow!(
            "Unsupported config file format: {}. Use .yaml, .yml, or .toml",
            extension
        )),
    }
}
