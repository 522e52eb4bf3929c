//! Per-file cleaning pipeline
//!
//! Streams one input file through loader, PII masking and the record
//! filter, writing survivors into an atomic `.jsonl.gz` transaction.
//! Either the whole output is committed or nothing is left behind.

use crate::loader::{DollyLoader, Loader};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use textscrub_filters::{
    mask_pii, Cl100kTokenizer, DropReason, FilterConfig, FilterDecision, LanguageDetector,
    RecordFilter, Tokenizer, WhatlangDetector,
};
use textscrub_formats::{validate_jsonl_gz_path, write_jsonl_gz, JsonlConfig, JsonlReader};
use tracing::{debug, info};

/// Counters for one processed file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub kept: usize,
    pub skipped: usize,
    /// Lines read from the input, blank and malformed lines included
    pub lines_read: usize,
    /// Skipped records per drop reason
    pub drop_reasons: BTreeMap<String, usize>,
}

impl RunStats {
    pub fn total(&self) -> usize {
        self.kept + self.skipped
    }

    pub fn retention_rate(&self) -> f64 {
        if self.total() > 0 {
            (self.kept as f64 / self.total() as f64) * 100.0
        } else {
            0.0
        }
    }

    fn record_drop(&mut self, reason: &DropReason) {
        self.skipped += 1;
        *self.drop_reasons.entry(reason.kind().to_string()).or_insert(0) += 1;
    }
}

#[derive(Serialize)]
struct CleanedRecord<'a> {
    text: &'a str,
}

/// Cleans single files; reusable across a batch
pub struct FileProcessor {
    reader_config: JsonlConfig,
    loader: Box<dyn Loader>,
    filter: RecordFilter,
    tokenizer: Box<dyn Tokenizer>,
}

impl FileProcessor {
    pub fn new(
        reader_config: JsonlConfig,
        loader: Box<dyn Loader>,
        filter: RecordFilter,
        tokenizer: Box<dyn Tokenizer>,
    ) -> Self {
        Self {
            reader_config,
            loader,
            filter,
            tokenizer,
        }
    }

    /// Clean `input` into `output` (which must end in `.jsonl.gz`).
    ///
    /// Input existence and the output name are checked before anything is
    /// opened. On error the output path is left as it was.
    pub fn process_file(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<RunStats> {
        let input = input.as_ref();
        let output = output.as_ref();

        if !input.exists() {
            return Err(Error::InputNotFound(input.to_path_buf()));
        }
        validate_jsonl_gz_path(output)?;

        debug!("Processing {:?} -> {:?}", input, output);

        let stats = write_jsonl_gz(output, |writer| -> Result<RunStats> {
            let mut reader = JsonlReader::open_with_config(input, self.reader_config.clone())?;
            let mut stats = RunStats::default();

            for result in reader.by_ref() {
                let record = result?;
                let text = mask_pii(&self.loader.load(&record));

                match self.filter.evaluate(&text, self.tokenizer.as_ref())? {
                    FilterDecision::Keep => {
                        writer.write_record(&CleanedRecord { text: &text })?;
                        stats.kept += 1;
                    }
                    FilterDecision::Drop(reason) => {
                        debug!("Dropped record at line {}: {}", record.source_line, reason);
                        stats.record_drop(&reason);
                    }
                }
            }

            stats.lines_read = reader.lines_processed();
            Ok(stats)
        })?;

        info!(
            "Processing complete for {:?}. Kept: {}, Skipped: {}",
            input, stats.kept, stats.skipped
        );
        Ok(stats)
    }
}

/// Builder for [`FileProcessor`] with the production defaults
pub struct ProcessorBuilder {
    reader_config: JsonlConfig,
    filter_config: FilterConfig,
    loader: Option<Box<dyn Loader>>,
    detector: Option<Box<dyn LanguageDetector>>,
    tokenizer: Option<Box<dyn Tokenizer>>,
}

impl ProcessorBuilder {
    pub fn new() -> Self {
        Self {
            reader_config: JsonlConfig::default(),
            filter_config: FilterConfig::default(),
            loader: None,
            detector: None,
            tokenizer: None,
        }
    }

    pub fn reader_config(mut self, config: JsonlConfig) -> Self {
        self.reader_config = config;
        self
    }

    pub fn filter_config(mut self, config: FilterConfig) -> Self {
        self.filter_config = config;
        self
    }

    pub fn loader(mut self, loader: Box<dyn Loader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn detector(mut self, detector: Box<dyn LanguageDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn tokenizer(mut self, tokenizer: Box<dyn Tokenizer>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    /// Fill in defaults (Dolly loader, whatlang, cl100k) and build
    pub fn build(self) -> Result<FileProcessor> {
        let detector = self
            .detector
            .unwrap_or_else(|| Box::new(WhatlangDetector::default()));
        let tokenizer = match self.tokenizer {
            Some(t) => t,
            None => Box::new(Cl100kTokenizer::new()?),
        };
        let filter = RecordFilter::new(self.filter_config, detector)?;

        Ok(FileProcessor::new(
            self.reader_config,
            self.loader.unwrap_or_else(|| Box::new(DollyLoader)),
            filter,
            tokenizer,
        ))
    }
}

impl Default for ProcessorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
