//! Directory-level driver: one output per input, best effort

use crate::processor::{FileProcessor, RunStats};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Outcome for one input file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<RunStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Input line that caused the failure, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl FileReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Totals for a batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub successful: usize,
    pub total: usize,
    pub files: Vec<FileReport>,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.total - self.successful
    }

    pub fn kept(&self) -> usize {
        self.files.iter().filter_map(|f| f.stats.as_ref()).map(|s| s.kept).sum()
    }

    pub fn skipped(&self) -> usize {
        self.files
            .iter()
            .filter_map(|f| f.stats.as_ref())
            .map(|s| s.skipped)
            .sum()
    }
}

/// List the JSONL inputs (`*.jsonl*`) of a directory in name order
pub fn discover_inputs(input_dir: &Path) -> Result<Vec<PathBuf>> {
    if !input_dir.is_dir() {
        return Err(Error::InputNotFound(input_dir.to_path_buf()));
    }

    let mut inputs = Vec::new();
    for entry in fs::read_dir(input_dir)? {
        let entry = entry?;
        let is_jsonl = entry
            .file_name()
            .to_str()
            .map(|name| name.contains(".jsonl"))
            .unwrap_or(false);
        if is_jsonl && entry.file_type()?.is_file() {
            inputs.push(entry.path());
        }
    }
    inputs.sort();
    Ok(inputs)
}

/// Output path for `input` inside `output_dir`.
///
/// `name.jsonl` and `name.jsonl.gz` both map to `name.jsonl.gz`.
pub fn output_path_for(input: &Path, output_dir: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = name.strip_suffix(".gz").unwrap_or(name.as_str());
    let base = base.strip_suffix(".jsonl").unwrap_or(base);
    output_dir.join(format!("{}.jsonl.gz", base))
}

/// Output file name with only the last extension removed: `a.jsonl.gz` maps
/// to `a.jsonl.jsonl.gz`
fn stem_output_name(input: &Path) -> OsString {
    let mut name = input.file_stem().map(OsString::from).unwrap_or_default();
    name.push(".jsonl.gz");
    name
}

/// Assign every input a distinct output path in `output_dir`.
///
/// Inputs are taken in order. When the name from [`output_path_for`] is
/// already claimed by an earlier input's output, or names an input file
/// itself (input and output directory are the same), the stem-based name
/// is tried instead. `None` means both names are taken.
pub fn plan_outputs(
    inputs: &[PathBuf],
    input_dir: &Path,
    output_dir: &Path,
) -> Result<Vec<Option<PathBuf>>> {
    let mut claimed: HashSet<OsString> = HashSet::new();
    if fs::canonicalize(input_dir)? == fs::canonicalize(output_dir)? {
        claimed.extend(inputs.iter().filter_map(|p| p.file_name()).map(OsString::from));
    }

    let plan = inputs
        .iter()
        .map(|input| {
            let preferred = output_path_for(input, output_dir)
                .file_name()
                .map(OsString::from)
                .unwrap_or_default();
            [preferred, stem_output_name(input)]
                .into_iter()
                .find(|name| !claimed.contains(name))
                .map(|name| {
                    claimed.insert(name.clone());
                    output_dir.join(name)
                })
        })
        .collect();
    Ok(plan)
}

/// Process every input in `input_dir` into `output_dir`.
///
/// A failing file is logged and recorded in the summary; the remaining
/// files are still processed. Two inputs never share an output (see
/// [`plan_outputs`]); an input left without a free name is reported as
/// failed. `on_file` is called after each file.
pub fn process_all<F>(
    processor: &FileProcessor,
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    mut on_file: F,
) -> Result<BatchSummary>
where
    F: FnMut(&FileReport),
{
    let input_dir = input_dir.as_ref();
    let output_dir = output_dir.as_ref();

    let inputs = discover_inputs(input_dir)?;
    fs::create_dir_all(output_dir)?;
    let outputs = plan_outputs(&inputs, input_dir, output_dir)?;

    info!(
        "Found {} input files in {:?}; writing to {:?}",
        inputs.len(),
        input_dir,
        output_dir
    );

    let mut summary = BatchSummary::default();
    for (input, output) in inputs.into_iter().zip(outputs) {
        let report = match output {
            None => {
                let output = output_path_for(&input, output_dir);
                error!(
                    "No free output name for {:?}; {:?} is taken by another input",
                    input, output
                );
                FileReport {
                    input,
                    output,
                    stats: None,
                    error: Some("output path is already claimed by another input".to_string()),
                    line: None,
                }
            }
            Some(output) => match processor.process_file(&input, &output) {
                Ok(stats) => FileReport {
                    input,
                    output,
                    stats: Some(stats),
                    error: None,
                    line: None,
                },
                Err(e) => {
                    match e.line() {
                        Some(line) => {
                            error!("Error processing file {:?} at line {}: {}", input, line, e)
                        }
                        None => error!("Error processing file {:?}: {}", input, e),
                    }
                    FileReport {
                        input,
                        output,
                        stats: None,
                        line: e.line(),
                        error: Some(e.to_string()),
                    }
                }
            },
        };

        summary.total += 1;
        if report.succeeded() {
            summary.successful += 1;
        }
        on_file(&report);
        summary.files.push(report);
    }

    info!(
        "Processing complete. Successful: {}, Total: {}",
        summary.successful, summary.total
    );
    Ok(summary)
}
