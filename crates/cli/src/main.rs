//! textscrub CLI
//!
//! Cleans JSONL text datasets: language and length filtering, PII masking,
//! atomic gzip output.

mod config;
mod progress;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::{Path, PathBuf};
use std::time::Duration;
use textscrub_core::{download_all, process_all};
use textscrub_formats::{decompress_jsonl_gz, JsonlReader};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::CleanConfig;
use progress::ProgressReporter;

#[derive(Parser)]
#[command(name = "textscrub")]
#[command(version, about = "Clean JSONL text datasets for model training", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output statistics in JSON format
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a single JSONL file into a .jsonl.gz output
    Process {
        /// Input file (.jsonl or .jsonl.gz)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file, must end in .jsonl.gz
        #[arg(short, long)]
        output: PathBuf,

        /// Config file (YAML or TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Clean every JSONL file in a directory
    ProcessAll {
        /// Directory holding the raw files
        #[arg(long, default_value = "data/raw")]
        input_dir: PathBuf,

        /// Directory for cleaned outputs (created if missing)
        #[arg(long, default_value = "data/processed")]
        output_dir: PathBuf,

        /// Config file (YAML or TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Download the datasets listed in a manifest
    Download {
        /// Manifest file (YAML or TOML)
        #[arg(short, long)]
        manifest: PathBuf,

        /// Per-request timeout in seconds
        #[arg(long, default_value = "20")]
        timeout: u64,
    },

    /// Decompress a .jsonl.gz file into a sibling .jsonl
    Decompress {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Inspect a dataset file
    Inspect {
        /// Path to the dataset file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Number of records to show
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_ansi(!cli.json)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Process {
            input,
            output,
            config,
        } => process_file(&input, &output, config.as_deref(), cli.json),
        Commands::ProcessAll {
            input_dir,
            output_dir,
            config,
        } => process_directory(&input_dir, &output_dir, config.as_deref(), cli.json),
        Commands::Download { manifest, timeout } => {
            download(&manifest, Duration::from_secs(timeout), cli.json)
        }
        Commands::Decompress { input } => {
            let output = decompress_jsonl_gz(&input)?;
            println!("{}", output.display());
            Ok(())
        }
        Commands::Inspect { input, limit } => inspect_dataset(&input, limit),
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<CleanConfig> {
    match path {
        Some(path) => {
            info!("Loading config from {:?}", path);
            CleanConfig::load(path)
        }
        None => Ok(CleanConfig::default()),
    }
}

fn process_file(input: &Path, output: &Path, config: Option<&Path>, json_output: bool) -> Result<()> {
    let processor = load_config(config)?.build_processor()?;

    info!("Cleaning dataset");
    info!("  Input: {:?}", input);
    info!("  Output: {:?}", output);

    let stats = processor
        .process_file(input, output)
        .with_context(|| format!("Failed to process {}", input.display()))?;

    if json_output {
        let report = serde_json::json!({
            "input": input.to_string_lossy(),
            "output": output.to_string_lossy(),
            "kept": stats.kept,
            "skipped": stats.skipped,
            "lines_read": stats.lines_read,
            "retention_rate": stats.retention_rate(),
            "drop_reasons": stats.drop_reasons,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        progress::print_summary_report(input, output, &stats);
    }

    Ok(())
}

fn process_directory(
    input_dir: &Path,
    output_dir: &Path,
    config: Option<&Path>,
    json_output: bool,
) -> Result<()> {
    let processor = load_config(config)?.build_processor()?;

    let total_files = textscrub_core::batch::discover_inputs(input_dir)?.len();
    let mut reporter = ProgressReporter::new(total_files as u64, json_output);

    let summary = process_all(&processor, input_dir, output_dir, |report| {
        reporter.file_done(report)
    })?;
    reporter.finish();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        progress::print_batch_report(input_dir, output_dir, &summary);
    }

    if summary.failed() > 0 {
        bail!("{} of {} files failed", summary.failed(), summary.total);
    }
    Ok(())
}

fn download(manifest_path: &Path, timeout: Duration, json_output: bool) -> Result<()> {
    let manifest = config::load_manifest(manifest_path)?;
    info!(
        "Downloading {} datasets from {:?}",
        manifest.datasets.len(),
        manifest_path
    );

    let summary = download_all(&manifest, timeout);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for path in &summary.downloaded {
            println!("Ready:  {}", path.display());
        }
        for (name, reason) in &summary.failed {
            println!("Failed: {} ({})", name, reason);
        }
    }

    if !summary.failed.is_empty() {
        bail!(
            "{} of {} downloads failed",
            summary.failed.len(),
            manifest.datasets.len()
        );
    }
    Ok(())
}

fn inspect_dataset(input: &Path, limit: usize) -> Result<()> {
    info!("Inspecting dataset: {:?}", input);

    let mut reader = JsonlReader::open(input)?;

    for result in reader.by_ref().take(limit) {
        let record = result?;
        println!(
            "Record #{}: {}",
            record.source_line,
            serde_json::to_string_pretty(&record.data)?
        );
    }

    info!(
        "Read {} records ({} bytes)",
        reader.records_yielded(),
        reader.bytes_processed()
    );

    Ok(())
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
}
