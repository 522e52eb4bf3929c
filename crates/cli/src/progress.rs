//! Progress reporting and summaries for CLI

use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use textscrub_core::{BatchSummary, FileReport, RunStats};

/// Per-file progress for a batch run
pub struct ProgressReporter {
    bar: ProgressBar,
    kept: usize,
    skipped: usize,
}

impl ProgressReporter {
    /// Create a reporter for `total_files` inputs; hidden when `quiet`
    pub fn new(total_files: u64, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(total_files)
        };
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")
        {
            bar.set_style(style.progress_chars("█▓▒░-"));
        }

        Self {
            bar,
            kept: 0,
            skipped: 0,
        }
    }

    /// Record one finished file
    pub fn file_done(&mut self, report: &FileReport) {
        if let Some(stats) = &report.stats {
            self.kept += stats.kept;
            self.skipped += stats.skipped;
        }
        self.bar.inc(1);
        self.bar.set_message(format!(
            "| {} kept | {} skipped",
            Self::format_number(self.kept),
            Self::format_number(self.skipped)
        ));
    }

    /// Finish progress reporting
    pub fn finish(&self) {
        self.bar.finish_with_message("Complete!");
    }

    /// Format large numbers with thousand separators
    fn format_number(n: usize) -> String {
        if n >= 1_000_000 {
            format!("{:.1}M", n as f64 / 1_000_000.0)
        } else if n >= 1_000 {
            format!("{:.1}K", n as f64 / 1_000.0)
        } else {
            n.to_string()
        }
    }
}

/// Print a formatted report for one processed file
pub fn print_summary_report(input: &Path, output: &Path, stats: &RunStats) {
    println!("\n{}", "═".repeat(60));
    println!("Dataset Cleaning Complete");
    println!("{}", "═".repeat(60));
    println!("Input:              {}", input.display());
    println!("Output:             {}", output.display());
    println!("Lines read:         {}", format_with_commas(stats.lines_read));
    println!("Records evaluated:  {}", format_with_commas(stats.total()));

    println!("Skipped:            {}", format_with_commas(stats.skipped));
    for (reason, count) in &stats.drop_reasons {
        println!("  {:<18}{}", format!("{}:", reason), format_with_commas(*count));
    }

    println!(
        "Kept:               {} ({:.1}%)",
        format_with_commas(stats.kept),
        stats.retention_rate()
    );

    println!("{}", "═".repeat(60));
}

/// Print a formatted report for a batch run
pub fn print_batch_report(input_dir: &Path, output_dir: &Path, summary: &BatchSummary) {
    println!("\n{}", "═".repeat(60));
    println!("Batch Cleaning Complete");
    println!("{}", "═".repeat(60));
    println!("Input directory:    {}", input_dir.display());
    println!("Output directory:   {}", output_dir.display());
    println!(
        "Files:              {} successful / {} total",
        summary.successful, summary.total
    );
    println!("Records kept:       {}", format_with_commas(summary.kept()));
    println!("Records skipped:    {}", format_with_commas(summary.skipped()));

    for file in summary.files.iter().filter(|f| !f.succeeded()) {
        let location = match file.line {
            Some(line) => format!("{}:{}", file.input.display(), line),
            None => file.input.display().to_string(),
        };
        println!(
            "Failed:             {} ({})",
            location,
            file.error.as_deref().unwrap_or("unknown error")
        );
    }

    println!("{}", "═".repeat(60));
}

/// Format number with thousand separators
fn format_with_commas(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
