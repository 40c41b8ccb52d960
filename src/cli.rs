//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::dataset::TimeZoneMode;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

/// ReviewLens - review-count analytics for video game reviews
///
/// Builds the aggregated review-count file, renders a static chart
/// report, or serves an interactive dashboard over the same data.
///
/// Examples:
///   reviewlens count --input data/Video_Games.jsonl
///   reviewlens report --output-dir visualization_output
///   reviewlens report --format json --from-year 2015 --to-year 2020
///   reviewlens dashboard --bind 127.0.0.1:8050
///   reviewlens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .reviewlens.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .reviewlens.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Count verified reviews per month, sentiment, rating and product
    Count(CountArgs),

    /// Render the static chart report
    Report(ReportArgs),

    /// Serve the interactive dashboard
    Dashboard(DashboardArgs),
}

/// Input file overrides shared by `report` and `dashboard`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Aggregated review-count file
    #[arg(long, value_name = "FILE")]
    pub counts: Option<PathBuf>,

    /// Product metadata JSON lines
    #[arg(long, value_name = "FILE")]
    pub metadata: Option<PathBuf>,

    /// Detailed reviews with sentiment, JSON lines
    #[arg(long, value_name = "FILE")]
    pub reviews: Option<PathBuf>,

    /// Time zone used to bucket review timestamps
    #[arg(long, value_name = "TZ")]
    pub timezone: Option<TimeZoneMode>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct CountArgs {
    /// Raw review file, or a directory of *.jsonl / *.json files
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Output counts file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Time zone used to bucket review timestamps
    #[arg(long, value_name = "TZ")]
    pub timezone: Option<TimeZoneMode>,

    /// Skip reviews whose text is shorter than this
    #[arg(long, value_name = "CHARS")]
    pub min_text_len: Option<usize>,

    /// Also count reviews that are not verified purchases
    #[arg(long)]
    pub include_unverified: bool,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ReportArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Directory receiving the charts and the report
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format (html, json)
    #[arg(long, default_value = "html", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// First year included in the report
    #[arg(long, value_name = "YEAR")]
    pub from_year: Option<i32>,

    /// Last year included in the report
    #[arg(long, value_name = "YEAR")]
    pub to_year: Option<i32>,

    /// Share of low-rated reviews sampled for the word clouds (0.0 - 1.0)
    #[arg(long, value_name = "FRACTION")]
    pub sample_fraction: Option<f64>,

    /// Seed for the word-cloud sample
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct DashboardArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Listen address
    #[arg(short, long, value_name = "ADDR", env = "REVIEWLENS_BIND")]
    pub bind: Option<String>,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// HTML page referencing SVG charts (default)
    #[default]
    Html,
    /// JSON export of the aggregates
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Skip the rest for --init-config
        if self.init_config {
            return Ok(());
        }

        match &self.command {
            None => Err("A subcommand is required (count, report or dashboard)".to_string()),
            Some(Command::Report(cmd)) => cmd.validate(),
            Some(Command::Dashboard(cmd)) => cmd.validate(),
            Some(Command::Count(cmd)) => cmd.validate(),
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

impl ReportArgs {
    fn validate(&self) -> Result<(), String> {
        if let (Some(from), Some(to)) = (self.from_year, self.to_year) {
            if from > to {
                return Err(format!(
                    "--from-year ({}) must not be after --to-year ({})",
                    from, to
                ));
            }
        }

        if let Some(fraction) = self.sample_fraction {
            if !(0.0..=1.0).contains(&fraction) {
                return Err("Sample fraction must be between 0.0 and 1.0".to_string());
            }
        }

        Ok(())
    }
}

impl DashboardArgs {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref bind) = self.bind {
            bind.parse::<SocketAddr>()
                .map_err(|_| format!("Invalid listen address: {}", bind))?;
        }
        Ok(())
    }
}

impl CountArgs {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref input) = self.input {
            if !input.exists() {
                return Err(format!("Input path does not exist: {}", input.display()));
            }
        }
        Ok(())
    }
}
