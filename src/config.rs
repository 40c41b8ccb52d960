//! Configuration file handling.
//!
//! This module handles loading `.reviewlens.toml` and merging it with
//! command-line overrides.

use crate::dataset::{InputPaths, TimeZoneMode};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".reviewlens.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Input file locations.
    #[serde(default)]
    pub input: InputConfig,

    /// Batch report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Dashboard server settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Counting job settings.
    #[serde(default)]
    pub count: CountConfig,
}

/// Input file locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Aggregated review counts (`KEY\tCOUNT` lines).
    #[serde(default = "default_counts")]
    pub counts: PathBuf,

    /// Product metadata JSON lines.
    #[serde(default = "default_metadata")]
    pub metadata: PathBuf,

    /// Detailed reviews with sentiment, JSON lines.
    #[serde(default = "default_reviews")]
    pub reviews: PathBuf,

    /// Time zone for turning review timestamps into months.
    #[serde(default)]
    pub timezone: TimeZoneMode,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            counts: default_counts(),
            metadata: default_metadata(),
            reviews: default_reviews(),
            timezone: TimeZoneMode::default(),
        }
    }
}

impl InputConfig {
    pub fn paths(&self) -> InputPaths {
        InputPaths {
            counts: self.counts.clone(),
            metadata: self.metadata.clone(),
            reviews: self.reviews.clone(),
        }
    }
}

fn default_counts() -> PathBuf {
    PathBuf::from("data/part-r-00000")
}

fn default_metadata() -> PathBuf {
    PathBuf::from("data/meta_Video_Games.jsonl")
}

fn default_reviews() -> PathBuf {
    PathBuf::from("data/Video_Games_with_sentiment.jsonl")
}

/// Batch report settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory receiving the charts and the report.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Rows in the top-products table.
    #[serde(default = "default_table_rows")]
    pub table_rows: usize,

    /// Bars in the top and bottom product charts.
    #[serde(default = "default_bar_count")]
    pub bar_count: usize,

    /// Minimum review total for a product to appear in the bar charts.
    #[serde(default = "default_min_product_total")]
    pub min_product_total: u64,

    /// Highest rating included in the word clouds.
    #[serde(default = "default_wordcloud_max_rating")]
    pub wordcloud_max_rating: u8,

    /// Share of eligible reviews sampled for the word clouds.
    #[serde(default = "default_sample_fraction")]
    pub sample_fraction: f64,

    /// Seed for the word-cloud sample.
    #[serde(default = "default_sample_seed")]
    pub sample_seed: u64,

    /// Words drawn per cloud.
    #[serde(default = "default_report_max_words")]
    pub max_words: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            table_rows: default_table_rows(),
            bar_count: default_bar_count(),
            min_product_total: default_min_product_total(),
            wordcloud_max_rating: default_wordcloud_max_rating(),
            sample_fraction: default_sample_fraction(),
            sample_seed: default_sample_seed(),
            max_words: default_report_max_words(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("visualization_output")
}

fn default_table_rows() -> usize {
    5
}

fn default_bar_count() -> usize {
    10
}

fn default_min_product_total() -> u64 {
    1000
}

fn default_wordcloud_max_rating() -> u8 {
    2
}

fn default_sample_fraction() -> f64 {
    0.1
}

fn default_sample_seed() -> u64 {
    42
}

fn default_report_max_words() -> usize {
    200
}

/// Dashboard server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Listen address.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Bars in the top-products panel.
    #[serde(default = "default_bar_count")]
    pub top_products: usize,

    /// Words drawn per cloud.
    #[serde(default = "default_dashboard_max_words")]
    pub max_words: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            top_products: default_bar_count(),
            max_words: default_dashboard_max_words(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8050".to_string()
}

fn default_dashboard_max_words() -> usize {
    100
}

/// Counting job settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountConfig {
    /// Raw review file, or a directory of `*.jsonl` / `*.json` files.
    #[serde(default = "default_raw_input")]
    pub input: PathBuf,

    /// Where the counts file is written.
    #[serde(default = "default_counts")]
    pub output: PathBuf,

    /// Reviews with shorter text are skipped.
    #[serde(default = "default_min_text_len")]
    pub min_text_len: usize,

    /// Skip reviews that are not verified purchases.
    #[serde(default = "default_true")]
    pub verified_only: bool,
}

impl Default for CountConfig {
    fn default() -> Self {
        Self {
            input: default_raw_input(),
            output: default_counts(),
            min_text_len: default_min_text_len(),
            verified_only: true,
        }
    }
}

fn default_raw_input() -> PathBuf {
    PathBuf::from("data/Video_Games.jsonl")
}

fn default_min_text_len() -> usize {
    10
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Reject values no run could use.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.report.sample_fraction) {
            bail!("report.sample_fraction must be between 0.0 and 1.0");
        }
        if !(1..=5).contains(&self.report.wordcloud_max_rating) {
            bail!("report.wordcloud_max_rating must be between 1 and 5");
        }
        if self.report.table_rows == 0 || self.report.bar_count == 0 {
            bail!("report.table_rows and report.bar_count must be at least 1");
        }
        if self.dashboard.top_products == 0 {
            bail!("dashboard.top_products must be at least 1");
        }
        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings. Only
    /// values given explicitly on the command line override.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        use crate::cli::Command;

        let inputs = match &args.command {
            Some(Command::Report(cmd)) => Some(&cmd.input),
            Some(Command::Dashboard(cmd)) => Some(&cmd.input),
            _ => None,
        };
        if let Some(inputs) = inputs {
            if let Some(ref counts) = inputs.counts {
                self.input.counts = counts.clone();
            }
            if let Some(ref metadata) = inputs.metadata {
                self.input.metadata = metadata.clone();
            }
            if let Some(ref reviews) = inputs.reviews {
                self.input.reviews = reviews.clone();
            }
            if let Some(tz) = inputs.timezone {
                self.input.timezone = tz;
            }
        }

        match &args.command {
            Some(Command::Report(cmd)) => {
                if let Some(ref dir) = cmd.output_dir {
                    self.report.output_dir = dir.clone();
                }
                if let Some(fraction) = cmd.sample_fraction {
                    self.report.sample_fraction = fraction;
                }
                if let Some(seed) = cmd.seed {
                    self.report.sample_seed = seed;
                }
            }
            Some(Command::Dashboard(cmd)) => {
                if let Some(ref bind) = cmd.bind {
                    self.dashboard.bind = bind.clone();
                }
            }
            Some(Command::Count(cmd)) => {
                if let Some(ref input) = cmd.input {
                    self.count.input = input.clone();
                }
                if let Some(ref output) = cmd.output {
                    self.count.output = output.clone();
                }
                if let Some(tz) = cmd.timezone {
                    self.input.timezone = tz;
                }
                if let Some(len) = cmd.min_text_len {
                    self.count.min_text_len = len;
                }
                if cmd.include_unverified {
                    self.count.verified_only = false;
                }
            }
            None => {}
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
