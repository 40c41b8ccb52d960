//! Review counting job.
//!
//! Reads raw review JSON lines, keeps verified reviews with enough text and
//! counts them per `year-month-sentiment-rating-product_id` key. The output
//! is the `KEY\tCOUNT` file the dataset loader reads.

use crate::dataset::TimeZoneMode;
use crate::models::{CountKey, Rating, Sentiment};
use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Filters and calendar settings for one counting run.
#[derive(Debug, Clone, Copy)]
pub struct CountOptions {
    pub min_text_len: usize,
    pub verified_only: bool,
    pub timezone: TimeZoneMode,
}

impl Default for CountOptions {
    fn default() -> Self {
        Self {
            min_text_len: 10,
            verified_only: true,
            timezone: TimeZoneMode::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawReview {
    rating: f64,
    text: String,
    /// Milliseconds since the epoch, integral or float.
    timestamp: f64,
    sentiment: String,
    asin: String,
    #[serde(default)]
    verified_purchase: bool,
}

/// What happened to a single input line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Counted(CountKey),
    TooShort,
    Unverified,
}

/// Tally of a counting run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountSummary {
    pub files: usize,
    pub lines: usize,
    pub counted: usize,
    pub too_short: usize,
    pub unverified: usize,
    pub malformed: usize,
    pub keys: usize,
}

/// Classify one raw review line. Errors describe unparseable lines.
pub fn classify_line(line: &str, options: &CountOptions) -> Result<LineOutcome, String> {
    let raw: RawReview = serde_json::from_str(line).map_err(|e| e.to_string())?;

    if raw.text.chars().count() < options.min_text_len {
        return Ok(LineOutcome::TooShort);
    }
    if options.verified_only && !raw.verified_purchase {
        return Ok(LineOutcome::Unverified);
    }

    if !raw.rating.is_finite() || raw.rating < 0.0 {
        return Err(format!("invalid rating {}", raw.rating));
    }
    let rating = Rating::new(raw.rating as u8)
        .ok_or_else(|| format!("rating out of range: {}", raw.rating))?;

    // Key fields are hyphen separated.
    for (name, value) in [("sentiment", &raw.sentiment), ("asin", &raw.asin)] {
        if value.is_empty() || value.contains('-') {
            return Err(format!("unusable {} {:?}", name, value));
        }
    }

    if !raw.timestamp.is_finite() {
        return Err(format!("invalid timestamp {}", raw.timestamp));
    }
    let (year, month) = options
        .timezone
        .year_month(raw.timestamp.trunc() as i64)
        .ok_or_else(|| format!("timestamp out of range: {}", raw.timestamp))?;

    Ok(LineOutcome::Counted(CountKey {
        year,
        month: format!("{:02}", month),
        sentiment: Sentiment::from(raw.sentiment),
        rating,
        product_id: raw.asin,
    }))
}

/// Count every line of `content` into `counts`.
pub fn count_content(
    content: &str,
    options: &CountOptions,
    counts: &mut BTreeMap<String, u64>,
    summary: &mut CountSummary,
) {
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        summary.lines += 1;

        match classify_line(line, options) {
            Ok(LineOutcome::Counted(key)) => {
                summary.counted += 1;
                *counts.entry(key.to_string()).or_default() += 1;
            }
            Ok(LineOutcome::TooShort) => summary.too_short += 1,
            Ok(LineOutcome::Unverified) => summary.unverified += 1,
            Err(reason) => {
                summary.malformed += 1;
                warn!("Failed to parse line ({}): {}", reason, truncate(line, 120));
            }
        }
    }
}

fn truncate(line: &str, max_chars: usize) -> String {
    if line.chars().count() <= max_chars {
        line.to_string()
    } else {
        let head: String = line.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

/// The input file itself, or every `*.jsonl` / `*.json` file below a
/// directory, sorted.
pub fn collect_inputs(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        bail!("Input path does not exist: {}", path.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("jsonl") | Some("json")
            )
        })
        .collect();
    files.sort();

    if files.is_empty() {
        bail!("No *.jsonl or *.json files under {}", path.display());
    }
    Ok(files)
}

/// Render counts as sorted `KEY\tCOUNT` lines.
pub fn format_counts(counts: &BTreeMap<String, u64>) -> String {
    let mut out = String::new();
    for (key, count) in counts {
        let _ = writeln!(out, "{}\t{}", key, count);
    }
    out
}

/// Count reviews from `input` and write the counts file to `output`.
pub fn run_count(
    input: &Path,
    output: &Path,
    options: &CountOptions,
    show_progress: bool,
) -> Result<CountSummary> {
    let files = collect_inputs(input)?;
    debug!("Counting {} input file(s)", files.len());

    let progress = if show_progress {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut counts = BTreeMap::new();
    let mut summary = CountSummary {
        files: files.len(),
        ..Default::default()
    };

    for file in &files {
        progress.set_message(file.display().to_string());
        let content = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        count_content(&content, options, &mut counts, &mut summary);
        progress.inc(1);
    }
    progress.finish_and_clear();

    summary.keys = counts.len();

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    std::fs::write(output, format_counts(&counts))
        .with_context(|| format!("Failed to write counts to {}", output.display()))?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::counts::load_counts;
    use tempfile::TempDir;

    // 2020-01-15T00:00:00Z
    const JAN_2020: i64 = 1_579_046_400_000;

    fn utc() -> CountOptions {
        CountOptions {
            timezone: TimeZoneMode::Utc,
            ..Default::default()
        }
    }

    fn review(text: &str, verified: bool, rating: f64) -> String {
        format!(
            r#"{{"rating": {}, "title": "t", "text": "{}", "timestamp": {}, "sentiment": "positive", "asin": "B00X", "verified_purchase": {}}}"#,
            rating, text, JAN_2020, verified
        )
    }

    #[test]
    fn test_classify_line_counts_verified_review() {
        let outcome = classify_line(&review("Really fun game", true, 5.0), &utc()).unwrap();
        let LineOutcome::Counted(key) = outcome else {
            panic!("expected a counted review");
        };
        assert_eq!(key.to_string(), "2020-01-positive-5-B00X");
    }

    #[test]
    fn test_classify_line_accepts_float_timestamp() {
        let line = r#"{"rating": 4, "text": "Plays great on my tv", "timestamp": 1579046400000.0, "sentiment": "positive", "asin": "B00X", "verified_purchase": true}"#;
        let LineOutcome::Counted(key) = classify_line(line, &utc()).unwrap() else {
            panic!("expected a counted review");
        };
        assert_eq!(key.to_string(), "2020-01-positive-4-B00X");
    }

    #[test]
    fn test_classify_line_skips_short_and_unverified() {
        assert_eq!(
            classify_line(&review("too short", true, 4.0), &utc()).unwrap(),
            LineOutcome::TooShort
        );
        assert_eq!(
            classify_line(&review("long enough text", false, 4.0), &utc()).unwrap(),
            LineOutcome::Unverified
        );

        let relaxed = CountOptions {
            verified_only: false,
            ..utc()
        };
        assert!(matches!(
            classify_line(&review("long enough text", false, 4.0), &relaxed).unwrap(),
            LineOutcome::Counted(_)
        ));
    }

    #[test]
    fn test_classify_line_rejects_bad_rows() {
        assert!(classify_line("{not json", &utc()).is_err());
        assert!(classify_line(&review("long enough text", true, 0.0), &utc()).is_err());
        assert!(classify_line(
            r#"{"rating": 3, "text": "long enough text", "timestamp": 1, "sentiment": "neutral", "asin": "B-1", "verified_purchase": true}"#,
            &utc()
        )
        .is_err());
    }

    #[test]
    fn test_count_content_aggregates_sorted() {
        let content = [
            review("Great fun all round", true, 5.0),
            review("Great fun all round", true, 5.0),
            review("Meh, it was fine", true, 3.7),
            review("short", true, 1.0),
            "garbage".to_string(),
        ]
        .join("\n");

        let mut counts = BTreeMap::new();
        let mut summary = CountSummary::default();
        count_content(&content, &utc(), &mut counts, &mut summary);

        assert_eq!(summary.lines, 5);
        assert_eq!(summary.counted, 3);
        assert_eq!(summary.too_short, 1);
        assert_eq!(summary.malformed, 1);
        assert_eq!(
            format_counts(&counts),
            "2020-01-positive-3-B00X\t1\n2020-01-positive-5-B00X\t2\n"
        );
    }

    #[test]
    fn test_run_count_over_directory() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("raw");
        std::fs::create_dir_all(raw.join("nested")).unwrap();
        std::fs::write(raw.join("a.jsonl"), review("Great fun all round", true, 5.0)).unwrap();
        std::fs::write(
            raw.join("nested").join("b.json"),
            review("Great fun all round", true, 5.0),
        )
        .unwrap();
        std::fs::write(raw.join("notes.txt"), "ignored").unwrap();

        let output = dir.path().join("out").join("part-r-00000");
        let summary = run_count(&raw, &output, &utc(), false).unwrap();

        assert_eq!(summary.files, 2);
        assert_eq!(summary.counted, 2);
        assert_eq!(summary.keys, 1);

        // The output is readable by the counts loader.
        let records = load_counts(&output).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].count, 2);
        assert_eq!(records[0].key().to_string(), "2020-01-positive-5-B00X");
    }

    #[test]
    fn test_collect_inputs_missing_path() {
        let dir = TempDir::new().unwrap();
        assert!(collect_inputs(&dir.path().join("nope")).is_err());
        assert!(collect_inputs(dir.path()).is_err());
    }
}
