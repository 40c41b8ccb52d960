//! Detailed review loader.
//!
//! Each JSON line becomes a [`ReviewRecord`] with lowercased text, a
//! calendar bucket derived from the millisecond timestamp and the brand
//! mention flags. Lines that fail to parse are skipped without error.

use super::DatasetError;
use crate::models::{Mentions, Rating, ReviewRecord, Sentiment};
use chrono::{DateTime, Datelike, Local, TimeZone, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

const XBOX_KEYWORDS: &[&str] = &["microsoft", "xbox"];
const NINTENDO_KEYWORDS: &[&str] = &["nintendo", "switch"];
const SONY_KEYWORDS: &[&str] = &["sony", "playstation"];
const CONTROLLER_KEYWORDS: &[&str] = &["controller"];
const HALO_KEYWORDS: &[&str] = &["halo"];

/// Time zone used to turn review timestamps into calendar months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimeZoneMode {
    /// The machine's local time zone.
    #[default]
    Local,
    Utc,
}

impl TimeZoneMode {
    /// Convert a millisecond epoch timestamp to `(year, month)`.
    pub fn year_month(self, millis: i64) -> Option<(i32, u32)> {
        match self {
            TimeZoneMode::Local => Local
                .timestamp_millis_opt(millis)
                .single()
                .map(|dt: DateTime<Local>| (dt.year(), dt.month())),
            TimeZoneMode::Utc => Utc
                .timestamp_millis_opt(millis)
                .single()
                .map(|dt: DateTime<Utc>| (dt.year(), dt.month())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawReview {
    rating: f64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    sentiment: Option<String>,
    #[serde(default)]
    asin: Option<String>,
    /// Milliseconds since the epoch, integral or float.
    #[serde(default)]
    timestamp: Option<f64>,
}

/// Compute the mention flags for already-lowercased text.
pub fn detect_mentions(text: &str) -> Mentions {
    let any = |keywords: &[&str]| keywords.iter().any(|kw| text.contains(kw));

    Mentions {
        xbox: any(XBOX_KEYWORDS),
        nintendo: any(NINTENDO_KEYWORDS),
        sony: any(SONY_KEYWORDS),
        controller: any(CONTROLLER_KEYWORDS),
        halo: any(HALO_KEYWORDS),
    }
}

/// Parse one review line. Returns `None` for anything malformed.
pub fn parse_review_line(line: &str, tz: TimeZoneMode) -> Option<ReviewRecord> {
    let raw: RawReview = serde_json::from_str(line).ok()?;

    if !raw.rating.is_finite() || !(1.0..6.0).contains(&raw.rating) {
        return None;
    }
    let rating = Rating::new(raw.rating as u8)?;

    let title_text = raw.title.to_lowercase();
    let review_text = raw.text.to_lowercase();
    let combined = format!("{} {}", title_text, review_text);
    let mentions = detect_mentions(&combined);

    // A zero timestamp counts as absent.
    let millis = raw
        .timestamp
        .filter(|ts| ts.is_finite())
        .map(|ts| ts.trunc() as i64)
        .filter(|ts| *ts != 0);
    let (year, month) = match millis {
        Some(ts) => match tz.year_month(ts) {
            Some((y, m)) => (Some(y), Some(m)),
            None => (None, None),
        },
        None => (None, None),
    };

    Some(ReviewRecord {
        rating,
        title_text,
        review_text,
        sentiment: raw.sentiment.map(Sentiment::from),
        product_id: raw.asin,
        year,
        month,
        mentions,
    })
}

/// Parse review lines, dropping malformed ones.
pub fn parse_reviews(
    content: &str,
    tz: TimeZoneMode,
    progress: &ProgressBar,
) -> Vec<ReviewRecord> {
    let mut reviews = Vec::new();
    let mut skipped = 0usize;

    for line in content.lines() {
        progress.inc(1);
        if line.trim().is_empty() {
            continue;
        }
        match parse_review_line(line, tz) {
            Some(review) => reviews.push(review),
            None => skipped += 1,
        }
    }

    debug!("Parsed {} reviews, skipped {}", reviews.len(), skipped);
    reviews
}

/// Load every parseable review from a JSON-lines file.
pub fn load_reviews(
    path: &Path,
    tz: TimeZoneMode,
    show_progress: bool,
) -> Result<Vec<ReviewRecord>, DatasetError> {
    let content = std::fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;

    let progress = if show_progress {
        let pb = ProgressBar::new(content.lines().count() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("   {spinner:.green} reviews [{bar:30.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let reviews = parse_reviews(&content, tz, &progress);
    progress.finish_and_clear();

    debug!("Loaded {} reviews from {}", reviews.len(), path.display());
    Ok(reviews)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2021-06-15T12:00:00Z
    const MID_JUNE_2021: i64 = 1_623_758_400_000;

    #[test]
    fn test_parse_review_line() {
        let line = format!(
            r#"{{"rating": 4.0, "title": "Great XBOX game", "text": "Works with my Controller", "sentiment": "positive", "asin": "B001", "timestamp": {}}}"#,
            MID_JUNE_2021
        );
        let review = parse_review_line(&line, TimeZoneMode::Utc).unwrap();

        assert_eq!(review.rating.get(), 4);
        assert_eq!(review.title_text, "great xbox game");
        assert_eq!(review.review_text, "works with my controller");
        assert_eq!(review.sentiment, Some(Sentiment::Positive));
        assert_eq!(review.product_id.as_deref(), Some("B001"));
        assert_eq!(review.year, Some(2021));
        assert_eq!(review.month, Some(6));
        assert!(review.mentions.xbox);
        assert!(review.mentions.controller);
        assert!(!review.mentions.sony);
        assert!(!review.mentions.nintendo);
        assert!(!review.mentions.halo);
    }

    #[test]
    fn test_parse_review_line_without_timestamp() {
        let line = r#"{"rating": 2, "title": "meh", "text": "halo was better"}"#;
        let review = parse_review_line(line, TimeZoneMode::Utc).unwrap();
        assert_eq!(review.year, None);
        assert_eq!(review.month, None);
        assert!(review.bucket().is_none());
        assert!(review.mentions.halo);
        assert_eq!(review.sentiment, None);
    }

    #[test]
    fn test_parse_review_line_float_timestamp() {
        let line = r#"{"rating": 5, "title": "x", "text": "sony", "timestamp": 1623758400000.0}"#;
        let review = parse_review_line(line, TimeZoneMode::Utc).unwrap();
        assert_eq!(review.year, Some(2021));
        assert_eq!(review.month, Some(6));
        assert!(review.mentions.sony);

        let line = r#"{"rating": 5, "title": "x", "text": "y", "timestamp": null}"#;
        let review = parse_review_line(line, TimeZoneMode::Utc).unwrap();
        assert_eq!((review.year, review.month), (None, None));
    }

    #[test]
    fn test_parse_review_line_malformed() {
        assert!(parse_review_line("not json", TimeZoneMode::Utc).is_none());
        assert!(parse_review_line(r#"{"title": "no rating"}"#, TimeZoneMode::Utc).is_none());
        assert!(parse_review_line(r#"{"rating": 9}"#, TimeZoneMode::Utc).is_none());
        assert!(parse_review_line(r#"{"rating": 3, "title": null}"#, TimeZoneMode::Utc).is_none());
    }

    #[test]
    fn test_detect_mentions_substring() {
        let m = detect_mentions("the nintendo switch beats my playstation");
        assert!(m.nintendo);
        assert!(m.sony);
        assert!(!m.xbox);
    }

    #[test]
    fn test_parse_reviews_skips_bad_lines() {
        let content = format!(
            "{}\n{{broken\n\n{}\n",
            r#"{"rating": 5, "text": "fun"}"#, r#"{"rating": 1, "text": "bad"}"#
        );
        let reviews = parse_reviews(&content, TimeZoneMode::Utc, &ProgressBar::hidden());
        assert_eq!(reviews.len(), 2);
    }

    #[test]
    fn test_utc_year_month() {
        assert_eq!(TimeZoneMode::Utc.year_month(MID_JUNE_2021), Some((2021, 6)));
    }

    #[test]
    fn test_local_year_month_follows_local_zone() {
        let local = Local.timestamp_millis_opt(MID_JUNE_2021).single().unwrap();
        assert_eq!(
            TimeZoneMode::Local.year_month(MID_JUNE_2021),
            Some((local.year(), local.month()))
        );
    }
}
