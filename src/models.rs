//! Data models for the review analytics pipeline.
//!
//! This module contains the record shapes loaded from the input files,
//! the filter bounds shared by every aggregation, and the aggregate
//! tables handed to the renderers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Sentiment label computed upstream for each review.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
    /// Any label outside the three known ones, kept verbatim.
    Other(String),
}

impl Sentiment {
    /// Returns the label as it appears in the input files.
    pub fn as_str(&self) -> &str {
        match self {
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
            Sentiment::Positive => "positive",
            Sentiment::Other(s) => s,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Sentiment {
    fn from(s: &str) -> Self {
        match s {
            "negative" => Sentiment::Negative,
            "neutral" => Sentiment::Neutral,
            "positive" => Sentiment::Positive,
            other => Sentiment::Other(other.to_string()),
        }
    }
}

impl From<String> for Sentiment {
    fn from(s: String) -> Self {
        Sentiment::from(s.as_str())
    }
}

impl From<Sentiment> for String {
    fn from(s: Sentiment) -> Self {
        s.as_str().to_string()
    }
}

/// Star rating, always within 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Creates a rating, returning `None` outside 1..=5.
    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value).ok_or_else(|| format!("rating out of range: {}", value))
    }
}

impl From<Rating> for u8 {
    fn from(r: Rating) -> Self {
        r.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u8 = s
            .parse()
            .map_err(|_| format!("invalid rating: {:?}", s))?;
        if value.to_string() != s {
            return Err(format!("invalid rating: {:?}", s));
        }
        Rating::try_from(value)
    }
}

/// Composite key of an aggregated review-count line.
///
/// Serialized as `year-month-sentiment-rating-product_id`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CountKey {
    pub year: i32,
    /// Month exactly as written in the key (usually zero-padded).
    pub month: String,
    pub sentiment: Sentiment,
    pub rating: Rating,
    pub product_id: String,
}

impl fmt::Display for CountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}-{}",
            self.year, self.month, self.sentiment, self.rating, self.product_id
        )
    }
}

impl FromStr for CountKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('-').collect();
        let [year, month, sentiment, rating, product_id] = parts.as_slice() else {
            return Err(format!(
                "expected 5 hyphen-separated key fields, found {}",
                parts.len()
            ));
        };

        let year = year
            .parse::<i32>()
            .ok()
            .filter(|y| y.to_string() == *year)
            .ok_or_else(|| format!("invalid year: {:?}", year))?;

        Ok(CountKey {
            year,
            month: month.to_string(),
            sentiment: Sentiment::from(*sentiment),
            rating: rating.parse()?,
            product_id: product_id.to_string(),
        })
    }
}

/// One aggregated review-count record, enriched with the product title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountRecord {
    pub year: i32,
    pub month: String,
    pub sentiment: Sentiment,
    pub rating: Rating,
    pub product_id: String,
    pub count: u64,
    /// Title from the metadata table; `None` when the product is unknown.
    pub title: Option<String>,
}

impl CountRecord {
    /// Builds a record without a title from a parsed key.
    pub fn from_key(key: CountKey, count: u64) -> Self {
        Self {
            year: key.year,
            month: key.month,
            sentiment: key.sentiment,
            rating: key.rating,
            product_id: key.product_id,
            count,
            title: None,
        }
    }

    /// Rebuilds the composite key of this record.
    #[cfg(test)]
    pub fn key(&self) -> CountKey {
        CountKey {
            year: self.year,
            month: self.month.clone(),
            sentiment: self.sentiment.clone(),
            rating: self.rating,
            product_id: self.product_id.clone(),
        }
    }
}

/// Brand and topic mention flags derived from review text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Mentions {
    pub xbox: bool,
    pub nintendo: bool,
    pub sony: bool,
    pub controller: bool,
    pub halo: bool,
}

/// One detailed review row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewRecord {
    pub rating: Rating,
    /// Lowercased review title.
    pub title_text: String,
    /// Lowercased review body.
    pub review_text: String,
    pub sentiment: Option<Sentiment>,
    pub product_id: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub mentions: Mentions,
}

impl ReviewRecord {
    /// Calendar month bucket, present only when both year and month are.
    pub fn bucket(&self) -> Option<YearMonth> {
        match (self.year, self.month) {
            (Some(year), Some(month)) => Some(YearMonth { year, month }),
            _ => None,
        }
    }
}

/// Which text field of a review feeds a word cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    ReviewText,
    TitleText,
}

/// Calendar month granularity used for time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct YearMonth {
    pub year: i32,
    /// 1-based month.
    pub month: u32,
}

impl YearMonth {
    /// The following calendar month.
    pub fn next(self) -> Self {
        if self.month >= 12 {
            YearMonth {
                year: self.year + 1,
                month: 1,
            }
        } else {
            YearMonth {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Inclusive year and rating bounds applied before aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters {
    pub years: RangeInclusive<i32>,
    pub ratings: RangeInclusive<u8>,
}

impl Filters {
    /// Filters that keep every rating within the given years.
    pub fn years(years: RangeInclusive<i32>) -> Self {
        Self {
            years,
            ratings: Rating::MIN..=Rating::MAX,
        }
    }
}

/// One slice of a categorical distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub label: String,
    pub count: u64,
    pub percent: f64,
}

/// A categorical distribution, ordered by label.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Distribution {
    pub total: u64,
    pub slices: Vec<Slice>,
}

impl Distribution {
    /// Builds a distribution from `(label, count)` pairs in display order.
    pub fn from_counts(counts: Vec<(String, u64)>) -> Self {
        let total: u64 = counts.iter().map(|(_, c)| c).sum();
        let slices = counts
            .into_iter()
            .map(|(label, count)| Slice {
                label,
                count,
                percent: pct(count, total),
            })
            .collect();
        Self { total, slices }
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

/// Percentage of `part` in `total`, 0 when the total is 0.
pub fn pct(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// A labelled series of `(x label, value)` points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub points: Vec<(String, u64)>,
}

/// Per-product review total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductTotal {
    pub title: Option<String>,
    pub total: u64,
}

impl ProductTotal {
    /// Title for display, with a placeholder for unknown products.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("(unknown title)")
    }
}

/// Word and its frequency in a filtered corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

/// Run information shown at the top of a batch report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    /// First and last year covered, absent for an empty dataset.
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub count_records: usize,
    /// Sum of all counts in range.
    pub total_reviews: u64,
    pub detailed_reviews: usize,
    /// Reviews that fed the word clouds after sampling.
    pub sampled_reviews: usize,
}

/// Every aggregate the batch report presents.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    /// Most reviewed products regardless of rating.
    pub top_products: Vec<ProductTotal>,
    pub rating_distribution: Distribution,
    pub sentiment_distribution: Distribution,
    pub most_reviewed: Vec<ProductTotal>,
    pub least_reviewed: Vec<ProductTotal>,
    pub yearly_totals: Vec<(i32, u64)>,
    pub rating_trends: Vec<Series>,
    pub brand_mentions: Vec<Series>,
    pub review_words: Vec<WordCount>,
    pub title_words: Vec<WordCount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_key_roundtrip() {
        let raw = "2015-01-positive-5-B001";
        let key: CountKey = raw.parse().unwrap();
        assert_eq!(key.year, 2015);
        assert_eq!(key.month, "01");
        assert_eq!(key.sentiment, Sentiment::Positive);
        assert_eq!(key.rating.get(), 5);
        assert_eq!(key.product_id, "B001");
        assert_eq!(key.to_string(), raw);
    }

    #[test]
    fn test_count_key_roundtrip_unknown_sentiment() {
        let raw = "2019-7-mixed-3-B0XYZ";
        let key: CountKey = raw.parse().unwrap();
        assert_eq!(key.sentiment, Sentiment::Other("mixed".to_string()));
        assert_eq!(key.month, "7");
        assert_eq!(key.to_string(), raw);
    }

    #[test]
    fn test_count_key_rejects_bad_shapes() {
        assert!("2015-01-positive-5".parse::<CountKey>().is_err());
        assert!("2015-01-positive-5-B001-extra".parse::<CountKey>().is_err());
        assert!("20x5-01-positive-5-B001".parse::<CountKey>().is_err());
        assert!("2015-01-positive-6-B001".parse::<CountKey>().is_err());
        assert!("2015-01-positive-05-B001".parse::<CountKey>().is_err());
        assert!("+2015-01-positive-5-B001".parse::<CountKey>().is_err());
        assert!("02015-01-positive-5-B001".parse::<CountKey>().is_err());
    }

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::new(0).is_none());
        assert!(Rating::new(6).is_none());
        assert_eq!(Rating::new(3).map(Rating::get), Some(3));
    }

    #[test]
    fn test_sentiment_ordering_matches_labels() {
        let mut labels = vec![Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];
        labels.sort();
        let names: Vec<_> = labels.iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["negative", "neutral", "positive"]);
    }

    #[test]
    fn test_year_month_next_wraps() {
        let dec = YearMonth {
            year: 2020,
            month: 12,
        };
        assert_eq!(
            dec.next(),
            YearMonth {
                year: 2021,
                month: 1
            }
        );
        assert_eq!(dec.to_string(), "2020-12");
    }

    #[test]
    fn test_distribution_percentages() {
        let dist = Distribution::from_counts(vec![
            ("1".to_string(), 1),
            ("2".to_string(), 1),
            ("3".to_string(), 1),
        ]);
        let sum: f64 = dist.slices.iter().map(|s| s.percent).sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert_eq!(dist.total, 3);
    }

    #[test]
    fn test_pct_with_zero_total() {
        assert_eq!(pct(10, 0), 0.0);
        assert_eq!(pct(1, 4), 25.0);
    }
}
