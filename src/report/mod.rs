//! Batch report: aggregation, chart rendering and HTML/JSON output.

pub mod charts;
pub mod generator;

pub use generator::write_report;

use crate::analysis::{aggregator, text};
use crate::config::ReportConfig;
use crate::dataset::Snapshot;
use crate::models::{Rating, Report, ReportMetadata, TextField};
use chrono::Utc;
use std::ops::RangeInclusive;
use tracing::{debug, info};

/// Compute every aggregate of the batch report for the given years.
pub fn build_report(
    snapshot: &Snapshot,
    settings: &ReportConfig,
    years: RangeInclusive<i32>,
) -> Report {
    let counts = &snapshot.counts;
    let all_ratings = Rating::MIN..=Rating::MAX;

    let cloud_ratings = Rating::MIN..=settings.wordcloud_max_rating;
    let eligible = text::reviews_in_ratings(&snapshot.reviews, &cloud_ratings);
    let eligible_count = eligible.len();
    let sampled = text::sample(eligible, settings.sample_fraction, settings.sample_seed);
    info!(
        "Sampled {} of {} reviews rated {}..={} for word clouds",
        sampled.len(),
        eligible_count,
        cloud_ratings.start(),
        cloud_ratings.end()
    );

    let review_corpus = text::corpus(&sampled, TextField::ReviewText);
    let title_corpus = text::corpus(&sampled, TextField::TitleText);
    debug!(
        "Word cloud corpora: {} review chars, {} title chars",
        review_corpus.len(),
        title_corpus.len()
    );

    let metadata = ReportMetadata {
        generated_at: Utc::now(),
        first_year: snapshot.year_span().map(|span| *span.start().max(years.start())),
        last_year: snapshot.year_span().map(|span| *span.end().min(years.end())),
        count_records: counts.len(),
        total_reviews: aggregator::total_count(counts, &years),
        detailed_reviews: snapshot.reviews.len(),
        sampled_reviews: sampled.len(),
    };

    Report {
        metadata,
        top_products: aggregator::top_products(counts, &years, &all_ratings, settings.table_rows),
        rating_distribution: aggregator::rating_distribution(counts, &years),
        sentiment_distribution: aggregator::sentiment_distribution(counts, &years),
        most_reviewed: aggregator::top_products(
            counts,
            &years,
            &all_ratings,
            settings.bar_count,
        )
        .into_iter()
        .filter(|p| p.total >= settings.min_product_total)
        .collect(),
        least_reviewed: aggregator::bottom_products(
            counts,
            &years,
            &all_ratings,
            settings.min_product_total,
            settings.bar_count,
        ),
        yearly_totals: aggregator::yearly_totals(counts, &years),
        rating_trends: aggregator::rating_trends(counts, &years),
        brand_mentions: aggregator::brand_mentions(&snapshot.reviews, &years),
        review_words: text::word_frequencies(&review_corpus, settings.max_words),
        title_words: text::word_frequencies(&title_corpus, settings.max_words),
    }
}
