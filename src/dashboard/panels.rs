//! Dashboard panels.
//!
//! Each panel recomputes its aggregate from the immutable snapshot and the
//! current filters. Computation is pure; rendering turns the aggregate
//! into SVG with the shared chart renderers.

use crate::analysis::{aggregator, text};
use crate::dataset::Snapshot;
use crate::models::{Distribution, Filters, ProductTotal, Series, TextField, WordCount};
use crate::report::charts;
use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Size limits applied when computing panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelLimits {
    pub top_products: usize,
    pub max_words: usize,
}

impl Default for PanelLimits {
    fn default() -> Self {
        Self {
            top_products: 10,
            max_words: 100,
        }
    }
}

/// One dashboard component, identified by its element id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    RatingPie,
    SentimentPie,
    YearlyTrend,
    RatingTrends,
    TopProducts,
    BrandMentions,
    ControllerSentiment,
    ReviewWordCloud,
    TitleWordCloud,
}

/// Aggregate behind a panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum PanelData {
    Distribution(Distribution),
    Series(Vec<Series>),
    Products(Vec<ProductTotal>),
    Words(Vec<WordCount>),
}

impl Panel {
    /// Every panel in page order.
    pub const ALL: [Panel; 9] = [
        Panel::RatingPie,
        Panel::SentimentPie,
        Panel::YearlyTrend,
        Panel::RatingTrends,
        Panel::TopProducts,
        Panel::BrandMentions,
        Panel::ControllerSentiment,
        Panel::ReviewWordCloud,
        Panel::TitleWordCloud,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Panel::RatingPie => "rating-pie-chart",
            Panel::SentimentPie => "sentiment-pie-chart",
            Panel::YearlyTrend => "yearly-trend-chart",
            Panel::RatingTrends => "rating-trends-chart",
            Panel::TopProducts => "top-products-chart",
            Panel::BrandMentions => "brand-mentions-chart",
            Panel::ControllerSentiment => "controller-sentiment-chart",
            Panel::ReviewWordCloud => "wordcloud-image",
            Panel::TitleWordCloud => "wordcloud-title-image",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Panel::RatingPie => "Rating Distribution",
            Panel::SentimentPie => "Sentiment Distribution",
            Panel::YearlyTrend => "Review Count by Year",
            Panel::RatingTrends => "Rating Trends Over Time",
            Panel::TopProducts => "Top Products by Review Count",
            Panel::BrandMentions => "Brand Mentions Over Time",
            Panel::ControllerSentiment => "Controller Mentions by Sentiment Over Time",
            Panel::ReviewWordCloud => "Review Text Word Cloud",
            Panel::TitleWordCloud => "Review Title Word Cloud",
        }
    }

    /// Compute the panel with default limits.
    #[cfg(test)]
    pub fn compute(self, snapshot: &Snapshot, filters: &Filters) -> PanelData {
        self.compute_with(snapshot, filters, &PanelLimits::default())
    }

    /// Compute the panel aggregate for the given filters.
    ///
    /// Word clouds only honour the rating bounds, the top-products panel
    /// honours both, every other panel only the year bounds.
    pub fn compute_with(
        self,
        snapshot: &Snapshot,
        filters: &Filters,
        limits: &PanelLimits,
    ) -> PanelData {
        let counts = &snapshot.counts;
        let years = &filters.years;

        match self {
            Panel::RatingPie => {
                PanelData::Distribution(aggregator::rating_distribution(counts, years))
            }
            Panel::SentimentPie => {
                PanelData::Distribution(aggregator::sentiment_distribution(counts, years))
            }
            Panel::YearlyTrend => {
                let points: Vec<(String, u64)> = aggregator::yearly_totals(counts, years)
                    .into_iter()
                    .map(|(year, total)| (year.to_string(), total))
                    .collect();
                if points.is_empty() {
                    PanelData::Series(Vec::new())
                } else {
                    PanelData::Series(vec![Series {
                        name: "Review Count".to_string(),
                        points,
                    }])
                }
            }
            Panel::RatingTrends => PanelData::Series(aggregator::rating_trends(counts, years)),
            Panel::TopProducts => PanelData::Products(aggregator::top_products(
                counts,
                years,
                &filters.ratings,
                limits.top_products,
            )),
            Panel::BrandMentions => {
                PanelData::Series(aggregator::brand_mentions(&snapshot.reviews, years))
            }
            Panel::ControllerSentiment => {
                PanelData::Series(aggregator::controller_sentiment(&snapshot.reviews, years))
            }
            Panel::ReviewWordCloud | Panel::TitleWordCloud => {
                let field = if self == Panel::ReviewWordCloud {
                    TextField::ReviewText
                } else {
                    TextField::TitleText
                };
                let corpus = text::filtered_corpus(&snapshot.reviews, &filters.ratings, field);
                PanelData::Words(text::word_frequencies(&corpus, limits.max_words))
            }
        }
    }

    /// Render a computed aggregate as SVG.
    pub fn render(self, data: &PanelData) -> Result<String> {
        let title = self.title();
        match data {
            PanelData::Distribution(dist) => charts::pie_chart(title, dist),
            PanelData::Products(products) => charts::hbar_chart(title, products),
            PanelData::Words(words) => charts::word_cloud(title, words),
            PanelData::Series(series) => {
                let (x_desc, y_desc) = match self {
                    Panel::YearlyTrend | Panel::RatingTrends => ("Year", "Review Count"),
                    Panel::BrandMentions => ("Date", "Number of Mentions"),
                    _ => ("Date", "Number of Reviews"),
                };
                charts::line_chart(title, x_desc, y_desc, series)
            }
        }
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Panel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Panel::ALL
            .into_iter()
            .find(|p| p.id() == s)
            .ok_or_else(|| format!("unknown panel: {}", s))
    }
}
