//! Filter and aggregate operators.
//!
//! Every operator takes the read-only record tables plus inclusive year
//! and/or rating bounds and returns a small aggregate table ready for
//! rendering. An empty filtered set always yields an empty aggregate.

use crate::models::{CountRecord, Distribution, ProductTotal, ReviewRecord, Series, YearMonth};
use std::collections::{BTreeMap, HashMap};
use std::ops::RangeInclusive;

/// Count records within the given years.
fn in_years<'a>(
    records: &'a [CountRecord],
    years: &'a RangeInclusive<i32>,
) -> impl Iterator<Item = &'a CountRecord> + 'a {
    records.iter().filter(move |r| years.contains(&r.year))
}

/// Reviews with a known year inside the given years.
fn reviews_in_years<'a>(
    reviews: &'a [ReviewRecord],
    years: &'a RangeInclusive<i32>,
) -> impl Iterator<Item = &'a ReviewRecord> + 'a {
    reviews
        .iter()
        .filter(move |r| r.year.is_some_and(|y| years.contains(&y)))
}

/// Sum of counts within the given years.
pub fn total_count(records: &[CountRecord], years: &RangeInclusive<i32>) -> u64 {
    in_years(records, years).map(|r| r.count).sum()
}

/// Review counts per rating, ordered by rating.
pub fn rating_distribution(records: &[CountRecord], years: &RangeInclusive<i32>) -> Distribution {
    let mut by_rating: BTreeMap<u8, u64> = BTreeMap::new();
    for record in in_years(records, years) {
        *by_rating.entry(record.rating.get()).or_default() += record.count;
    }

    Distribution::from_counts(
        by_rating
            .into_iter()
            .map(|(rating, count)| (rating.to_string(), count))
            .collect(),
    )
}

/// Review counts per sentiment label, ordered by label.
pub fn sentiment_distribution(
    records: &[CountRecord],
    years: &RangeInclusive<i32>,
) -> Distribution {
    let mut by_sentiment: BTreeMap<&str, u64> = BTreeMap::new();
    for record in in_years(records, years) {
        *by_sentiment.entry(record.sentiment.as_str()).or_default() += record.count;
    }

    Distribution::from_counts(
        by_sentiment
            .into_iter()
            .map(|(label, count)| (label.to_string(), count))
            .collect(),
    )
}

/// Total review count per year, ascending.
pub fn yearly_totals(records: &[CountRecord], years: &RangeInclusive<i32>) -> Vec<(i32, u64)> {
    let mut by_year: BTreeMap<i32, u64> = BTreeMap::new();
    for record in in_years(records, years) {
        *by_year.entry(record.year).or_default() += record.count;
    }
    by_year.into_iter().collect()
}

/// Review count per year for each rating, one series per rating.
pub fn rating_trends(records: &[CountRecord], years: &RangeInclusive<i32>) -> Vec<Series> {
    let mut pivot: BTreeMap<u8, BTreeMap<i32, u64>> = BTreeMap::new();
    for record in in_years(records, years) {
        *pivot
            .entry(record.rating.get())
            .or_default()
            .entry(record.year)
            .or_default() += record.count;
    }

    pivot
        .into_iter()
        .map(|(rating, per_year)| Series {
            name: rating.to_string(),
            points: per_year
                .into_iter()
                .map(|(year, count)| (year.to_string(), count))
                .collect(),
        })
        .collect()
}

/// Review totals per product title. Unknown titles form one group.
fn product_totals(
    records: &[CountRecord],
    years: &RangeInclusive<i32>,
    ratings: &RangeInclusive<u8>,
) -> Vec<ProductTotal> {
    let mut by_title: HashMap<Option<&str>, u64> = HashMap::new();
    for record in in_years(records, years).filter(|r| ratings.contains(&r.rating.get())) {
        *by_title.entry(record.title.as_deref()).or_default() += record.count;
    }

    by_title
        .into_iter()
        .map(|(title, total)| ProductTotal {
            title: title.map(String::from),
            total,
        })
        .collect()
}

/// Products with the most reviews, descending. Ties are ordered by title,
/// with unknown titles last.
pub fn top_products(
    records: &[CountRecord],
    years: &RangeInclusive<i32>,
    ratings: &RangeInclusive<u8>,
    n: usize,
) -> Vec<ProductTotal> {
    let mut totals = product_totals(records, years, ratings);
    totals.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| cmp_titles(a, b)));
    totals.truncate(n);
    totals
}

/// Products with the fewest reviews among those with at least
/// `min_total`, ascending.
pub fn bottom_products(
    records: &[CountRecord],
    years: &RangeInclusive<i32>,
    ratings: &RangeInclusive<u8>,
    min_total: u64,
    n: usize,
) -> Vec<ProductTotal> {
    let mut totals: Vec<ProductTotal> = product_totals(records, years, ratings)
        .into_iter()
        .filter(|p| p.total >= min_total)
        .collect();
    totals.sort_by(|a, b| a.total.cmp(&b.total).then_with(|| cmp_titles(a, b)));
    totals.truncate(n);
    totals
}

fn cmp_titles(a: &ProductTotal, b: &ProductTotal) -> std::cmp::Ordering {
    match (&a.title, &b.title) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    }
}

/// Every month from `first` to `last` inclusive.
fn month_range(first: YearMonth, last: YearMonth) -> Vec<YearMonth> {
    let mut months = Vec::new();
    let mut current = first;
    while current <= last {
        months.push(current);
        current = current.next();
    }
    months
}

/// Monthly xbox, nintendo and sony mention counts.
///
/// The month axis is continuous from the first to the last observed
/// month; months without reviews count zero.
pub fn brand_mentions(reviews: &[ReviewRecord], years: &RangeInclusive<i32>) -> Vec<Series> {
    let mut per_month: BTreeMap<YearMonth, [u64; 3]> = BTreeMap::new();
    for review in reviews_in_years(reviews, years) {
        let Some(bucket) = review.bucket() else {
            continue;
        };
        let sums = per_month.entry(bucket).or_default();
        sums[0] += review.mentions.xbox as u64;
        sums[1] += review.mentions.nintendo as u64;
        sums[2] += review.mentions.sony as u64;
    }

    let (Some(first), Some(last)) = (
        per_month.keys().next().copied(),
        per_month.keys().next_back().copied(),
    ) else {
        return Vec::new();
    };

    let months = month_range(first, last);
    ["Xbox", "Nintendo", "Sony"]
        .iter()
        .enumerate()
        .map(|(idx, name)| Series {
            name: name.to_string(),
            points: months
                .iter()
                .map(|m| {
                    let value = per_month.get(m).map(|s| s[idx]).unwrap_or(0);
                    (m.to_string(), value)
                })
                .collect(),
        })
        .collect()
}

/// Monthly count of controller-mentioning reviews, one series per
/// sentiment. Only observed month/sentiment combinations appear, and
/// reviews without a sentiment are left out.
pub fn controller_sentiment(reviews: &[ReviewRecord], years: &RangeInclusive<i32>) -> Vec<Series> {
    let mut pivot: BTreeMap<&str, BTreeMap<YearMonth, u64>> = BTreeMap::new();
    for review in reviews_in_years(reviews, years).filter(|r| r.mentions.controller) {
        let (Some(bucket), Some(sentiment)) = (review.bucket(), review.sentiment.as_ref()) else {
            continue;
        };
        *pivot
            .entry(sentiment.as_str())
            .or_default()
            .entry(bucket)
            .or_default() += 1;
    }

    pivot
        .into_iter()
        .map(|(sentiment, per_month)| Series {
            name: sentiment.to_string(),
            points: per_month
                .into_iter()
                .map(|(m, count)| (m.to_string(), count))
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::counts::{join_titles, parse_count_line};
    use crate::dataset::reviews::parse_review_line;
    use crate::dataset::TimeZoneMode;

    fn sample_counts() -> Vec<CountRecord> {
        let mut records: Vec<CountRecord> = [
            "2015-01-positive-5-B001\t10",
            "2015-02-negative-3-B002\t5",
            "2016-03-neutral-4-B001\t7",
            "2017-05-positive-5-B003\t2",
            "2017-06-negative-1-B003\t1",
        ]
        .iter()
        .map(|l| parse_count_line(l).unwrap())
        .collect();

        let titles: HashMap<String, String> = [
            ("B001".to_string(), "Game A".to_string()),
            ("B003".to_string(), "Game C".to_string()),
        ]
        .into_iter()
        .collect();
        join_titles(&mut records, &titles);
        records
    }

    // 2020-01-15, 2020-03-15, 2020-03-20 (UTC)
    const JAN: i64 = 1_579_046_400_000;
    const MAR: i64 = 1_584_230_400_000;
    const MAR_LATE: i64 = 1_584_662_400_000;

    fn review(text: &str, sentiment: &str, ts: Option<i64>) -> ReviewRecord {
        let line = match ts {
            Some(ts) => format!(
                r#"{{"rating": 3, "text": "{}", "sentiment": "{}", "timestamp": {}}}"#,
                text, sentiment, ts
            ),
            None => format!(
                r#"{{"rating": 3, "text": "{}", "sentiment": "{}"}}"#,
                text, sentiment
            ),
        };
        parse_review_line(&line, TimeZoneMode::Utc).unwrap()
    }

    #[test]
    fn test_top_products_end_to_end() {
        let records = sample_counts();
        let top = top_products(&records, &(2015..=2015), &(1..=5), 5);

        assert_eq!(
            top,
            vec![
                ProductTotal {
                    title: Some("Game A".to_string()),
                    total: 10
                },
                ProductTotal {
                    title: None,
                    total: 5
                },
            ]
        );
    }

    #[test]
    fn test_top_products_rating_filter() {
        let records = sample_counts();
        let top = top_products(&records, &(2015..=2017), &(4..=5), 10);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].title.as_deref(), Some("Game A"));
        assert_eq!(top[0].total, 17);
        assert_eq!(top[1].title.as_deref(), Some("Game C"));
        assert_eq!(top[1].total, 2);
    }

    #[test]
    fn test_top_products_truncates() {
        let records = sample_counts();
        assert_eq!(top_products(&records, &(2015..=2017), &(1..=5), 1).len(), 1);
    }

    #[test]
    fn test_bottom_products() {
        let records = sample_counts();
        let bottom = bottom_products(&records, &(2015..=2017), &(1..=5), 4, 10);
        let titles: Vec<_> = bottom.iter().map(|p| p.display_title()).collect();
        assert_eq!(titles, vec!["(unknown title)", "Game A"]);
    }

    #[test]
    fn test_rating_distribution_sums_to_100() {
        let records = sample_counts();
        let dist = rating_distribution(&records, &(2015..=2017));

        let labels: Vec<_> = dist.slices.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["1", "3", "4", "5"]);
        assert_eq!(dist.total, 25);

        let sum: f64 = dist.slices.iter().map(|s| s.percent).sum();
        assert!((sum - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_filter_yields_empty_aggregates() {
        let records = sample_counts();
        assert!(rating_distribution(&records, &(1990..=1991)).is_empty());
        assert!(yearly_totals(&records, &(1990..=1991)).is_empty());
        assert!(top_products(&records, &(1990..=1991), &(1..=5), 10).is_empty());
        assert!(rating_trends(&records, &(1990..=1991)).is_empty());
    }

    #[test]
    fn test_sentiment_distribution_ordered_by_label() {
        let records = sample_counts();
        let dist = sentiment_distribution(&records, &(2015..=2017));
        let labels: Vec<_> = dist.slices.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["negative", "neutral", "positive"]);
        assert_eq!(dist.slices[0].count, 6);
    }

    #[test]
    fn test_year_filter_matches_per_year_totals() {
        let records = sample_counts();
        let all = yearly_totals(&records, &(i32::MIN..=i32::MAX));
        assert_eq!(all, vec![(2015, 15), (2016, 7), (2017, 3)]);

        let filtered = total_count(&records, &(2016..=2017));
        let expected: u64 = all
            .iter()
            .filter(|(y, _)| (2016..=2017).contains(y))
            .map(|(_, c)| c)
            .sum();
        assert_eq!(filtered, expected);
    }

    #[test]
    fn test_rating_trends_pivot() {
        let records = sample_counts();
        let trends = rating_trends(&records, &(2015..=2017));
        let five = trends.iter().find(|s| s.name == "5").unwrap();
        assert_eq!(
            five.points,
            vec![("2015".to_string(), 10), ("2017".to_string(), 2)]
        );
    }

    #[test]
    fn test_brand_mentions_fills_missing_months() {
        let reviews = vec![
            review("my xbox broke", "negative", Some(JAN)),
            review("sony and nintendo", "positive", Some(MAR)),
            review("playstation again", "positive", Some(MAR_LATE)),
            review("xbox without a date", "neutral", None),
        ];

        let series = brand_mentions(&reviews, &(2020..=2020));
        assert_eq!(series.len(), 3);

        let xbox = &series[0];
        assert_eq!(xbox.name, "Xbox");
        assert_eq!(
            xbox.points,
            vec![
                ("2020-01".to_string(), 1),
                ("2020-02".to_string(), 0),
                ("2020-03".to_string(), 0)
            ]
        );
        let sony = &series[2];
        assert_eq!(sony.points[2], ("2020-03".to_string(), 2));
    }

    #[test]
    fn test_brand_mentions_empty() {
        let reviews = vec![review("xbox", "positive", Some(JAN))];
        assert!(brand_mentions(&reviews, &(2010..=2011)).is_empty());
    }

    #[test]
    fn test_controller_sentiment() {
        let reviews = vec![
            review("controller drift", "negative", Some(JAN)),
            review("controller is comfy", "positive", Some(MAR)),
            review("controller died", "negative", Some(MAR_LATE)),
            review("no mention", "negative", Some(MAR)),
        ];

        let series = controller_sentiment(&reviews, &(2020..=2020));
        let names: Vec<_> = series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["negative", "positive"]);
        assert_eq!(
            series[0].points,
            vec![("2020-01".to_string(), 1), ("2020-03".to_string(), 1)]
        );
    }
}
