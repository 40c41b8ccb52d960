//! Interactive dashboard.
//!
//! The page is a filter form plus one inline SVG per [`Panel`]. Changing a
//! filter reloads the page with new query parameters; each request
//! recomputes the panels from the shared snapshot.

pub mod page;
pub mod panels;
pub mod server;

pub use panels::{Panel, PanelLimits};
pub use server::{run, AppState};

use crate::dataset::Snapshot;
use crate::models::{Filters, Rating};
use std::ops::RangeInclusive;
use thiserror::Error;

/// Rejected filter query parameter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("invalid value for {param}: {value:?}")]
    InvalidNumber { param: String, value: String },

    #[error("{param} must be between 1 and 5, got {value}")]
    RatingOutOfRange { param: String, value: i64 },
}

/// Full year span of the snapshot and every rating.
pub fn default_filters(snapshot: &Snapshot) -> Filters {
    Filters::years(snapshot.year_span().unwrap_or(0..=0))
}

fn ordered<T: PartialOrd>(low: T, high: T) -> RangeInclusive<T> {
    if low > high {
        high..=low
    } else {
        low..=high
    }
}

fn parse_number(param: &str, value: &str) -> Result<i64, FilterError> {
    value.trim().parse().map_err(|_| FilterError::InvalidNumber {
        param: param.to_string(),
        value: value.to_string(),
    })
}

fn rating_bound(param: &str, value: i64) -> Result<u8, FilterError> {
    u8::try_from(value)
        .ok()
        .filter(|r| (Rating::MIN..=Rating::MAX).contains(r))
        .ok_or_else(|| FilterError::RatingOutOfRange {
            param: param.to_string(),
            value,
        })
}

/// Parse `year_min`, `year_max`, `rating_min` and `rating_max` from a
/// query string.
///
/// Missing parameters fall back to `defaults`, unknown ones are ignored
/// and inverted bounds are swapped.
pub fn parse_filters(query: Option<&str>, defaults: &Filters) -> Result<Filters, FilterError> {
    let mut year_min = *defaults.years.start();
    let mut year_max = *defaults.years.end();
    let mut rating_min = *defaults.ratings.start();
    let mut rating_max = *defaults.ratings.end();

    for pair in query.unwrap_or("").split('&').filter(|p| !p.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let Ok(key) = urlencoding::decode(raw_key) else {
            continue;
        };
        let key = &*key;
        if !matches!(key, "year_min" | "year_max" | "rating_min" | "rating_max") {
            continue;
        }
        let value = urlencoding::decode(raw_value).map_err(|_| FilterError::InvalidNumber {
            param: key.to_string(),
            value: raw_value.to_string(),
        })?;
        let value = &*value;
        match key {
            "year_min" | "year_max" => {
                let year = parse_number(key, value)?;
                let year = i32::try_from(year).map_err(|_| FilterError::InvalidNumber {
                    param: key.to_string(),
                    value: value.to_string(),
                })?;
                if key == "year_min" {
                    year_min = year;
                } else {
                    year_max = year;
                }
            }
            "rating_min" => rating_min = rating_bound(key, parse_number(key, value)?)?,
            "rating_max" => rating_max = rating_bound(key, parse_number(key, value)?)?,
            _ => {}
        }
    }

    Ok(Filters {
        years: ordered(year_min, year_max),
        ratings: ordered(rating_min, rating_max),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Filters {
        Filters::years(2010..=2023)
    }

    #[test]
    fn test_parse_filters_defaults() {
        assert_eq!(parse_filters(None, &defaults()).unwrap(), defaults());
        assert_eq!(parse_filters(Some(""), &defaults()).unwrap(), defaults());
    }

    #[test]
    fn test_parse_filters_values() {
        let filters = parse_filters(
            Some("year_min=2015&year_max=2018&rating_min=2&rating_max=4&foo=bar"),
            &defaults(),
        )
        .unwrap();
        assert_eq!(filters.years, 2015..=2018);
        assert_eq!(filters.ratings, 2..=4);
    }

    #[test]
    fn test_parse_filters_decodes_percent_escapes() {
        let filters =
            parse_filters(Some("rating_min=%33&year%5Fmax=2%30%31%35"), &defaults()).unwrap();
        assert_eq!(filters.ratings, 3..=5);
        assert_eq!(filters.years, 2010..=2015);

        assert!(parse_filters(Some("rating_min=%FF"), &defaults()).is_err());
        assert!(parse_filters(Some("other=%FF"), &defaults()).is_ok());
    }

    #[test]
    fn test_parse_filters_swaps_inverted_bounds() {
        let filters =
            parse_filters(Some("year_min=2020&year_max=2012&rating_min=5&rating_max=1"), &defaults())
                .unwrap();
        assert_eq!(filters.years, 2012..=2020);
        assert_eq!(filters.ratings, 1..=5);
    }

    #[test]
    fn test_parse_filters_rejects_bad_values() {
        assert_eq!(
            parse_filters(Some("year_min=abc"), &defaults()).unwrap_err(),
            FilterError::InvalidNumber {
                param: "year_min".to_string(),
                value: "abc".to_string()
            }
        );
        assert!(matches!(
            parse_filters(Some("rating_max=6"), &defaults()),
            Err(FilterError::RatingOutOfRange { value: 6, .. })
        ));
        assert!(parse_filters(Some("rating_min=-1"), &defaults()).is_err());
    }

    #[test]
    fn test_default_filters_use_snapshot_span() {
        assert_eq!(default_filters(&Snapshot::default()), Filters::years(0..=0));
    }
}
