//! Input loading.
//!
//! This module reads the three input tables (aggregated counts, product
//! metadata, detailed reviews) and assembles them into an immutable
//! [`Snapshot`] that every aggregation works from.

pub mod counts;
mod error;
pub mod metadata;
pub mod reviews;

pub use error::DatasetError;
pub use reviews::TimeZoneMode;

use crate::models::{CountRecord, ReviewRecord};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use tracing::info;

/// Locations of the three input files.
#[derive(Debug, Clone)]
pub struct InputPaths {
    pub counts: PathBuf,
    pub metadata: PathBuf,
    pub reviews: PathBuf,
}

/// Read-only view of the loaded dataset.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Count records with titles joined in.
    pub counts: Vec<CountRecord>,
    pub reviews: Vec<ReviewRecord>,
}

impl Snapshot {
    /// Build a snapshot from already-loaded tables.
    pub fn new(counts: Vec<CountRecord>, reviews: Vec<ReviewRecord>) -> Self {
        Self { counts, reviews }
    }

    /// Load all inputs and join titles onto the count records.
    pub fn load(
        paths: &InputPaths,
        tz: TimeZoneMode,
        show_progress: bool,
    ) -> Result<Self, DatasetError> {
        let mut counts = counts::load_counts(&paths.counts)?;
        let titles = metadata::load_titles(&paths.metadata)?;
        counts::join_titles(&mut counts, &titles);

        let untitled = counts.iter().filter(|r| r.title.is_none()).count();
        info!(
            "Loaded {} count records ({} without a title)",
            counts.len(),
            untitled
        );

        let reviews = reviews::load_reviews(&paths.reviews, tz, show_progress)?;
        info!("Loaded {} detailed reviews", reviews.len());

        Ok(Self::new(counts, reviews))
    }

    /// Smallest and largest year present in the count records.
    pub fn year_span(&self) -> Option<RangeInclusive<i32>> {
        let min = self.counts.iter().map(|r| r.year).min()?;
        let max = self.counts.iter().map(|r| r.year).max()?;
        Some(min..=max)
    }
}
