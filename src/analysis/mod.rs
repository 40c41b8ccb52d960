//! Analysis modules.
//!
//! `aggregator` holds the filter/group/sum operators over count and review
//! records, `text` the normalization and word counting behind word clouds.

pub mod aggregator;
pub mod text;
