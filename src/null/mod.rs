//! Null-distribution construction.
//!
//! Control-vs-control divergences describe how far two curves drift apart
//! with no treatment effect. They are computed pairwise over a cohort's
//! control arms (or loaded from a previous run) and smoothed with a
//! cross-validated kernel density.

mod distribution;
mod pairwise;
mod store;

pub use distribution::{NullDistribution, NullSource};
pub use pairwise::{
    cross_divergences, cross_divergences_with_progress, cross_map, PairwiseOutcome, Progress,
    Silent, TracingProgress,
};
pub use store::{parse_values, read_values, write_values};
