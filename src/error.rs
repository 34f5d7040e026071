//! Error taxonomy.
//!
//! Three families cover the analysis itself:
//! - [`DomainError`]: a growth model could not be evaluated for a pair.
//!   The pairwise aggregator recovers from these by discarding the pair.
//! - [`Error::Configuration`]: a call was set up inconsistently (e.g. both
//!   or neither null sources). Fatal to the call.
//! - [`FitError`]: the density over the null values cannot be fit. Fatal to
//!   the call.
//!
//! I/O and parse failures of the persisted null store get their own variants.

use std::io;
use std::path::PathBuf;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for every fallible operation in the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A predictive model query failed or the window is unusable.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// Inconsistent call configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Density estimation over the null values failed.
    #[error("density fit failed: {0}")]
    Fit(#[from] FitError),

    /// Failed to read or write the persisted null store.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File we attempted to access.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A line of the persisted null store is not a number.
    #[error("{}:{line}: {reason}", path.display())]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        reason: String,
    },
}

/// Failures evaluating a growth model or deriving the integration window.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// The model refused the query (unfit, internal failure, ...).
    #[error("model evaluation failed at t={time}: {reason}")]
    ModelEvaluation {
        /// Query time.
        time: f64,
        /// Model-supplied reason.
        reason: String,
    },

    /// The query time lies outside the range the model covers.
    #[error("t={time} outside model range [{start}, {end}]")]
    OutOfRange {
        /// Query time.
        time: f64,
        /// First covered time point.
        start: f64,
        /// Last covered time point.
        end: f64,
    },

    /// The window between treatment start and the last shared measurement is empty.
    #[error("empty integration window [{start}, {end}]")]
    EmptyWindow {
        /// Treatment start day.
        start: f64,
        /// Last shared measurement day.
        end: f64,
    },

    /// A measurement index does not address a time point.
    #[error("time index {index} out of bounds for {len} time points")]
    IndexOutOfBounds {
        /// Offending index.
        index: usize,
        /// Number of time points.
        len: usize,
    },

    /// The observation to calibrate is NaN or infinite.
    #[error("non-finite observation {0}")]
    NonFiniteObservation(f64),
}

/// Reasons a kernel density cannot be fit.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    /// No values at all.
    #[error("no values to fit")]
    Empty,

    /// All values identical (zero spread).
    #[error("need at least 2 distinct values, got {distinct}")]
    Degenerate {
        /// Number of distinct values found.
        distinct: usize,
    },

    /// A NaN or infinite value in the input.
    #[error("non-finite value {value} at position {index}")]
    NonFinite {
        /// Position in the list.
        index: usize,
        /// The offending value.
        value: f64,
    },

    /// The spread of the values under- or overflows, leaving no usable bandwidth.
    #[error("bandwidth {bandwidth} is not finite and positive")]
    Bandwidth {
        /// The rejected bandwidth.
        bandwidth: f64,
    },
}
