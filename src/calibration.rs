//! Calibration of observed divergences against the null distribution.
//!
//! Two read-only queries:
//! - the empirical tail probability with add-one smoothing,
//!   `(#{null >= observed} + 1) / (n + 1)`, never 0 and at most 1;
//! - the survival `1 - CDF(observed)` of the smoothed null density.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::null::NullDistribution;

/// Calibration of one observed divergence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// The observed divergence.
    pub divergence: f64,
    /// Add-one smoothed empirical tail probability.
    pub p_value: f64,
    /// Survival probability under the smoothed null density.
    pub survival: f64,
}

impl Calibration {
    /// Whether the density-based survival falls below `alpha`.
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.survival < alpha
    }
}

/// Empirical p-value of `observed` against the null values.
///
/// A NaN observation counts every null value as at least as extreme and
/// yields 1.
pub fn empirical_p_value(observed: f64, null: &NullDistribution) -> f64 {
    let sorted = null.sorted_values();
    let below = sorted.partition_point(|&v| v < observed);
    let at_or_above = if observed.is_nan() {
        sorted.len()
    } else {
        sorted.len() - below
    };
    (at_or_above + 1) as f64 / (sorted.len() + 1) as f64
}

/// Empirical p-value of each entry of `observed` against an unsorted list.
pub fn p_values(observed: &[f64], null: &[f64]) -> Vec<f64> {
    let denominator = (null.len() + 1) as f64;
    observed
        .iter()
        .map(|&y| {
            let count = if y.is_nan() {
                null.len()
            } else {
                null.iter().filter(|&&x| x >= y).count()
            };
            (count + 1) as f64 / denominator
        })
        .collect()
}

/// Survival probability of `observed` under the smoothed null density.
///
/// # Errors
///
/// [`DomainError::NonFiniteObservation`] for NaN or infinite input.
pub fn density_survival(observed: f64, null: &NullDistribution) -> Result<f64, DomainError> {
    if !observed.is_finite() {
        return Err(DomainError::NonFiniteObservation(observed));
    }
    Ok(null.density().survival(observed))
}

/// Both calibrations of `observed`.
pub fn calibrate(observed: f64, null: &NullDistribution) -> Result<Calibration, DomainError> {
    Ok(Calibration {
        divergence: observed,
        p_value: empirical_p_value(observed, null),
        survival: density_survival(observed, null)?,
    })
}
