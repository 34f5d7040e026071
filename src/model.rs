//! Tabulated growth model.
//!
//! [`LinearInterpolant`] exposes precomputed predictive means and variances
//! (e.g. exported from an external Gaussian-process fit) through the
//! [`GrowthModel`] capability by piecewise-linear interpolation.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Error, Result};
use crate::types::{GrowthModel, Prediction};

/// Piecewise-linear interpolation of tabulated mean and variance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearInterpolant {
    times: Vec<f64>,
    means: Vec<f64>,
    variances: Vec<f64>,
}

impl LinearInterpolant {
    /// Create an interpolant from matching node vectors.
    ///
    /// # Errors
    ///
    /// `Configuration` if the vectors are empty, differ in length, or the
    /// times are not strictly increasing.
    pub fn new(times: Vec<f64>, means: Vec<f64>, variances: Vec<f64>) -> Result<Self> {
        if times.is_empty() {
            return Err(Error::Configuration("interpolant needs at least one node".into()));
        }
        if times.len() != means.len() || times.len() != variances.len() {
            return Err(Error::Configuration(format!(
                "interpolant node mismatch: {} times, {} means, {} variances",
                times.len(),
                means.len(),
                variances.len()
            )));
        }
        if times.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(Error::Configuration(
                "interpolant times must be strictly increasing".into(),
            ));
        }
        Ok(Self {
            times,
            means,
            variances,
        })
    }

    /// Constant mean and variance over `[start, end]`.
    pub fn constant(start: f64, end: f64, mean: f64, variance: f64) -> Result<Self> {
        Self::new(vec![start, end], vec![mean; 2], vec![variance; 2])
    }

    /// Node times.
    pub fn times(&self) -> &[f64] {
        &self.times
    }
}

impl GrowthModel for LinearInterpolant {
    fn predict(&self, t: f64) -> std::result::Result<Prediction, DomainError> {
        let start = self.times[0];
        let end = self.times[self.times.len() - 1];
        if !(start..=end).contains(&t) {
            return Err(DomainError::OutOfRange { time: t, start, end });
        }

        let upper = self.times.partition_point(|&node| node < t);
        if upper == 0 {
            return Ok(Prediction::new(self.means[0], self.variances[0]));
        }
        let lower = upper - 1;
        let span = self.times[upper] - self.times[lower];
        let w = (t - self.times[lower]) / span;

        Ok(Prediction::new(
            self.means[lower] + w * (self.means[upper] - self.means[lower]),
            self.variances[lower] + w * (self.variances[upper] - self.variances[lower]),
        ))
    }
}
