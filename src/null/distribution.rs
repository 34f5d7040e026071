//! Null distribution: control-vs-control divergences and their density.

use std::path::{Path, PathBuf};

use tracing::info;

use super::pairwise::{cross_divergences_with_progress, Progress, Silent};
use super::store::{read_values, write_values};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::statistics::{bootstrap_quantile, compute_quantile_sorted, KernelDensity, QuantileInterval};
use crate::types::TreatmentCondition;

/// Where the null values come from.
///
/// Exactly one source is used per build; the enum makes supplying both or
/// neither unrepresentable.
#[derive(Debug, Clone)]
pub enum NullSource<'a> {
    /// Compute all pairwise divergences among these conditions.
    Conditions(Vec<&'a TreatmentCondition>),
    /// Previously computed values, used as-is.
    Values(Vec<f64>),
    /// A flat-list store written by [`NullDistribution::save`].
    File(PathBuf),
}

impl<'a> NullSource<'a> {
    /// Source computing divergences among `conditions`.
    pub fn from_conditions<I>(conditions: I) -> Self
    where
        I: IntoIterator<Item = &'a TreatmentCondition>,
    {
        Self::Conditions(conditions.into_iter().collect())
    }

    /// Choose a source from two optional inputs.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] unless exactly one input is `Some`.
    pub fn from_options(
        conditions: Option<&'a [TreatmentCondition]>,
        values: Option<Vec<f64>>,
    ) -> Result<Self> {
        match (conditions, values) {
            (Some(conditions), None) => Ok(Self::from_conditions(conditions)),
            (None, Some(values)) => Ok(Self::Values(values)),
            (Some(_), Some(_)) => Err(Error::Configuration(
                "null source: pass either conditions or persisted values, not both".into(),
            )),
            (None, None) => Err(Error::Configuration(
                "null source: one of conditions or persisted values is required".into(),
            )),
        }
    }
}

/// Raw null values together with the smoothed density fit on them.
///
/// Immutable once built; safe to query from many threads.
#[derive(Debug, Clone)]
pub struct NullDistribution {
    values: Vec<f64>,
    sorted: Vec<f64>,
    density: KernelDensity,
    discarded: usize,
}

impl NullDistribution {
    /// Build from `source`.
    ///
    /// # Errors
    ///
    /// [`Error::Fit`] if fewer than two distinct finite values are
    /// available; store errors when reading from a file.
    pub fn build(source: NullSource<'_>, config: &Config) -> Result<Self> {
        Self::build_with_progress(source, config, &Silent)
    }

    /// [`build`](Self::build) reporting pairwise progress to `progress`.
    pub fn build_with_progress(
        source: NullSource<'_>,
        config: &Config,
        progress: &dyn Progress,
    ) -> Result<Self> {
        let (values, discarded) = match source {
            NullSource::Conditions(conditions) => {
                let outcome = cross_divergences_with_progress(&conditions, config, progress);
                let discarded = outcome.discarded();
                (outcome.values, discarded)
            }
            NullSource::Values(values) => (values, 0),
            NullSource::File(path) => (read_values(&path)?, 0),
        };
        let mut null = Self::from_values(values, config)?;
        null.discarded = discarded;
        Ok(null)
    }

    /// Fit the density over `values`, keeping their order.
    ///
    /// # Errors
    ///
    /// [`Error::Fit`] for empty, non-finite or single-valued input.
    pub fn from_values(values: Vec<f64>, config: &Config) -> Result<Self> {
        let density = KernelDensity::fit(&values, &config.bandwidth)?;
        let mut sorted = values.clone();
        sorted.sort_unstable_by(|a, b| a.total_cmp(b));
        info!(
            values = values.len(),
            bandwidth = density.bandwidth(),
            "null distribution fitted"
        );
        Ok(Self {
            values,
            sorted,
            density,
            discarded: 0,
        })
    }

    /// Null values in the order they were produced or loaded.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Null values sorted ascending.
    pub fn sorted_values(&self) -> &[f64] {
        &self.sorted
    }

    /// The smoothed density.
    pub fn density(&self) -> &KernelDensity {
        &self.density
    }

    /// Number of null values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false: a built distribution holds at least two values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Pairs dropped while computing the values (0 for stored values).
    pub fn discarded_pairs(&self) -> usize {
        self.discarded
    }

    /// Persist the raw values so later runs can skip the pairwise step.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_values(path, &self.values)
    }

    /// Divergence whose density survival equals `alpha`.
    ///
    /// Returns `None` unless `0 < alpha < 1`.
    pub fn critical_value(&self, alpha: f64) -> Option<f64> {
        self.density.upper_quantile(alpha)
    }

    /// Empirical `1 - alpha` quantile of the raw values (R-7).
    ///
    /// Returns `None` unless `0 <= alpha <= 1`.
    pub fn empirical_critical_value(&self, alpha: f64) -> Option<f64> {
        if !(0.0..=1.0).contains(&alpha) {
            return None;
        }
        Some(compute_quantile_sorted(&self.sorted, 1.0 - alpha))
    }

    /// Bootstrap interval around [`empirical_critical_value`](Self::empirical_critical_value).
    ///
    /// Uses `config.bootstrap_iterations` replicates and `config.seed`.
    pub fn critical_value_interval(
        &self,
        alpha: f64,
        confidence: f64,
        config: &Config,
    ) -> Option<QuantileInterval> {
        if !(0.0..=1.0).contains(&alpha) || !(0.0..=1.0).contains(&confidence) {
            return None;
        }
        bootstrap_quantile(
            &self.values,
            1.0 - alpha,
            confidence,
            config.bootstrap_iterations,
            config.seed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FitError;

    #[test]
    fn test_from_options_requires_exactly_one_source() {
        let conditions: Vec<TreatmentCondition> = Vec::new();
        assert!(matches!(
            NullSource::from_options(Some(conditions.as_slice()), Some(vec![1.0])),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            NullSource::from_options(None, None),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            NullSource::from_options(None, Some(vec![1.0])),
            Ok(NullSource::Values(_))
        ));
    }

    #[test]
    fn test_values_keep_order() {
        let values = vec![0.3, 0.1, 0.7, 0.2, 0.5];
        let null = NullDistribution::build(NullSource::Values(values.clone()), &Config::quick()).unwrap();
        assert_eq!(null.values(), values.as_slice());
        assert_eq!(null.sorted_values(), &[0.1, 0.2, 0.3, 0.5, 0.7]);
        assert_eq!(null.len(), 5);
    }

    #[test]
    fn test_degenerate_values_fail_to_fit() {
        let err = NullDistribution::build(NullSource::Values(vec![]), &Config::quick()).unwrap_err();
        assert!(matches!(err, Error::Fit(FitError::Empty)));
        let err = NullDistribution::build(NullSource::Values(vec![2.0, 2.0]), &Config::quick()).unwrap_err();
        assert!(matches!(err, Error::Fit(FitError::Degenerate { distinct: 1 })));
    }

    #[test]
    fn test_critical_values() {
        let values: Vec<f64> = (1..=100).map(|i| i as f64 / 10.0).collect();
        let null = NullDistribution::from_values(values, &Config::quick()).unwrap();

        let empirical = null.empirical_critical_value(0.05).unwrap();
        assert!((empirical - 9.505).abs() < 1e-9);

        let smooth = null.critical_value(0.05).unwrap();
        assert!((null.density().survival(smooth) - 0.05).abs() < 1e-9);
        assert!(smooth > 8.0 && smooth < 11.0);

        assert!(null.critical_value(0.0).is_none());
        assert!(null.empirical_critical_value(1.5).is_none());
    }

    #[test]
    fn test_critical_value_interval() {
        let values: Vec<f64> = (1..=60).map(|i| (i as f64).ln()).collect();
        let null = NullDistribution::from_values(values, &Config::quick()).unwrap();
        let interval = null.critical_value_interval(0.05, 0.9, &Config::quick()).unwrap();
        assert!(interval.lower <= interval.upper);
        assert_eq!(interval.iterations, Config::quick().bootstrap_iterations);
    }
}
