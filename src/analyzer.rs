//! Main `Kulgap` entry point and builder.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, warn};

use crate::agreement::{
    agreement_matrix, conservative_matrix, false_discovery_matrix, kendall_tau_matrix, CallTable,
};
use crate::calibration::calibrate;
use crate::classify::{classify_all, ExternalStats};
use crate::cohort::{CaseControl, Cohort};
use crate::config::{Config, WindowAxis};
use crate::divergence::divergence;
use crate::error::Result;
use crate::null::{NullDistribution, NullSource, Progress, Silent};
use crate::result::{
    AgreementSummary, CohortReport, ExperimentResult, Metadata, NullOrigin, NullSummary,
};
use crate::types::ExperimentKey;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Confidence of the bootstrap interval on the empirical critical value.
const CRITICAL_VALUE_CONFIDENCE: f64 = 0.95;

/// Main entry point for cohort analysis.
///
/// Use the builder pattern to configure and run an analysis.
///
/// # Example
///
/// ```ignore
/// use kulgap::{Kulgap, NullSource};
///
/// let controls = cohort.controls();
/// let report = Kulgap::new()
///     .alpha(0.05)
///     .persist_null("null_kl.csv")
///     .analyze(&cohort, NullSource::from_conditions(controls))?;
///
/// for experiment in report.responders(kulgap::Classifier::Kulgap) {
///     println!("{}", experiment.key);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Kulgap {
    config: Config,
    persist_null: Option<PathBuf>,
    external: BTreeMap<ExperimentKey, ExternalStats>,
}

impl Kulgap {
    /// Create with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with fast configuration for tests and exploration.
    ///
    /// See [`Config::quick`].
    pub fn quick() -> Self {
        Self {
            config: Config::quick(),
            ..Self::default()
        }
    }

    /// Create from an explicit configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Apply overrides from environment variables.
    ///
    /// - `KULGAP_ALPHA`: significance level
    /// - `KULGAP_PARALLEL`: `0`/`false` disables the thread pool
    /// - `KULGAP_QUAD_LIMIT`: quadrature subinterval limit
    /// - `KULGAP_NULL_PATH`: where to persist the null values
    ///
    /// Unparseable values are ignored.
    pub fn from_env(mut self) -> Self {
        if let Some(alpha) = parse_f64_env("KULGAP_ALPHA") {
            self = self.alpha(alpha);
        }
        if let Some(parallel) = parse_bool_env("KULGAP_PARALLEL") {
            self = self.parallel(parallel);
        }
        if let Some(limit) = parse_usize_env("KULGAP_QUAD_LIMIT") {
            self = self.quadrature_limit(limit);
        }
        if let Some(path) = parse_path_env("KULGAP_NULL_PATH") {
            self = self.persist_null(path);
        }
        self
    }

    /// Set the significance level for KuLGaP, AUC and angle calls.
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.config.alpha = alpha;
        self
    }

    /// Set the divergence normalisation constant.
    pub fn normalization(mut self, normalization: f64) -> Self {
        self.config.normalization = normalization;
        self
    }

    /// Set which time axis bounds the integration window.
    pub fn window_axis(mut self, axis: WindowAxis) -> Self {
        self.config.window_axis = axis;
        self
    }

    /// Set the quadrature subinterval limit.
    pub fn quadrature_limit(mut self, limit: usize) -> Self {
        self.config.quadrature.limit = limit;
        self
    }

    /// Enable or disable the shared thread pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Set bootstrap iterations for the critical-value interval.
    pub fn bootstrap_iterations(mut self, n: usize) -> Self {
        self.config.bootstrap_iterations = n;
        self
    }

    /// Set deterministic bootstrap seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Write the null values to `path` after building them.
    pub fn persist_null(mut self, path: impl Into<PathBuf>) -> Self {
        self.persist_null = Some(path.into());
        self
    }

    /// Attach externally computed statistics for one experiment.
    pub fn external_stats(mut self, key: ExperimentKey, stats: ExternalStats) -> Self {
        self.external.insert(key, stats);
        self
    }

    /// Get the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path the null values are persisted to, if set.
    pub fn null_path(&self) -> Option<&Path> {
        self.persist_null.as_deref()
    }

    /// Build (and persist, if configured) the null distribution.
    pub fn build_null(&self, source: NullSource<'_>) -> Result<NullDistribution> {
        self.build_null_with_progress(source, &Silent)
    }

    /// [`build_null`](Self::build_null) with a progress sink for the pairwise step.
    pub fn build_null_with_progress(
        &self,
        source: NullSource<'_>,
        progress: &dyn Progress,
    ) -> Result<NullDistribution> {
        let null = NullDistribution::build_with_progress(source, &self.config, progress)?;
        if let Some(path) = &self.persist_null {
            null.save(path)?;
            info!(path = %path.display(), values = null.len(), "null values persisted");
        }
        Ok(null)
    }

    /// Analyse every treatment-vs-control experiment of `cohort`.
    ///
    /// # Errors
    ///
    /// Configuration, fit and store errors from building the null abort the
    /// analysis. Failures of individual experiments are recorded in their
    /// [`ExperimentResult::error`] instead.
    pub fn analyze(&self, cohort: &Cohort, source: NullSource<'_>) -> Result<CohortReport> {
        self.analyze_with_progress(cohort, source, &Silent)
    }

    /// [`analyze`](Self::analyze) with a progress sink for the pairwise step.
    pub fn analyze_with_progress(
        &self,
        cohort: &Cohort,
        source: NullSource<'_>,
        progress: &dyn Progress,
    ) -> Result<CohortReport> {
        let start_time = Instant::now();
        let computed = matches!(source, NullSource::Conditions(_));
        let candidates = match &source {
            NullSource::Conditions(c) => c.len() * c.len().saturating_sub(1) / 2,
            _ => 0,
        };

        let null = self.build_null_with_progress(source, progress)?;

        let pairs: Vec<(ExperimentKey, CaseControl<'_>)> =
            cohort.case_control_pairs().into_iter().collect();
        let evaluate = |(key, pair): &(ExperimentKey, CaseControl<'_>)| {
            self.evaluate_experiment(key, pair, &null)
        };

        #[cfg(feature = "parallel")]
        let experiments: Vec<ExperimentResult> = if self.config.parallel {
            crate::thread_pool::install(|| pairs.par_iter().map(evaluate).collect())
        } else {
            pairs.iter().map(evaluate).collect()
        };

        #[cfg(not(feature = "parallel"))]
        let experiments: Vec<ExperimentResult> = pairs.iter().map(evaluate).collect();

        let agreement = (!experiments.is_empty()).then(|| {
            let mut table = CallTable::new();
            for experiment in &experiments {
                for (&classifier, &call) in &experiment.calls {
                    table.entry(classifier).or_default().push(call);
                }
            }
            AgreementSummary {
                agreement: agreement_matrix(&table).to_table(),
                false_discovery: false_discovery_matrix(&table).to_table(),
                kendall_tau: kendall_tau_matrix(&table).to_table(),
                conservative: conservative_matrix(&table).to_table(),
            }
        });

        let alpha = self.config.alpha;
        let null_summary = NullSummary {
            origin: if computed {
                NullOrigin::Computed {
                    candidates,
                    discarded: null.discarded_pairs(),
                }
            } else {
                NullOrigin::Stored
            },
            values: null.len(),
            bandwidth: null.density().bandwidth(),
            log_likelihood: null.density().log_likelihood(),
            alpha,
            critical_value: null.critical_value(alpha),
            empirical_critical_value: null.empirical_critical_value(alpha),
            critical_value_interval: null.critical_value_interval(
                alpha,
                CRITICAL_VALUE_CONFIDENCE,
                &self.config,
            ),
        };

        info!(
            experiments = experiments.len(),
            null_values = null.len(),
            "cohort analysis complete"
        );

        Ok(CohortReport {
            experiments,
            null: null_summary,
            agreement,
            metadata: Metadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                parallel: self.config.parallel && cfg!(feature = "parallel"),
                null_path: self
                    .persist_null
                    .as_ref()
                    .map(|p| p.display().to_string()),
                runtime_secs: start_time.elapsed().as_secs_f64(),
            },
        })
    }

    fn evaluate_experiment(
        &self,
        key: &ExperimentKey,
        pair: &CaseControl<'_>,
        null: &NullDistribution,
    ) -> ExperimentResult {
        let (value, calibration, error) = match divergence(pair.case, pair.control, &self.config) {
            Ok(value) => match calibrate(value, null) {
                Ok(calibration) => (Some(value), Some(calibration), None),
                Err(e) => (Some(value), None, Some(e.to_string())),
            },
            Err(e) => (None, None, Some(e.to_string())),
        };
        if let Some(reason) = &error {
            warn!(experiment = %key, reason = %reason, "experiment not calibrated");
        }

        let stats = self.external.get(key).cloned().unwrap_or_default();
        let survival = calibration.map(|c| c.survival);
        ExperimentResult {
            key: key.clone(),
            tumour_type: pair.tumour_type.map(str::to_string),
            replicates: pair.case.n_replicates(),
            control_replicates: pair.control.n_replicates(),
            divergence: value,
            calibration,
            error,
            calls: classify_all(survival, &stats, &self.config),
        }
    }
}

fn parse_usize_env(key: &str) -> Option<usize> {
    env::var(key).ok()?.parse().ok()
}

fn parse_f64_env(key: &str) -> Option<f64> {
    env::var(key).ok()?.parse().ok()
}

fn parse_bool_env(key: &str) -> Option<bool> {
    let raw = env::var(key).ok()?;
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_path_env(key: &str) -> Option<PathBuf> {
    env::var(key).ok().map(PathBuf::from)
}
