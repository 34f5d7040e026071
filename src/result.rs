//! Cohort analysis result types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::agreement::MatrixTable;
use crate::calibration::Calibration;
use crate::classify::{Classifier, ResponseCall};
use crate::statistics::QuantileInterval;
use crate::types::ExperimentKey;

/// Complete result of a cohort analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortReport {
    /// One entry per treatment-vs-control experiment, in key order.
    pub experiments: Vec<ExperimentResult>,

    /// Summary of the null distribution used for calibration.
    pub null: NullSummary,

    /// Classifier comparison matrices (absent for an empty cohort).
    pub agreement: Option<AgreementSummary>,

    /// Metadata for debugging.
    pub metadata: Metadata,
}

impl CohortReport {
    /// Result for `key`, if present.
    pub fn experiment(&self, key: &ExperimentKey) -> Option<&ExperimentResult> {
        self.experiments.iter().find(|e| &e.key == key)
    }

    /// Experiments `classifier` calls responders.
    pub fn responders(&self, classifier: Classifier) -> impl Iterator<Item = &ExperimentResult> {
        self.experiments
            .iter()
            .filter(move |e| e.calls.get(&classifier) == Some(&ResponseCall::Responder))
    }
}

/// Outcome of one treatment-vs-control experiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResult {
    /// (model, treatment) identifier.
    pub key: ExperimentKey,

    /// Tumour type of the model, if known.
    pub tumour_type: Option<String>,

    /// Treated replicates.
    pub replicates: usize,

    /// Control replicates.
    pub control_replicates: usize,

    /// Case-vs-control divergence; `None` if it could not be computed.
    pub divergence: Option<f64>,

    /// Calibration against the null (present when the divergence is finite).
    pub calibration: Option<Calibration>,

    /// Why the divergence or calibration is missing.
    pub error: Option<String>,

    /// Call of every classifier.
    pub calls: BTreeMap<Classifier, ResponseCall>,
}

/// Where the null values came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NullOrigin {
    /// Computed pairwise from control arms.
    Computed {
        /// Pairs evaluated.
        candidates: usize,
        /// Pairs dropped as failed or non-finite.
        discarded: usize,
    },
    /// Supplied as values or read from a store.
    Stored,
}

/// Null distribution summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NullSummary {
    /// Origin of the values.
    pub origin: NullOrigin,
    /// Number of null values.
    pub values: usize,
    /// Selected kernel bandwidth.
    pub bandwidth: f64,
    /// Leave-one-out log-likelihood at that bandwidth.
    pub log_likelihood: f64,
    /// Significance level the critical values refer to.
    pub alpha: f64,
    /// Divergence with density survival `alpha`.
    pub critical_value: Option<f64>,
    /// Empirical `1 - alpha` quantile of the null values.
    pub empirical_critical_value: Option<f64>,
    /// Bootstrap interval on the empirical critical value.
    pub critical_value_interval: Option<QuantileInterval>,
}

/// Comparison of classifier calls over the cohort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgreementSummary {
    /// Fraction of identical calls.
    pub agreement: MatrixTable,
    /// Fraction of row responders contradicted by the column.
    pub false_discovery: MatrixTable,
    /// Kendall tau-b between call codes.
    pub kendall_tau: MatrixTable,
    /// Half the mean call-code difference, column minus row.
    pub conservative: MatrixTable,
}

/// Metadata for debugging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Crate version that produced the report.
    pub version: String,
    /// Whether pairwise evaluation ran on the thread pool.
    pub parallel: bool,
    /// Where the null values were persisted, if anywhere.
    pub null_path: Option<String>,
    /// Total runtime in seconds.
    pub runtime_secs: f64,
}
