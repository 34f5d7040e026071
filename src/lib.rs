//! # kulgap
//!
//! Classify tumour xenograft treatment-response experiments by the KL
//! divergence between treatment and control growth curves.
//!
//! The crate calibrates a case-vs-control divergence against a null
//! distribution built from control-vs-control divergences across a cohort:
//! - Divergence of two fitted growth models over their shared window
//! - All-pairs null values with NaN/Inf pairs filtered out
//! - Cross-validated kernel density over the null values
//! - Empirical p-value and density survival for any observed divergence
//!
//! Growth-curve fitting is not part of the crate: anything implementing
//! [`GrowthModel`] (including a closure returning mean and variance) can be
//! plugged in.
//!
//! ## Quick Start
//!
//! ```ignore
//! use kulgap::{calibrate, divergence, Config, NullDistribution, NullSource};
//!
//! let config = Config::default();
//! let null = NullDistribution::build(NullSource::from_conditions(&controls), &config)?;
//! null.save("null_kl.csv")?;
//!
//! let kl = divergence(&case, &control, &config)?;
//! let calibration = calibrate(kl, &null)?;
//! println!("p = {:.3}, survival = {:.3}", calibration.p_value, calibration.survival);
//! ```
//!
//! ## Reusing a null distribution
//!
//! The pairwise step is O(n²) quadratures. Persist the values once and load
//! them on later runs:
//!
//! ```ignore
//! let null = NullDistribution::build(NullSource::File("null_kl.csv".into()), &config)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod analyzer;
mod config;
mod constants;
mod error;
mod result;
mod thread_pool;
mod types;

// Functional modules
pub mod agreement;
pub mod calibration;
pub mod classify;
pub mod cohort;
pub mod divergence;
pub mod model;
pub mod null;
pub mod output;
pub mod preprocess;
pub mod statistics;

// Re-exports for public API
pub use analyzer::Kulgap;
pub use calibration::{calibrate, density_survival, empirical_p_value, p_values, Calibration};
pub use classify::{Classifier, ExternalStats, ResponseCall};
pub use cohort::{CancerModel, CaseControl, Cohort};
pub use config::{BandwidthSearch, Config, QuadratureConfig, WindowAxis};
pub use constants::{CONTROL_ARM, KL_NORMALIZATION};
pub use divergence::{divergence, integration_window, pointwise_divergence, IntegrationWindow};
pub use error::{DomainError, Error, FitError, Result};
pub use model::LinearInterpolant;
pub use null::{cross_divergences, NullDistribution, NullSource, Progress};
pub use result::{
    AgreementSummary, CohortReport, ExperimentResult, Metadata, NullOrigin, NullSummary,
};
pub use types::{ConditionId, ExperimentKey, GrowthModel, Prediction, TreatmentCondition};

/// Analyse a cohort with default configuration.
///
/// Shorthand for `Kulgap::new().analyze(cohort, source)`.
pub fn analyze(cohort: &Cohort, source: NullSource<'_>) -> Result<CohortReport> {
    Kulgap::new().analyze(cohort, source)
}
