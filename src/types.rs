//! Core domain types: growth model capability, conditions and experiment keys.

use std::fmt;
use std::sync::Arc;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::constants::CONTROL_ARM;
use crate::error::{DomainError, Error, Result};
use crate::preprocess::{forward_fill_nas, relativize_rows, remove_extremal_nas, start_date_index};

/// Predictive mean and variance of a growth curve at one time point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predictive mean.
    pub mean: f64,
    /// Predictive variance; strictly positive inside the measurement window.
    pub variance: f64,
}

impl Prediction {
    /// Create a prediction.
    pub fn new(mean: f64, variance: f64) -> Self {
        Self { mean, variance }
    }
}

/// A fitted growth-curve model that can be queried at any time point in range.
///
/// Fitting is out of scope for this crate; implementors wrap whatever
/// regression produced the curve. Closures `Fn(f64) -> Result<Prediction, DomainError>`
/// implement the trait directly.
pub trait GrowthModel: Send + Sync {
    /// Predictive mean and variance at time `t` (days).
    fn predict(&self, t: f64) -> std::result::Result<Prediction, DomainError>;

    /// Vector query; stops at the first failing time point.
    fn predict_many(&self, ts: &[f64]) -> std::result::Result<Vec<Prediction>, DomainError> {
        ts.iter().map(|&t| self.predict(t)).collect()
    }
}

impl<F> GrowthModel for F
where
    F: Fn(f64) -> std::result::Result<Prediction, DomainError> + Send + Sync,
{
    fn predict(&self, t: f64) -> std::result::Result<Prediction, DomainError> {
        self(t)
    }
}

/// One arm (treatment or control) of one cancer model.
///
/// Holds the shared time axis, the replicate matrix (rows = replicates,
/// columns = time points), the valid measurement window and the fitted
/// model. Immutable once built; cloning shares the model.
#[derive(Clone)]
pub struct TreatmentCondition {
    name: String,
    x: Vec<f64>,
    y: DMatrix<f64>,
    y_norm: Option<DMatrix<f64>>,
    measurement_start: usize,
    measurement_end: usize,
    drug_start_day: f64,
    model: Arc<dyn GrowthModel>,
}

impl TreatmentCondition {
    /// Build a condition from raw replicate measurements.
    ///
    /// Leading and trailing NaNs of every replicate are replaced by zero and
    /// bound the measurement window (latest first measurement, earliest last
    /// measurement); interior NaNs are forward-filled.
    ///
    /// # Errors
    ///
    /// `Configuration` if the axis is empty, unsorted, does not match the
    /// number of columns, a replicate has no measurement, or the replicates
    /// share no common window.
    pub fn new(
        name: impl Into<String>,
        x: Vec<f64>,
        y: DMatrix<f64>,
        drug_start_day: f64,
        model: Arc<dyn GrowthModel>,
    ) -> Result<Self> {
        let name = name.into();
        validate_axis(&name, &x, y.ncols())?;
        let trimmed = remove_extremal_nas(y, 0.0).ok_or_else(|| {
            Error::Configuration(format!("condition '{name}': a replicate has no measurements"))
        })?;
        let y = forward_fill_nas(&trimmed.y);
        Self::from_parts(name, x, y, trimmed.first, trimmed.last, drug_start_day, model)
    }

    /// Build a condition with an explicit measurement window.
    ///
    /// # Errors
    ///
    /// `Configuration` if the axis is invalid or the window is not
    /// `start <= end < x.len()`.
    pub fn from_parts(
        name: impl Into<String>,
        x: Vec<f64>,
        y: DMatrix<f64>,
        measurement_start: usize,
        measurement_end: usize,
        drug_start_day: f64,
        model: Arc<dyn GrowthModel>,
    ) -> Result<Self> {
        let name = name.into();
        validate_axis(&name, &x, y.ncols())?;
        if measurement_start > measurement_end || measurement_end >= x.len() {
            return Err(Error::Configuration(format!(
                "condition '{name}': invalid measurement window [{measurement_start}, {measurement_end}] for {} time points",
                x.len()
            )));
        }
        Ok(Self {
            name,
            x,
            y,
            y_norm: None,
            measurement_start,
            measurement_end,
            drug_start_day,
            model,
        })
    }

    /// Replace the treatment start day (controls reuse their case's start day).
    pub fn with_drug_start_day(mut self, day: f64) -> Self {
        self.drug_start_day = day;
        self
    }

    /// Attach `y_norm`: every replicate relative to its value at treatment start.
    pub fn normalized(mut self) -> Self {
        let start = self.start_date_index();
        self.y_norm = Some(relativize_rows(&self.y, start));
        self
    }

    /// Condition name (arm label).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared time axis in days.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Replicate matrix (rows = replicates, columns = time points).
    pub fn y(&self) -> &DMatrix<f64> {
        &self.y
    }

    /// Normalised replicate matrix, if [`normalized`](Self::normalized) was applied.
    pub fn y_norm(&self) -> Option<&DMatrix<f64>> {
        self.y_norm.as_ref()
    }

    /// First valid measurement index.
    pub fn measurement_start(&self) -> usize {
        self.measurement_start
    }

    /// Last valid measurement index (inclusive).
    pub fn measurement_end(&self) -> usize {
        self.measurement_end
    }

    /// Day on which treatment began.
    pub fn drug_start_day(&self) -> f64 {
        self.drug_start_day
    }

    /// Number of observed time points.
    pub fn n_observations(&self) -> usize {
        self.y.ncols()
    }

    /// Number of replicates.
    pub fn n_replicates(&self) -> usize {
        self.y.nrows()
    }

    /// Index of the first time point at or after the treatment start day.
    pub fn start_date_index(&self) -> usize {
        start_date_index(&self.x, self.drug_start_day)
    }

    /// The fitted model.
    pub fn model(&self) -> &dyn GrowthModel {
        self.model.as_ref()
    }

    /// Time value at `index`, or `IndexOutOfBounds`.
    pub fn time_at(&self, index: usize) -> std::result::Result<f64, DomainError> {
        self.x.get(index).copied().ok_or(DomainError::IndexOutOfBounds {
            index,
            len: self.x.len(),
        })
    }
}

impl AsRef<TreatmentCondition> for TreatmentCondition {
    fn as_ref(&self) -> &TreatmentCondition {
        self
    }
}

impl fmt::Debug for TreatmentCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreatmentCondition")
            .field("name", &self.name)
            .field("observations", &self.y.ncols())
            .field("replicates", &self.y.nrows())
            .field("measurement_start", &self.measurement_start)
            .field("measurement_end", &self.measurement_end)
            .field("drug_start_day", &self.drug_start_day)
            .finish_non_exhaustive()
    }
}

fn validate_axis(name: &str, x: &[f64], columns: usize) -> Result<()> {
    if x.is_empty() {
        return Err(Error::Configuration(format!("condition '{name}': empty time axis")));
    }
    if x.len() != columns {
        return Err(Error::Configuration(format!(
            "condition '{name}': {} time points but {columns} measurement columns",
            x.len()
        )));
    }
    if x.windows(2).any(|w| !(w[0] < w[1])) {
        return Err(Error::Configuration(format!(
            "condition '{name}': time axis must be strictly increasing"
        )));
    }
    Ok(())
}

/// Arm identifier inside a cancer model.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConditionId {
    /// The untreated control arm.
    Control,
    /// A treatment arm, named after the drug.
    Treatment(String),
}

impl ConditionId {
    /// Whether this is the control arm.
    pub fn is_control(&self) -> bool {
        matches!(self, Self::Control)
    }
}

impl From<&str> for ConditionId {
    fn from(name: &str) -> Self {
        if name == CONTROL_ARM {
            Self::Control
        } else {
            Self::Treatment(name.to_string())
        }
    }
}

impl fmt::Display for ConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Control => f.write_str(CONTROL_ARM),
            Self::Treatment(name) => f.write_str(name),
        }
    }
}

/// Key of one treatment-vs-control experiment: (cancer model, treatment arm).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExperimentKey {
    /// Cancer model (patient-derived xenograft) identifier.
    pub model: String,
    /// Treatment arm name.
    pub treatment: String,
}

impl ExperimentKey {
    /// Create a key.
    pub fn new(model: impl Into<String>, treatment: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            treatment: treatment.into(),
        }
    }
}

impl fmt::Display for ExperimentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}*{}", self.model, self.treatment)
    }
}
