//! Replicate-matrix preparation helpers.
//!
//! These run before a model is fit and define the valid measurement window
//! that the divergence later integrates over.

use nalgebra::DMatrix;

use crate::types::TreatmentCondition;

/// Replicate matrix with extremal NaNs replaced, plus the shared window.
#[derive(Debug, Clone)]
pub struct TrimmedMeasurements {
    /// Matrix with leading/trailing NaNs replaced.
    pub y: DMatrix<f64>,
    /// Latest first measurement over all replicates.
    pub first: usize,
    /// Earliest last measurement over all replicates.
    pub last: usize,
}

/// Replace leading and trailing NaNs of each row with `replacement`.
///
/// Returns the modified matrix together with the latest first measurement
/// and the earliest last measurement across rows, or `None` if the matrix has
/// no rows or a row has no measurement at all. `first > last` is possible
/// when replicates do not overlap; callers validate the window.
pub fn remove_extremal_nas(mut y: DMatrix<f64>, replacement: f64) -> Option<TrimmedMeasurements> {
    if y.nrows() == 0 {
        return None;
    }
    let mut first = 0usize;
    let mut last = usize::MAX;

    for r in 0..y.nrows() {
        let row_first = (0..y.ncols()).find(|&c| !y[(r, c)].is_nan())?;
        let row_last = (0..y.ncols()).rev().find(|&c| !y[(r, c)].is_nan())?;
        for c in 0..row_first {
            y[(r, c)] = replacement;
        }
        for c in row_last + 1..y.ncols() {
            y[(r, c)] = replacement;
        }
        first = first.max(row_first);
        last = last.min(row_last);
    }

    Some(TrimmedMeasurements { y, first, last })
}

/// Forward-fill NaNs in each row with the previous valid value.
///
/// NaNs before the first valid value of a row stay NaN.
pub fn forward_fill_nas(y: &DMatrix<f64>) -> DMatrix<f64> {
    let mut out = y.clone();
    for r in 0..out.nrows() {
        let mut previous = f64::NAN;
        for c in 0..out.ncols() {
            if out[(r, c)].is_nan() {
                out[(r, c)] = previous;
            } else {
                previous = out[(r, c)];
            }
        }
    }
    out
}

/// `y / y[start] - 1`: growth relative to the value at `start`.
pub fn relativize(y: &[f64], start: usize) -> Vec<f64> {
    let base = y[start];
    y.iter().map(|v| v / base - 1.0).collect()
}

/// `y - y[start]`.
pub fn centre(y: &[f64], start: usize) -> Vec<f64> {
    let base = y[start];
    y.iter().map(|v| v - base).collect()
}

/// Relativize every row of a replicate matrix at column `start`.
pub fn relativize_rows(y: &DMatrix<f64>, start: usize) -> DMatrix<f64> {
    let mut out = y.clone();
    for mut row in out.row_iter_mut() {
        let base = row[start];
        row.apply(|v| *v = *v / base - 1.0);
    }
    out
}

/// Sum of successive finite-difference slopes of `y` over `x`.
///
/// This is the "AUC" of the original KuLGaP scripts: it telescopes the
/// slopes rather than integrating the curve. Only the common prefix of the
/// two slices is used.
pub fn finite_difference_auc(x: &[f64], y: &[f64]) -> f64 {
    let l = x.len().min(y.len());
    (0..l.saturating_sub(1))
        .map(|j| (y[j + 1] - y[j]) / (x[j + 1] - x[j]))
        .sum()
}

/// First index whose time is at or after `day`, clamped to the last index.
pub fn start_date_index(x: &[f64], day: f64) -> usize {
    x.partition_point(|&t| t < day).min(x.len().saturating_sub(1))
}

/// Measurement start and end indices shared by a case and an optional control.
///
/// Without a control: the case's treatment-start index and measurement end.
/// With a control: the later start and the earlier end.
pub fn find_start_end(case: &TreatmentCondition, control: Option<&TreatmentCondition>) -> (usize, usize) {
    match control {
        None => (case.start_date_index(), case.measurement_end()),
        Some(control) => (
            case.start_date_index().max(control.measurement_start()),
            case.measurement_end().min(control.measurement_end()),
        ),
    }
}
