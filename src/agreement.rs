//! Pairwise comparison of classifier calls across a cohort.

use std::collections::BTreeMap;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::classify::{Classifier, ResponseCall};
use crate::statistics::kendall_tau_b;

/// Calls of several classifiers over the same experiments, column per classifier.
pub type CallTable = BTreeMap<Classifier, Vec<ResponseCall>>;

/// Square matrix indexed by classifier on both axes.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierMatrix {
    labels: Vec<Classifier>,
    values: DMatrix<f64>,
}

impl ClassifierMatrix {
    fn build(calls: &CallTable, f: impl Fn(&[ResponseCall], &[ResponseCall]) -> f64) -> Self {
        let labels: Vec<Classifier> = calls.keys().copied().collect();
        let columns: Vec<&[ResponseCall]> = calls.values().map(Vec::as_slice).collect();
        let n = labels.len();
        let values = DMatrix::from_fn(n, n, |i, j| f(columns[i], columns[j]));
        Self { labels, values }
    }

    /// Row and column labels.
    pub fn labels(&self) -> &[Classifier] {
        &self.labels
    }

    /// Underlying matrix.
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Entry for (`row`, `col`), if both classifiers are present.
    pub fn get(&self, row: Classifier, col: Classifier) -> Option<f64> {
        let i = self.labels.iter().position(|&c| c == row)?;
        let j = self.labels.iter().position(|&c| c == col)?;
        Some(self.values[(i, j)])
    }

    /// Serialisable form.
    pub fn to_table(&self) -> MatrixTable {
        MatrixTable {
            labels: self.labels.clone(),
            rows: self
                .values
                .row_iter()
                .map(|row| row.iter().copied().collect())
                .collect(),
        }
    }
}

/// Row-major matrix with labels, for reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixTable {
    /// Row and column labels.
    pub labels: Vec<Classifier>,
    /// Rows of values.
    pub rows: Vec<Vec<f64>>,
}

/// Fraction of experiments on which two classifiers make the same call.
pub fn agreement_matrix(calls: &CallTable) -> ClassifierMatrix {
    ClassifierMatrix::build(calls, |a, b| {
        let n = a.len().min(b.len());
        if n == 0 {
            return f64::NAN;
        }
        let same = a.iter().zip(b).filter(|(x, y)| x == y).count();
        same as f64 / n as f64
    })
}

/// False-discovery matrix.
///
/// Entry `(i, j)` is the fraction of classifier `i`'s responders that
/// classifier `j` calls non-responders; NaN when `i` calls no responder.
pub fn false_discovery_matrix(calls: &CallTable) -> ClassifierMatrix {
    ClassifierMatrix::build(calls, |row, col| {
        let mut responders = 0usize;
        let mut contradicted = 0usize;
        for (r, c) in row.iter().zip(col) {
            if *r == ResponseCall::Responder {
                responders += 1;
                if *c == ResponseCall::NonResponder {
                    contradicted += 1;
                }
            }
        }
        if responders == 0 {
            f64::NAN
        } else {
            contradicted as f64 / responders as f64
        }
    })
}

/// Conservativeness of each classifier pair.
///
/// Entry `(i, j)` is `(Σ code_j - Σ code_i) / (2n)` over the call codes
/// (responder 1, non-responder -1, undetermined 0): positive when the column
/// classifier calls more responders than the row classifier. The matrix is
/// antisymmetric with a zero diagonal, and entries lie in `[-1, 1]`.
pub fn conservative_matrix(calls: &CallTable) -> ClassifierMatrix {
    ClassifierMatrix::build(calls, |row, col| {
        let n = row.len().min(col.len());
        if n == 0 {
            return f64::NAN;
        }
        let score = |calls: &[ResponseCall]| -> i64 {
            calls[..n].iter().map(|c| i64::from(c.code())).sum()
        };
        (score(col) - score(row)) as f64 / (2 * n) as f64
    })
}

/// Kendall tau-b between the numeric call codes of each classifier pair.
pub fn kendall_tau_matrix(calls: &CallTable) -> ClassifierMatrix {
    ClassifierMatrix::build(calls, |a, b| {
        let x: Vec<f64> = a.iter().map(|c| f64::from(c.code())).collect();
        let y: Vec<f64> = b.iter().map(|c| f64::from(c.code())).collect();
        kendall_tau_b(&x, &y)
    })
}
