//! All-pairs divergence evaluation.
//!
//! Every unordered pair `(i, j)` with `j < i` is evaluated once, with
//! `items[i]` as the case. Rows (fixed `i`) are independent and run on the
//! shared thread pool when parallelism is enabled; each row writes its own
//! output slot and the retained values are collected by one sequential pass
//! in natural order, so parallel and sequential runs agree exactly.

use std::fmt::Display;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::divergence::divergence;
use crate::types::TreatmentCondition;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Receives row-completion events from the pairwise aggregator.
///
/// `done` counts completed rows, `total` is the number of rows. Each value
/// of `done` in `1..=total` is reported exactly once. In parallel runs the
/// calls may arrive out of order, so sinks should not rely on `done`
/// increasing from one call to the next.
pub trait Progress: Sync {
    /// Called once per completed row.
    fn on_row(&self, done: usize, total: usize);
}

impl<F> Progress for F
where
    F: Fn(usize, usize) + Sync,
{
    fn on_row(&self, done: usize, total: usize) {
        self(done, total)
    }
}

/// Progress sink that discards events.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Progress for Silent {
    fn on_row(&self, _done: usize, _total: usize) {}
}

/// Progress sink that logs each row at `debug` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl Progress for TracingProgress {
    fn on_row(&self, done: usize, total: usize) {
        debug!(done, total, "pairwise row complete");
    }
}

/// Retained values plus bookkeeping on what was dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseOutcome {
    /// Finite values in natural pair order.
    pub values: Vec<f64>,
    /// Number of pairs evaluated, `n(n-1)/2`.
    pub candidates: usize,
    /// Pairs whose evaluation returned an error.
    pub failed: usize,
    /// Pairs that evaluated to NaN or an infinity.
    pub non_finite: usize,
}

impl PairwiseOutcome {
    /// Pairs dropped for any reason.
    pub fn discarded(&self) -> usize {
        self.failed + self.non_finite
    }
}

/// Evaluate `f(items[i], items[j])` for every `j < i` and keep finite results.
///
/// Errors and non-finite values are counted and dropped; one ill-conditioned
/// pair never aborts the whole run.
pub fn cross_map<T, E, F>(items: &[T], parallel: bool, progress: &dyn Progress, f: F) -> PairwiseOutcome
where
    T: Sync,
    E: Display + Send,
    F: Fn(&T, &T) -> Result<f64, E> + Sync,
{
    let total = items.len();
    let done = AtomicUsize::new(0);

    let row = |i: usize| -> Vec<Result<f64, E>> {
        let out: Vec<Result<f64, E>> = (0..i).map(|j| f(&items[i], &items[j])).collect();
        let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
        progress.on_row(finished, total);
        out
    };

    #[cfg(feature = "parallel")]
    let rows: Vec<Vec<Result<f64, E>>> = if parallel {
        crate::thread_pool::install(|| (0..total).into_par_iter().map(row).collect())
    } else {
        (0..total).map(row).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Vec<Result<f64, E>>> = {
        let _ = parallel;
        (0..total).map(row).collect()
    };

    let mut outcome = PairwiseOutcome {
        values: Vec::with_capacity(total * total.saturating_sub(1) / 2),
        candidates: total * total.saturating_sub(1) / 2,
        failed: 0,
        non_finite: 0,
    };
    for (i, results) in rows.into_iter().enumerate() {
        for (j, result) in results.into_iter().enumerate() {
            match result {
                Ok(value) if value.is_finite() => outcome.values.push(value),
                Ok(value) => {
                    debug!(i, j, value, "discarding non-finite pair");
                    outcome.non_finite += 1;
                }
                Err(e) => {
                    debug!(i, j, error = %e, "discarding pair");
                    outcome.failed += 1;
                }
            }
        }
    }
    outcome
}

/// Divergences of all condition pairs, NaN and infinite values removed.
pub fn cross_divergences<C>(conditions: &[C], config: &Config) -> Vec<f64>
where
    C: AsRef<TreatmentCondition> + Sync,
{
    cross_divergences_with_progress(conditions, config, &Silent).values
}

/// [`cross_divergences`] reporting per-row progress and discard counts.
pub fn cross_divergences_with_progress<C>(
    conditions: &[C],
    config: &Config,
    progress: &dyn Progress,
) -> PairwiseOutcome
where
    C: AsRef<TreatmentCondition> + Sync,
{
    let outcome = cross_map(conditions, config.parallel, progress, |case, control| {
        divergence(case.as_ref(), control.as_ref(), config)
    });

    info!(
        conditions = conditions.len(),
        candidates = outcome.candidates,
        retained = outcome.values.len(),
        failed = outcome.failed,
        non_finite = outcome.non_finite,
        "pairwise divergences computed"
    );
    if outcome.discarded() * 2 > outcome.candidates {
        warn!(
            discarded = outcome.discarded(),
            candidates = outcome.candidates,
            "more than half of the pairs were discarded"
        );
    }
    outcome
}
