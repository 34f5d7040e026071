//! Bootstrap resampling of the null values.
//!
//! Quantifies how stable the empirical critical value is for the size of
//! the cohort: the null list is resampled with replacement and the upper
//! quantile recomputed on every replicate.

use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use super::quantile::compute_quantile_sorted;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Counter-based RNG seed generation using SplitMix64.
///
/// Stateless PRF giving deterministic, well-distributed seeds from a base
/// seed and an iteration counter, so parallel replicates are reproducible
/// regardless of scheduling.
#[inline]
pub fn counter_rng_seed(base_seed: u64, counter: u64) -> u64 {
    // SplitMix64, see https://xoshiro.di.unimi.it/splitmix64.c
    let mut z = base_seed.wrapping_add(counter.wrapping_mul(0x9e3779b97f4a7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// Resample `data` with replacement into `out`.
///
/// # Panics
///
/// Panics if `out.len() != data.len()`.
pub fn resample_into<R: Rng>(data: &[f64], rng: &mut R, out: &mut [f64]) {
    assert_eq!(
        out.len(),
        data.len(),
        "Output buffer must have same length as input data"
    );
    if data.is_empty() {
        return;
    }
    for slot in out.iter_mut() {
        *slot = data[rng.random_range(0..data.len())];
    }
}

/// Bootstrap distribution summary of an upper quantile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantileInterval {
    /// Quantile of the original sample.
    pub estimate: f64,
    /// Lower bound of the percentile interval.
    pub lower: f64,
    /// Upper bound of the percentile interval.
    pub upper: f64,
    /// Number of bootstrap replicates.
    pub iterations: usize,
}

/// Percentile-bootstrap interval for the `p`-quantile of `data`.
///
/// `confidence` is the interval's coverage (e.g. 0.95). Returns `None` if
/// `data` is empty or `iterations` is zero.
///
/// # Panics
///
/// Panics if `p` or `confidence` is outside [0, 1].
pub fn bootstrap_quantile(
    data: &[f64],
    p: f64,
    confidence: f64,
    iterations: usize,
    seed: Option<u64>,
) -> Option<QuantileInterval> {
    assert!((0.0..=1.0).contains(&confidence), "Confidence must be in [0, 1]");
    if data.is_empty() || iterations == 0 {
        return None;
    }
    let base_seed = seed.unwrap_or(42);
    let n = data.len();

    let replicate = |i: usize, buffer: &mut Vec<f64>| -> f64 {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(counter_rng_seed(base_seed, i as u64));
        resample_into(data, &mut rng, buffer);
        buffer.sort_unstable_by(|a, b| a.total_cmp(b));
        compute_quantile_sorted(buffer, p)
    };

    #[cfg(feature = "parallel")]
    let mut stats: Vec<f64> = crate::thread_pool::install(|| {
        (0..iterations)
            .into_par_iter()
            .map_init(|| vec![0.0; n], |buffer, i| replicate(i, buffer))
            .collect()
    });

    #[cfg(not(feature = "parallel"))]
    let mut stats: Vec<f64> = {
        let mut buffer = vec![0.0; n];
        (0..iterations).map(|i| replicate(i, &mut buffer)).collect()
    };

    let mut sorted = data.to_vec();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    let estimate = compute_quantile_sorted(&sorted, p);

    stats.sort_unstable_by(|a, b| a.total_cmp(b));
    let tail = 0.5 * (1.0 - confidence);
    Some(QuantileInterval {
        estimate,
        lower: compute_quantile_sorted(&stats, tail),
        upper: compute_quantile_sorted(&stats, 1.0 - tail),
        iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_seed_is_deterministic_and_distinct() {
        assert_eq!(counter_rng_seed(7, 3), counter_rng_seed(7, 3));
        assert_ne!(counter_rng_seed(7, 3), counter_rng_seed(7, 4));
        assert_ne!(counter_rng_seed(7, 3), counter_rng_seed(8, 3));
    }

    #[test]
    fn test_resample_draws_from_data() {
        let data: Vec<f64> = (0..50).map(|x| x as f64).collect();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let mut out = vec![0.0; data.len()];
        resample_into(&data, &mut rng, &mut out);
        for val in &out {
            assert!(data.contains(val));
        }
    }

    #[test]
    fn test_bootstrap_interval_brackets_estimate() {
        let data: Vec<f64> = (1..=200).map(|x| (x as f64).sqrt()).collect();
        let interval = bootstrap_quantile(&data, 0.95, 0.9, 300, Some(1)).unwrap();
        assert!(interval.lower <= interval.estimate + 1e-12);
        assert!(interval.upper >= interval.estimate - 1e-12);
        assert_eq!(interval.iterations, 300);
    }

    #[test]
    fn test_bootstrap_is_reproducible() {
        let data: Vec<f64> = (0..64).map(|x| ((x * 37) % 64) as f64).collect();
        let a = bootstrap_quantile(&data, 0.9, 0.95, 100, Some(9)).unwrap();
        let b = bootstrap_quantile(&data, 0.9, 0.95, 100, Some(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_bootstrap_empty() {
        assert!(bootstrap_quantile(&[], 0.9, 0.95, 100, None).is_none());
        assert!(bootstrap_quantile(&[1.0], 0.9, 0.95, 0, None).is_none());
    }
}
