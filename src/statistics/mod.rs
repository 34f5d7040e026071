//! Numerical primitives for divergence integration and null calibration.
//!
//! - Adaptive Gauss-Kronrod quadrature with bounded subdivision
//! - Gaussian kernel density with leave-one-out bandwidth selection
//! - Quantiles (R-7) and bootstrap intervals on them
//! - Kendall rank correlation

mod bootstrap;
mod kde;
mod quadrature;
mod quantile;
mod rank;

pub use bootstrap::{bootstrap_quantile, counter_rng_seed, resample_into, QuantileInterval};
pub use kde::{loo_log_likelihood, normal_reference_bandwidth, KernelDensity};
pub use quadrature::{integrate, Quadrature};
pub use quantile::compute_quantile_sorted;
pub use rank::kendall_tau_b;
