//! Configuration for divergence computation, null construction and calls.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ALPHA, DEFAULT_MRECIST_THRESHOLD, DEFAULT_TGI_THRESHOLD, KL_NORMALIZATION,
    QUAD_ABS_TOL, QUAD_LIMIT, QUAD_REL_TOL,
};

/// Configuration options for [`Kulgap`](crate::Kulgap) and the free functions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Divisor applied to the window-averaged divergence (default: 11.0).
    pub normalization: f64,

    /// Which condition's time axis bounds the integration window.
    pub window_axis: WindowAxis,

    /// Adaptive quadrature settings.
    pub quadrature: QuadratureConfig,

    /// Cross-validated bandwidth search settings.
    pub bandwidth: BandwidthSearch,

    /// Significance level for KuLGaP, AUC and angle calls (default: 0.05).
    pub alpha: f64,

    /// TGI above which a case is a responder (default: 0.6).
    pub tgi_threshold: f64,

    /// Fraction of mPD replicates below which mRECIST calls a responder (default: 0.5).
    pub mrecist_threshold: f64,

    /// Evaluate pairwise divergences on the shared thread pool (default: true).
    ///
    /// Has no effect without the `parallel` feature.
    pub parallel: bool,

    /// Bootstrap iterations for the critical-value interval (default: 2,000).
    pub bootstrap_iterations: usize,

    /// Optional deterministic seed for bootstrap resampling.
    pub seed: Option<u64>,
}

/// Rule selecting the time axis that bounds the integration window.
///
/// The end of the window is `x[min(case.end, control.end)]`, read from one
/// of the two conditions. Both rules prefer the control when the two series
/// have the same number of observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowAxis {
    /// Use the axis of the condition with more observations (default).
    LongerSeries,
    /// Use the axis of the condition with fewer observations.
    ///
    /// Matches the historical KuLGaP scripts.
    ShorterSeries,
}

/// Adaptive Gauss-Kronrod quadrature settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadratureConfig {
    /// Maximum number of subintervals (default: 100).
    pub limit: usize,
    /// Absolute error target (default: 1.49e-8).
    pub abs_tol: f64,
    /// Relative error target (default: 1.49e-8).
    pub rel_tol: f64,
}

/// Leave-one-out likelihood bandwidth search.
///
/// The search runs over `log(h)` in
/// `[log(h0 * lower_factor), log(h0 * upper_factor)]`, where `h0` is the
/// normal-reference bandwidth: a coarse grid first, then golden-section
/// refinement around the best grid point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandwidthSearch {
    /// Grid points for the coarse scan (default: 64).
    pub grid_points: usize,
    /// Smallest bandwidth as a multiple of `h0` (default: 1e-3).
    pub lower_factor: f64,
    /// Largest bandwidth as a multiple of `h0` (default: 10).
    pub upper_factor: f64,
    /// Stopping width of the golden-section bracket in `log(h)` (default: 1e-6).
    pub tolerance: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            normalization: KL_NORMALIZATION,
            window_axis: WindowAxis::LongerSeries,
            quadrature: QuadratureConfig::default(),
            bandwidth: BandwidthSearch::default(),
            alpha: DEFAULT_ALPHA,
            tgi_threshold: DEFAULT_TGI_THRESHOLD,
            mrecist_threshold: DEFAULT_MRECIST_THRESHOLD,
            parallel: true,
            bootstrap_iterations: 2_000,
            seed: None,
        }
    }
}

impl Config {
    /// Reduced search effort for tests and interactive use.
    ///
    /// Settings:
    /// - 24 bandwidth grid points (vs 64 default)
    /// - 200 bootstrap iterations (vs 2,000 default)
    /// - fixed seed 42
    pub fn quick() -> Self {
        Self {
            bandwidth: BandwidthSearch {
                grid_points: 24,
                tolerance: 1e-4,
                ..BandwidthSearch::default()
            },
            bootstrap_iterations: 200,
            seed: Some(42),
            ..Self::default()
        }
    }
}

impl Default for WindowAxis {
    fn default() -> Self {
        Self::LongerSeries
    }
}

impl Default for QuadratureConfig {
    fn default() -> Self {
        Self {
            limit: QUAD_LIMIT,
            abs_tol: QUAD_ABS_TOL,
            rel_tol: QUAD_REL_TOL,
        }
    }
}

impl Default for BandwidthSearch {
    fn default() -> Self {
        Self {
            grid_points: 64,
            lower_factor: 1e-3,
            upper_factor: 10.0,
            tolerance: 1e-6,
        }
    }
}

impl WindowAxis {
    /// Whether the control's time axis bounds the window.
    pub fn use_control_axis(&self, case_len: usize, control_len: usize) -> bool {
        match self {
            Self::LongerSeries => control_len >= case_len,
            Self::ShorterSeries => control_len <= case_len,
        }
    }
}
