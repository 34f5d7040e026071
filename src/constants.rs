//! Numerical constants shared across modules.

/// Divisor applied to the window-averaged divergence.
///
/// Calibrates the statistic's scale against historical xenograft data.
/// Empirically tuned; kept as-is pending domain-expert review.
pub const KL_NORMALIZATION: f64 = 11.0;

/// Maximum number of subintervals for adaptive quadrature.
pub const QUAD_LIMIT: usize = 100;

/// Absolute tolerance for adaptive quadrature.
pub const QUAD_ABS_TOL: f64 = 1.49e-8;

/// Relative tolerance for adaptive quadrature.
pub const QUAD_REL_TOL: f64 = 1.49e-8;

/// Default significance level for responder calls.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Tumour growth inhibition above which a case is called a responder.
pub const DEFAULT_TGI_THRESHOLD: f64 = 0.6;

/// Fraction of progressive-disease replicates below which mRECIST calls a responder.
pub const DEFAULT_MRECIST_THRESHOLD: f64 = 0.5;

/// Normal-reference rule factor (Silverman / Scott style) for the starting bandwidth.
pub const NORMAL_REFERENCE_FACTOR: f64 = 1.06;

/// 1/sqrt(2*pi).
pub const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Name of the control arm inside a cancer model.
pub const CONTROL_ARM: &str = "Control";
