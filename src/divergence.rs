//! Symmetrised Gaussian KL divergence between two growth curves.
//!
//! At every time point both models give a Gaussian `N(mean, variance)`. The
//! integrand is the sum of the two one-directional KL terms minus the
//! constant:
//!
//! ```text
//! k(t) = (vc + (mc - mk)²) / (2 vk) + (vk + (mk - mc)²) / (2 vc) - 1
//! ```
//!
//! with `k` for the case and `c` for the control. The divergence is the
//! absolute window average of `k`, divided by [`Config::normalization`].

use tracing::debug;

use crate::config::{Config, WindowAxis};
use crate::error::DomainError;
use crate::statistics::integrate;
use crate::types::{Prediction, TreatmentCondition};

/// Time interval the divergence integrates over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationWindow {
    /// Treatment start day of the case.
    pub start: f64,
    /// Last time point measured by both conditions.
    pub end: f64,
}

impl IntegrationWindow {
    /// Window length in days.
    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

/// Window from `case.drug_start_day` to the last shared measurement.
///
/// The end index is `min(case.measurement_end, control.measurement_end)`,
/// looked up on the time axis chosen by `axis`.
///
/// # Errors
///
/// `IndexOutOfBounds` if the end index is past the chosen axis, and
/// `EmptyWindow` if the end does not lie strictly after the start.
pub fn integration_window(
    case: &TreatmentCondition,
    control: &TreatmentCondition,
    axis: WindowAxis,
) -> Result<IntegrationWindow, DomainError> {
    let end_index = case.measurement_end().min(control.measurement_end());
    let reference = if axis.use_control_axis(case.n_observations(), control.n_observations()) {
        control
    } else {
        case
    };
    let window = IntegrationWindow {
        start: case.drug_start_day(),
        end: reference.time_at(end_index)?,
    };
    if !(window.end > window.start) {
        return Err(DomainError::EmptyWindow {
            start: window.start,
            end: window.end,
        });
    }
    Ok(window)
}

#[inline]
fn half_kl_sum(case: Prediction, control: Prediction) -> f64 {
    let diff = control.mean - case.mean;
    let sq = diff * diff;
    (control.variance + sq) / (2.0 * case.variance) + (case.variance + sq) / (2.0 * control.variance)
}

/// Divergence kernel at time `t` without the `-1` offset.
///
/// Useful for plotting how the two curves separate over time.
pub fn pointwise_divergence(
    case: &TreatmentCondition,
    control: &TreatmentCondition,
    t: f64,
) -> Result<f64, DomainError> {
    let k = case.model().predict(t)?;
    let c = control.model().predict(t)?;
    Ok(half_kl_sum(k, c))
}

/// Normalised divergence of `case` from `control`.
///
/// Model failures and unusable windows are returned as [`DomainError`].
/// Numerically degenerate pairs (zero or non-finite variances) are not
/// errors: the result is NaN or infinite and callers filter it.
pub fn divergence(
    case: &TreatmentCondition,
    control: &TreatmentCondition,
    config: &Config,
) -> Result<f64, DomainError> {
    let window = integration_window(case, control, config.window_axis)?;
    let integrand = |t: f64| -> Result<f64, DomainError> {
        Ok(pointwise_divergence(case, control, t)? - 1.0)
    };
    let quad = integrate(integrand, window.start, window.end, &config.quadrature)?;

    if !quad.converged && quad.value.is_finite() {
        debug!(
            case = case.name(),
            control = control.name(),
            abs_error = quad.abs_error,
            subintervals = quad.subintervals,
            "divergence integral did not reach tolerance"
        );
    }

    Ok((quad.value / window.length()).abs() / config.normalization)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;
    use std::sync::Arc;

    fn condition(
        name: &str,
        n: usize,
        end: usize,
        drug_start_day: f64,
        f: impl Fn(f64) -> Prediction + Send + Sync + 'static,
    ) -> TreatmentCondition {
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let y = DMatrix::from_element(1, n, 1.0);
        TreatmentCondition::from_parts(
            name,
            x,
            y,
            0,
            end,
            drug_start_day,
            Arc::new(move |t: f64| -> Result<Prediction, DomainError> { Ok(f(t)) }),
        )
        .unwrap()
    }

    #[test]
    fn identical_models_have_zero_divergence() {
        let a = condition("a", 10, 9, 1.0, |t| Prediction::new(t * t, 0.5 + t));
        let b = condition("b", 10, 9, 1.0, |t| Prediction::new(t * t, 0.5 + t));
        let kl = divergence(&a, &b, &Config::default()).unwrap();
        assert!(kl.abs() < 1e-10, "kl = {kl}");
    }

    #[test]
    fn constant_mean_shift_matches_closed_form() {
        // Equal unit variances, mean gap d: kernel is d², average d², scaled by 1/11
        let case = condition("case", 8, 7, 2.0, |_| Prediction::new(0.0, 1.0));
        let control = condition("ctrl", 8, 7, 2.0, |_| Prediction::new(3.0, 1.0));
        let kl = divergence(&case, &control, &Config::default()).unwrap();
        assert!((kl - 9.0 / 11.0).abs() < 1e-10);
    }

    #[test]
    fn normalization_is_configurable() {
        let case = condition("case", 8, 7, 0.0, |_| Prediction::new(0.0, 1.0));
        let control = condition("ctrl", 8, 7, 0.0, |_| Prediction::new(2.0, 1.0));
        let config = Config {
            normalization: 1.0,
            ..Config::default()
        };
        assert!((divergence(&case, &control, &config).unwrap() - 4.0).abs() < 1e-10);
    }

    #[test]
    fn window_uses_shared_end_and_axis_rule() {
        // Control has more columns but is measured to index 4 only
        let case = condition("case", 6, 5, 1.0, |_| Prediction::new(0.0, 1.0));
        let control = TreatmentCondition::from_parts(
            "ctrl",
            (0..9).map(|i| 10.0 * i as f64).collect(),
            DMatrix::from_element(1, 9, 1.0),
            0,
            4,
            1.0,
            Arc::new(|_t: f64| -> Result<Prediction, DomainError> { Ok(Prediction::new(0.0, 1.0)) }),
        )
        .unwrap();

        let longer = integration_window(&case, &control, WindowAxis::LongerSeries).unwrap();
        assert_eq!(longer, IntegrationWindow { start: 1.0, end: 40.0 });
        let shorter = integration_window(&case, &control, WindowAxis::ShorterSeries).unwrap();
        assert_eq!(shorter, IntegrationWindow { start: 1.0, end: 4.0 });
    }

    #[test]
    fn control_reusing_case_start_day_moves_window() {
        let case = condition("case", 10, 9, 3.0, |_| Prediction::new(0.0, 1.0));
        let control = condition("ctrl", 10, 9, 0.0, |_| Prediction::new(3.0, 1.0))
            .with_drug_start_day(case.drug_start_day());
        let other = condition("other", 10, 9, 0.0, |_| Prediction::new(0.0, 1.0));

        // As the case side of a control-vs-control pair the window starts at day 3
        let window = integration_window(&control, &other, WindowAxis::LongerSeries).unwrap();
        assert_eq!(window, IntegrationWindow { start: 3.0, end: 9.0 });
        let kl = divergence(&control, &other, &Config::default()).unwrap();
        assert!((kl - 9.0 / 11.0).abs() < 1e-10);

        // Reassigning past the last shared measurement empties the window
        let late = control.with_drug_start_day(9.0);
        assert!(matches!(
            divergence(&late, &other, &Config::default()),
            Err(DomainError::EmptyWindow { .. })
        ));
    }

    #[test]
    fn empty_window_is_domain_error() {
        let case = condition("case", 5, 2, 3.0, |_| Prediction::new(0.0, 1.0));
        let control = condition("ctrl", 5, 4, 3.0, |_| Prediction::new(0.0, 1.0));
        assert!(matches!(
            divergence(&case, &control, &Config::default()),
            Err(DomainError::EmptyWindow { .. })
        ));
    }

    #[test]
    fn zero_variance_yields_non_finite_value() {
        let case = condition("case", 5, 4, 0.0, |_| Prediction::new(0.0, 0.0));
        let control = condition("ctrl", 5, 4, 0.0, |_| Prediction::new(1.0, 1.0));
        let kl = divergence(&case, &control, &Config::default()).unwrap();
        assert!(!kl.is_finite());
    }

    #[test]
    fn model_failure_propagates() {
        let case = condition("case", 5, 4, 0.0, |_| Prediction::new(0.0, 1.0));
        let control = TreatmentCondition::from_parts(
            "ctrl",
            vec![0.0, 1.0, 2.0, 3.0, 4.0],
            DMatrix::from_element(1, 5, 1.0),
            0,
            4,
            0.0,
            Arc::new(|t: f64| -> Result<Prediction, DomainError> {
                Err(DomainError::ModelEvaluation {
                    time: t,
                    reason: "not fitted".into(),
                })
            }),
        )
        .unwrap();
        assert!(matches!(
            divergence(&case, &control, &Config::default()),
            Err(DomainError::ModelEvaluation { .. })
        ));
    }

    #[test]
    fn pointwise_kernel_is_one_for_identical_gaussians() {
        let a = condition("a", 3, 2, 0.0, |_| Prediction::new(5.0, 2.0));
        assert!((pointwise_divergence(&a, &a, 1.0).unwrap() - 1.0).abs() < 1e-12);
    }
}
