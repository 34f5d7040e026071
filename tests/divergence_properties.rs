//! Properties of the case-vs-control divergence.

use std::sync::Arc;

use kulgap::{
    divergence, pointwise_divergence, Config, DomainError, GrowthModel, LinearInterpolant,
    Prediction, TreatmentCondition, WindowAxis,
};
use nalgebra::DMatrix;

fn days(n: usize) -> Vec<f64> {
    (0..n).map(|i| 3.0 * i as f64).collect()
}

fn condition(name: &str, n: usize, drug_start_day: f64, model: Arc<dyn GrowthModel>) -> TreatmentCondition {
    TreatmentCondition::from_parts(
        name,
        days(n),
        DMatrix::from_element(3, n, 100.0),
        0,
        n - 1,
        drug_start_day,
        model,
    )
    .unwrap()
}

fn tabulated(n: usize, mean: impl Fn(f64) -> f64, variance: impl Fn(f64) -> f64) -> Arc<dyn GrowthModel> {
    let times = days(n);
    let means = times.iter().map(|&t| mean(t)).collect();
    let variances = times.iter().map(|&t| variance(t)).collect();
    Arc::new(LinearInterpolant::new(times, means, variances).unwrap())
}

#[test]
fn identical_models_give_zero() {
    let model = tabulated(12, |t| 100.0 + 5.0 * t, |t| 4.0 + 0.1 * t);
    let a = condition("a", 12, 6.0, model.clone());
    let b = condition("b", 12, 6.0, model);
    let kl = divergence(&a, &b, &Config::default()).unwrap();
    assert!(kl.abs() < 1e-9, "kl = {kl}");
}

#[test]
fn symmetric_under_equal_variances() {
    let variance = |t: f64| 2.0 + 0.05 * t;
    let a = condition("a", 10, 3.0, tabulated(10, |t| 100.0 + 2.0 * t, variance));
    let b = condition("b", 10, 3.0, tabulated(10, |t| 100.0 + 6.0 * t, variance));
    let config = Config::default();
    let ab = divergence(&a, &b, &config).unwrap();
    let ba = divergence(&b, &a, &config).unwrap();
    assert!(ab > 0.0);
    assert!((ab - ba).abs() < 1e-9 * ab.max(1.0), "{ab} vs {ba}");
}

#[test]
fn larger_separation_gives_larger_divergence() {
    let control = condition("ctrl", 10, 0.0, tabulated(10, |t| 100.0 + t, |_| 9.0));
    let near = condition("near", 10, 0.0, tabulated(10, |t| 100.0 + 1.5 * t, |_| 9.0));
    let far = condition("far", 10, 0.0, tabulated(10, |t| 100.0 + 4.0 * t, |_| 9.0));
    let config = Config::default();
    assert!(divergence(&far, &control, &config).unwrap() > divergence(&near, &control, &config).unwrap());
}

#[test]
fn window_axis_changes_end_time_for_unequal_series() {
    // Control measured on a longer, sparser axis
    let case = condition("case", 6, 0.0, tabulated(6, |_| 0.0, |_| 1.0));
    let control_times: Vec<f64> = (0..9).map(|i| 6.0 * i as f64).collect();
    let control_model: Arc<dyn GrowthModel> = Arc::new(
        LinearInterpolant::new(control_times.clone(), vec![0.0; 9], vec![1.0; 9]).unwrap(),
    );
    let control = TreatmentCondition::from_parts(
        "ctrl",
        control_times,
        DMatrix::from_element(2, 9, 1.0),
        0,
        8,
        0.0,
        control_model,
    )
    .unwrap();

    let longer = kulgap::integration_window(&case, &control, WindowAxis::LongerSeries).unwrap();
    let shorter = kulgap::integration_window(&case, &control, WindowAxis::ShorterSeries).unwrap();
    // min(end) = 5: control axis gives day 30, case axis day 15
    assert_eq!(longer.end, 30.0);
    assert_eq!(shorter.end, 15.0);

    // Case model only covers day 15, so the longer window cannot be evaluated
    let config = Config::default();
    assert!(matches!(
        divergence(&case, &control, &config),
        Err(DomainError::OutOfRange { .. })
    ));
    let shorter_config = Config {
        window_axis: WindowAxis::ShorterSeries,
        ..Config::default()
    };
    assert_eq!(divergence(&case, &control, &shorter_config).unwrap(), 0.0);
}

#[test]
fn pointwise_kernel_grows_with_mean_gap() {
    let case = condition("case", 5, 0.0, tabulated(5, |t| t, |_| 1.0));
    let control = condition("ctrl", 5, 0.0, tabulated(5, |_| 0.0, |_| 1.0));
    let early = pointwise_divergence(&case, &control, 1.0).unwrap();
    let late = pointwise_divergence(&case, &control, 10.0).unwrap();
    // Unit variances: kernel is 1 + gap²
    assert!((early - 2.0).abs() < 1e-12);
    assert!((late - 101.0).abs() < 1e-12);
}

#[test]
fn closures_implement_growth_model() {
    let model: Arc<dyn GrowthModel> =
        Arc::new(|t: f64| -> Result<Prediction, DomainError> { Ok(Prediction::new(t.sqrt(), 1.0)) });
    let a = condition("a", 8, 0.0, model.clone());
    let b = condition("b", 8, 0.0, model);
    assert_eq!(divergence(&a, &b, &Config::quick()).unwrap(), 0.0);
}
