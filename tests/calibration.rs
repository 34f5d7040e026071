//! Calibration of observed divergences against a fitted null.

use kulgap::{
    calibrate, density_survival, empirical_p_value, p_values, Config, DomainError,
    NullDistribution,
};
use rand::SeedableRng;
use rand_distr::{Distribution, Exp};
use rand_xoshiro::Xoshiro256PlusPlus;

fn exponential_null(n: usize, seed: u64) -> NullDistribution {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let exp = Exp::new(2.0).unwrap();
    let values: Vec<f64> = (0..n).map(|_| exp.sample(&mut rng)).collect();
    NullDistribution::from_values(values, &Config::quick()).unwrap()
}

#[test]
fn p_value_is_bounded_and_non_increasing() {
    let null = exponential_null(120, 3);
    let mut previous = f64::INFINITY;
    for step in 0..60 {
        let observed = step as f64 * 0.05;
        let p = empirical_p_value(observed, &null);
        assert!(p > 0.0 && p <= 1.0, "p = {p} at {observed}");
        assert!(p <= previous, "p increased at {observed}");
        previous = p;
    }
}

#[test]
fn survival_is_bounded_and_non_increasing() {
    let null = exponential_null(80, 5);
    let mut previous = 1.0;
    for step in 0..40 {
        let observed = step as f64 * 0.1 - 0.5;
        let s = density_survival(observed, &null).unwrap();
        assert!((0.0..=1.0).contains(&s));
        assert!(s <= previous + 1e-12);
        previous = s;
    }
}

#[test]
fn far_tail_gets_smallest_p_value() {
    let values: Vec<f64> = (1..50).map(|v| v as f64).collect();
    let n = values.len();
    let null = NullDistribution::from_values(values, &Config::quick()).unwrap();
    let p = empirical_p_value(100.0, &null);
    assert_eq!(p, 1.0 / (n as f64 + 1.0));
    assert!(density_survival(100.0, &null).unwrap() < 1e-3);
}

#[test]
fn nan_observation() {
    let null = exponential_null(30, 9);
    assert_eq!(empirical_p_value(f64::NAN, &null), 1.0);
    assert!(matches!(
        calibrate(f64::NAN, &null),
        Err(DomainError::NonFiniteObservation(_))
    ));
}

#[test]
fn batch_p_values_match_single_queries() {
    let null = exponential_null(50, 11);
    let observed = [0.0, 0.2, 0.5, 1.0, 4.0];
    let batch = p_values(&observed, null.values());
    for (&y, &p) in observed.iter().zip(&batch) {
        assert!((empirical_p_value(y, &null) - p).abs() < 1e-15);
    }
}

#[test]
fn critical_value_separates_significant_calls() {
    let null = exponential_null(200, 13);
    let alpha = 0.05;
    let critical = null.critical_value(alpha).unwrap();
    let above = calibrate(critical * 1.1, &null).unwrap();
    let below = calibrate(critical * 0.9, &null).unwrap();
    assert!(above.is_significant(alpha));
    assert!(!below.is_significant(alpha));
}
