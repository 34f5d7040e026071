//! Sample quantiles of sorted data (R-7: linear interpolation between order
//! statistics, the default of R and NumPy).

/// Fractional order-statistic position `(n - 1) p` split into index and weight.
#[inline]
fn r7_position(n: usize, p: f64) -> (usize, f64) {
    let h = (n - 1) as f64 * p;
    let index = h.floor() as usize;
    (index, h - h.floor())
}

/// Quantile of data that is already sorted ascending.
///
/// # Panics
///
/// Panics if `sorted` is empty or if `p` is outside [0, 1].
pub fn compute_quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    assert!(!sorted.is_empty(), "Cannot compute quantile of empty slice");
    assert!((0.0..=1.0).contains(&p), "Quantile probability must be in [0, 1]");

    let (index, weight) = r7_position(sorted.len(), p);
    match sorted.get(index + 1) {
        Some(&next) if weight > 0.0 => sorted[index] + weight * (next - sorted[index]),
        _ => sorted[index.min(sorted.len() - 1)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_and_extremes() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(compute_quantile_sorted(&sorted, 0.5), 3.0);
        assert_eq!(compute_quantile_sorted(&sorted, 0.0), 1.0);
        assert_eq!(compute_quantile_sorted(&sorted, 1.0), 5.0);
    }

    #[test]
    fn test_interpolates_between_order_statistics() {
        let sorted = [0.0, 10.0];
        assert!((compute_quantile_sorted(&sorted, 0.95) - 9.5).abs() < 1e-12);
        // (n - 1) p = 8.55 for n = 10
        let ten: Vec<f64> = (1..=10).map(|i| i as f64).collect();
        assert!((compute_quantile_sorted(&ten, 0.95) - 9.55).abs() < 1e-12);
    }

    #[test]
    fn test_single_value() {
        assert_eq!(compute_quantile_sorted(&[4.2], 0.3), 4.2);
    }

    #[test]
    #[should_panic(expected = "Cannot compute quantile of empty slice")]
    fn test_empty_slice_panics() {
        compute_quantile_sorted(&[], 0.5);
    }
}
