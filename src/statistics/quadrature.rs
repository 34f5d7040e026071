//! Adaptive Gauss-Kronrod quadrature.
//!
//! Globally adaptive bisection on the 21-point Kronrod rule (with the
//! embedded 10-point Gauss rule for the error estimate), in the style of
//! QUADPACK's QAG. The number of subintervals is bounded, so integration
//! terminates on any integrand; callers check [`Quadrature::converged`].
//!
//! The integrand is fallible: the first error aborts integration and is
//! returned unchanged.

use crate::config::QuadratureConfig;

/// Kronrod abscissae (positive half, descending, last is the centre).
const XGK: [f64; 11] = [
    0.995_657_163_025_808_080_735_527_280_689,
    0.973_906_528_517_171_720_077_964_012_084,
    0.930_157_491_355_708_226_001_207_180_060,
    0.865_063_366_688_984_510_732_096_688_423,
    0.780_817_726_586_416_897_063_717_578_345,
    0.679_409_568_299_024_406_234_327_365_115,
    0.562_757_134_668_604_683_339_000_099_273,
    0.433_395_394_129_247_190_799_265_943_166,
    0.294_392_862_701_460_198_131_126_603_104,
    0.148_874_338_981_631_210_884_826_001_130,
    0.0,
];

/// Kronrod weights matching [`XGK`].
const WGK: [f64; 11] = [
    0.011_694_638_867_371_874_278_064_396_062,
    0.032_558_162_307_964_727_478_818_972_459,
    0.054_755_896_574_351_996_031_381_300_245,
    0.075_039_674_810_919_952_767_043_140_916,
    0.093_125_454_583_697_605_535_065_465_083,
    0.109_387_158_802_297_641_899_210_590_326,
    0.123_491_976_262_065_851_077_208_323_414,
    0.134_709_217_311_473_325_928_054_001_772,
    0.142_775_938_577_060_080_797_094_273_139,
    0.147_739_104_901_338_491_374_841_515_972,
    0.149_445_554_002_916_905_664_936_468_390,
];

/// 10-point Gauss weights for the odd Kronrod abscissae.
const WG: [f64; 5] = [
    0.066_671_344_308_688_137_593_568_809_893,
    0.149_451_349_150_580_593_145_776_339_658,
    0.219_086_362_515_982_043_995_534_934_228,
    0.269_266_719_309_996_355_091_226_921_569,
    0.295_524_224_714_752_870_173_892_994_651,
];

/// Result of an adaptive integration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadrature {
    /// Integral estimate.
    pub value: f64,
    /// Estimated absolute error.
    pub abs_error: f64,
    /// Subintervals used.
    pub subintervals: usize,
    /// Whether the error target was met within the subdivision limit.
    pub converged: bool,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    a: f64,
    b: f64,
    value: f64,
    error: f64,
}

/// Integrate `f` over `[a, b]`.
///
/// Stops when the summed error estimate drops below
/// `max(abs_tol, rel_tol * |value|)` or when `config.limit` subintervals
/// are in use. Non-finite integrand values propagate into the result.
pub fn integrate<F, E>(mut f: F, a: f64, b: f64, config: &QuadratureConfig) -> Result<Quadrature, E>
where
    F: FnMut(f64) -> Result<f64, E>,
{
    if a == b {
        return Ok(Quadrature {
            value: 0.0,
            abs_error: 0.0,
            subintervals: 0,
            converged: true,
        });
    }

    let limit = config.limit.max(1);
    let (value, error) = kronrod21(&mut f, a, b)?;
    let mut segments = vec![Segment { a, b, value, error }];
    let mut total = value;
    let mut total_error = error;

    while segments.len() < limit && total_error > tolerance(config, total) {
        // Bisect the segment with the largest error
        let worst = segments
            .iter()
            .enumerate()
            .max_by(|(_, l), (_, r)| l.error.total_cmp(&r.error))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let seg = segments[worst];
        let mid = 0.5 * (seg.a + seg.b);
        if mid == seg.a || mid == seg.b {
            // Interval no longer representable; cannot refine further
            break;
        }

        let (left_value, left_error) = kronrod21(&mut f, seg.a, mid)?;
        let (right_value, right_error) = kronrod21(&mut f, mid, seg.b)?;
        segments[worst] = Segment {
            a: seg.a,
            b: mid,
            value: left_value,
            error: left_error,
        };
        segments.push(Segment {
            a: mid,
            b: seg.b,
            value: right_value,
            error: right_error,
        });

        total = segments.iter().map(|s| s.value).sum();
        total_error = segments.iter().map(|s| s.error).sum();
    }

    Ok(Quadrature {
        value: total,
        abs_error: total_error,
        subintervals: segments.len(),
        converged: total_error <= tolerance(config, total),
    })
}

fn tolerance(config: &QuadratureConfig, value: f64) -> f64 {
    config.abs_tol.max(config.rel_tol * value.abs())
}

/// 21-point Kronrod estimate and QUADPACK-style error over `[a, b]`.
fn kronrod21<F, E>(f: &mut F, a: f64, b: f64) -> Result<(f64, f64), E>
where
    F: FnMut(f64) -> Result<f64, E>,
{
    let center = 0.5 * (a + b);
    let half = 0.5 * (b - a);
    let abs_half = half.abs();

    let fc = f(center)?;
    let mut res_gauss = 0.0;
    let mut res_kronrod = WGK[10] * fc;
    let mut res_abs = res_kronrod.abs();
    let mut fv1 = [0.0; 10];
    let mut fv2 = [0.0; 10];

    // Abscissae shared with the Gauss rule
    for (j, &wg) in WG.iter().enumerate() {
        let k = 2 * j + 1;
        let dx = half * XGK[k];
        let f1 = f(center - dx)?;
        let f2 = f(center + dx)?;
        fv1[k] = f1;
        fv2[k] = f2;
        res_gauss += wg * (f1 + f2);
        res_kronrod += WGK[k] * (f1 + f2);
        res_abs += WGK[k] * (f1.abs() + f2.abs());
    }

    // Kronrod-only abscissae
    for j in 0..5 {
        let k = 2 * j;
        let dx = half * XGK[k];
        let f1 = f(center - dx)?;
        let f2 = f(center + dx)?;
        fv1[k] = f1;
        fv2[k] = f2;
        res_kronrod += WGK[k] * (f1 + f2);
        res_abs += WGK[k] * (f1.abs() + f2.abs());
    }

    let mean = 0.5 * res_kronrod;
    let mut res_asc = WGK[10] * (fc - mean).abs();
    for k in 0..10 {
        res_asc += WGK[k] * ((fv1[k] - mean).abs() + (fv2[k] - mean).abs());
    }

    let result = res_kronrod * half;
    let res_abs = res_abs * abs_half;
    let res_asc = res_asc * abs_half;
    let mut error = ((res_kronrod - res_gauss) * half).abs();

    if res_asc != 0.0 && error != 0.0 {
        error = res_asc * (200.0 * error / res_asc).powf(1.5).min(1.0);
    }
    if res_abs > f64::MIN_POSITIVE / (50.0 * f64::EPSILON) {
        error = error.max(50.0 * f64::EPSILON * res_abs);
    }

    Ok((result, error))
}
