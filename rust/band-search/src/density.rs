//! Analytic prime-density oracle.
//!
//! Prime Number Theorem estimates: density near x is 1/ln(x). Pure functions
//! of position; nothing here searches.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::ToPrimitive;
use serde::Serialize;

/// Integers up to this many bits convert to `f64` without overflow.
const F64_SAFE_BITS: u64 = 1000;

/// Natural log of a positive integer of any size; `None` for `x <= 0`.
pub fn ln_big(x: &BigInt) -> Option<f64> {
    if x.sign() != Sign::Plus {
        return None;
    }
    let bits = x.bits();
    if bits <= F64_SAFE_BITS {
        return x.to_f64().map(f64::ln);
    }
    let shift = bits - 64;
    let top: BigInt = x >> shift;
    top.to_f64()
        .map(|t| t.ln() + shift as f64 * std::f64::consts::LN_2)
}

/// Local prime density 1/ln(x); zero below 2.
pub fn density(x: &BigInt) -> f64 {
    if *x < BigInt::from(2u32) {
        return 0.0;
    }
    match ln_big(x) {
        Some(l) if l > 0.0 => 1.0 / l,
        _ => 0.0,
    }
}

/// Simpson-weighted (1, 4, 1)/6 average of the density at
/// `center - half_width`, `center` and `center + half_width`.
pub fn density_in_range(center: &BigInt, half_width: u64) -> f64 {
    let low = density(&(center - half_width));
    let mid = density(center);
    let high = density(&(center + half_width));
    (low + 4.0 * mid + high) / 6.0
}

/// π(x) ≈ x/ln x · (1 + 1/ln x + 2/ln²x).
pub fn prime_count_estimate(x: f64) -> f64 {
    if x < 2.0 {
        return 0.0;
    }
    let l = x.ln();
    x / l * (1.0 + 1.0 / l + 2.0 / (l * l))
}

/// Expected prime gap near `x` (ln x); zero below 2.
pub fn expected_gap(x: &BigInt) -> f64 {
    if *x < BigInt::from(2u32) {
        return 0.0;
    }
    ln_big(x).unwrap_or(0.0)
}

/// Estimated range of prime indices around `floor(sqrt(N))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndexBand {
    pub lower: f64,
    pub upper: f64,
}

/// Index band `[k - εk, k + εk]` with `k = π(sqrt_n)`, lower end at least 1.
pub fn predict_index_band(sqrt_n: &BigUint, epsilon: f64) -> IndexBand {
    let center = prime_count_estimate(sqrt_n.to_f64().unwrap_or(f64::INFINITY)).floor();
    let width = (epsilon * center).floor();
    IndexBand {
        lower: (center - width).max(1.0),
        upper: center + width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_density_matches_pnt() {
        let x = BigInt::from(10_000_000_000u64);
        let expected = 1.0 / (1e10f64).ln();
        assert!((density(&x) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_density_domain_edges() {
        assert_eq!(density(&BigInt::from(1)), 0.0);
        assert_eq!(density(&BigInt::from(0)), 0.0);
        assert_eq!(density(&BigInt::from(-17)), 0.0);
        let two = density(&BigInt::from(2));
        assert!((two - 1.0 / std::f64::consts::LN_2).abs() < 1e-12);
    }

    #[test]
    fn test_density_in_range_weights() {
        let c = BigInt::from(1_000_000u64);
        let h = 1000u64;
        let expected = (density(&(&c - h)) + 4.0 * density(&c) + density(&(&c + h))) / 6.0;
        assert_eq!(density_in_range(&c, h), expected);
        // A window reaching below 2 only loses its low sample.
        let near_zero = density_in_range(&BigInt::from(3), 5);
        let manual = (4.0 * density(&BigInt::from(3)) + density(&BigInt::from(8))) / 6.0;
        assert!((near_zero - manual).abs() < 1e-15);
    }

    #[test]
    fn test_density_decreases_with_position() {
        let mut last = f64::INFINITY;
        for exp in 1..60u32 {
            let d = density(&(BigInt::from(1u32) << exp));
            assert!(d <= last);
            last = d;
        }
    }

    #[test]
    fn test_ln_big_beyond_f64() {
        let x = BigInt::from(1u32) << 3000u32;
        let l = ln_big(&x).unwrap();
        assert!((l - 3000.0 * std::f64::consts::LN_2).abs() < 1e-9);
        assert!(density(&x) > 0.0);
    }

    #[test]
    fn test_prime_count_estimate() {
        assert_eq!(prime_count_estimate(1.0), 0.0);
        let at_100 = prime_count_estimate(100.0);
        assert!((20.0..=35.0).contains(&at_100));
        let at_29 = prime_count_estimate(29.0);
        assert!((8.0..13.0).contains(&at_29));
    }

    #[test]
    fn test_predict_index_band() {
        let band = predict_index_band(&BigUint::from(10_000_000_000u64), 0.02);
        assert!(band.lower > 0.0);
        assert!(band.upper > band.lower);
        assert!(band.upper - band.lower > 1000.0);
    }

    #[test]
    fn test_expected_gap() {
        let x = BigInt::from(32759);
        assert!((expected_gap(&x) - 32759f64.ln()).abs() < 1e-12);
        assert_eq!(expected_gap(&BigInt::from(1)), 0.0);
    }
}
