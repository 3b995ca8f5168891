//! Torus embedding and geodesic amplitude.
//!
//! An integer n maps to the point `(frac(n·φ^1), ..., frac(n·φ^dims))` on the
//! unit torus, optionally bent by `x -> frac(x^k)`. The amplitude of a
//! candidate is the wrapped Euclidean distance between its point and the
//! point of `floor(sqrt(N))`. Lower is more plausible. Amplitude only orders
//! candidates; it never decides whether one is emitted.
//!
//! `φ^d = (L_d + F_d·√5) / 2` with Lucas and Fibonacci numbers, so the only
//! rounding in `frac(n·φ^d)` is one integer square root at the working
//! precision of the search.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Signed, Zero};

use crate::error::SearchError;
use crate::precision::PrecisionContext;

pub const DEFAULT_DIMENSIONS: usize = 7;
pub const DEFAULT_K: f64 = 0.35;

/// A point on the unit torus: one fixed-point coordinate in `[0, 1)` per
/// dimension, scaled by the precision context that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorusEmbedding {
    coords: Vec<BigInt>,
}

impl TorusEmbedding {
    /// Build from real coordinates, each reduced into `[0, 1)`.
    pub fn from_f64(ctx: &PrecisionContext, coords: &[f64]) -> Self {
        TorusEmbedding {
            coords: coords.iter().map(|&c| ctx.frac(&ctx.from_f64(c))).collect(),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.coords.len()
    }

    pub fn coords(&self) -> &[BigInt] {
        &self.coords
    }

    pub fn to_f64(&self, ctx: &PrecisionContext) -> Vec<f64> {
        self.coords.iter().map(|c| ctx.to_f64(c)).collect()
    }
}

/// Scores a candidate value; lower means more plausible.
pub trait AmplitudeScorer {
    fn amplitude(&self, value: &BigUint) -> f64;
}

/// Scorer that reports zero for every value.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatScorer;

impl AmplitudeScorer for FlatScorer {
    fn amplitude(&self, _value: &BigUint) -> f64 {
        0.0
    }
}

fn check_exponent(k: f64) -> Result<(), SearchError> {
    if k > 0.0 && k <= 1.0 {
        Ok(())
    } else {
        Err(SearchError::InvalidExponent(k))
    }
}

/// `(L_d, F_d)` for `d = 1..=dims`.
fn golden_powers(dims: usize) -> Vec<(BigUint, BigUint)> {
    let mut powers = Vec::with_capacity(dims);
    let (mut lucas_prev, mut lucas) = (BigUint::from(2u32), BigUint::one());
    let (mut fib_prev, mut fib) = (BigUint::zero(), BigUint::one());
    for _ in 0..dims {
        powers.push((lucas.clone(), fib.clone()));
        let lucas_next = &lucas + &lucas_prev;
        lucas_prev = std::mem::replace(&mut lucas, lucas_next);
        let fib_next = &fib + &fib_prev;
        fib_prev = std::mem::replace(&mut fib, fib_next);
    }
    powers
}

/// `frac(n · (lucas + fib·√5) / 2)` at the context's precision.
fn frac_golden_multiple(
    ctx: &PrecisionContext,
    n: &BigUint,
    lucas: &BigUint,
    fib: &BigUint,
) -> BigInt {
    let bits = ctx.bits();
    let rational: BigUint = (n * lucas) << bits;
    let nf = n * fib;
    let irrational = ((&nf * &nf * 5u32) << (2 * bits)).sqrt();
    let scaled: BigUint = (rational + irrational) >> 1u32;
    ctx.frac(&BigInt::from_biguint(Sign::Plus, scaled))
}

fn embed_with(
    ctx: &PrecisionContext,
    n: &BigUint,
    exponent: Option<&BigInt>,
    golden: &[(BigUint, BigUint)],
) -> TorusEmbedding {
    let coords = golden
        .iter()
        .map(|(lucas, fib)| {
            let coord = frac_golden_multiple(ctx, n, lucas, fib);
            match exponent {
                Some(k) => ctx.frac(&ctx.powf(&coord, k)),
                None => coord,
            }
        })
        .collect();
    TorusEmbedding { coords }
}

/// Embed `n` into the `dims`-dimensional torus with geodesic exponent `k`.
pub fn embed(
    ctx: &PrecisionContext,
    n: &BigUint,
    k: f64,
    dims: usize,
) -> Result<TorusEmbedding, SearchError> {
    check_exponent(k)?;
    if dims == 0 {
        return Err(SearchError::ZeroDimensions);
    }
    let exponent = (k != 1.0).then(|| ctx.from_f64(k));
    Ok(embed_with(ctx, n, exponent.as_ref(), &golden_powers(dims)))
}

/// Wrapped Euclidean distance: per dimension `min(|a-b|, 1-|a-b|)`.
/// Dimensions beyond the shorter embedding are ignored.
pub fn geodesic_distance(ctx: &PrecisionContext, a: &TorusEmbedding, b: &TorusEmbedding) -> BigInt {
    let one = ctx.one();
    let sum = a
        .coords
        .iter()
        .zip(&b.coords)
        .map(|(x, y)| {
            let diff = (x - y).abs();
            let wrapped = one - &diff;
            let shortest = if wrapped < diff { wrapped } else { diff };
            ctx.mul(&shortest, &shortest)
        })
        .fold(BigInt::zero(), |acc, sq| acc + sq);
    ctx.sqrt(&sum)
}

/// A value scored against the anchor, as produced by [`GeodesicRanker::rank`].
#[derive(Debug, Clone, PartialEq)]
pub struct RankedValue {
    pub value: BigUint,
    pub amplitude: f64,
    pub is_divisor: bool,
}

/// Geodesic scorer anchored at `floor(sqrt(N))` for one search.
///
/// Owns the search's [`PrecisionContext`]; every embedding and distance it
/// computes uses that context and nothing else.
#[derive(Debug, Clone)]
pub struct GeodesicRanker {
    ctx: PrecisionContext,
    k_value: f64,
    exponent: Option<BigInt>,
    golden: Vec<(BigUint, BigUint)>,
    anchor: TorusEmbedding,
}

impl GeodesicRanker {
    pub fn new(
        ctx: PrecisionContext,
        anchor: &BigUint,
        k: f64,
        dims: usize,
    ) -> Result<Self, SearchError> {
        check_exponent(k)?;
        if dims == 0 {
            return Err(SearchError::ZeroDimensions);
        }
        let exponent = (k != 1.0).then(|| ctx.from_f64(k));
        let golden = golden_powers(dims);
        let anchor = embed_with(&ctx, anchor, exponent.as_ref(), &golden);
        Ok(GeodesicRanker {
            ctx,
            k_value: k,
            exponent,
            golden,
            anchor,
        })
    }

    pub fn context(&self) -> &PrecisionContext {
        &self.ctx
    }

    pub fn k_value(&self) -> f64 {
        self.k_value
    }

    pub fn anchor(&self) -> &TorusEmbedding {
        &self.anchor
    }

    pub fn embed(&self, n: &BigUint) -> TorusEmbedding {
        embed_with(&self.ctx, n, self.exponent.as_ref(), &self.golden)
    }

    /// Fixed-point distance from the anchor.
    pub fn distance(&self, n: &BigUint) -> BigInt {
        geodesic_distance(&self.ctx, &self.embed(n), &self.anchor)
    }

    /// Order `values` by ascending distance from the anchor, flagging the
    /// ones that divide `n`. Ties keep input order.
    pub fn rank<I>(&self, n: &BigUint, values: I) -> Vec<RankedValue>
    where
        I: IntoIterator<Item = BigUint>,
    {
        let mut scored: Vec<(BigInt, BigUint)> = values
            .into_iter()
            .map(|v| (self.distance(&v), v))
            .collect();
        scored.sort_by(|a, b| a.0.cmp(&b.0));
        scored
            .into_iter()
            .map(|(distance, value)| RankedValue {
                is_divisor: !value.is_zero() && (n % &value).is_zero(),
                amplitude: self.ctx.to_f64(&distance),
                value,
            })
            .collect()
    }
}

impl AmplitudeScorer for GeodesicRanker {
    fn amplitude(&self, value: &BigUint) -> f64 {
        self.ctx.to_f64(&self.distance(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHI: f64 = 1.618_033_988_749_895;

    fn ctx() -> PrecisionContext {
        PrecisionContext::with_digits(120)
    }

    #[test]
    fn test_golden_powers() {
        let powers = golden_powers(5);
        let lucas: Vec<u32> = powers.iter().map(|(l, _)| l.to_u32_digits()[0]).collect();
        let fib: Vec<u32> = powers.iter().map(|(_, f)| f.to_u32_digits()[0]).collect();
        assert_eq!(lucas, vec![1, 3, 4, 7, 11]);
        assert_eq!(fib, vec![1, 1, 2, 3, 5]);
    }

    #[test]
    fn test_embedding_of_one() {
        let ctx = ctx();
        let e = embed(&ctx, &BigUint::one(), 1.0, 3).unwrap();
        let coords = e.to_f64(&ctx);
        assert!((coords[0] - (PHI - 1.0)).abs() < 1e-15);
        assert!((coords[1] - (PHI - 1.0)).abs() < 1e-15);
        assert!((coords[2] - (2.0 * PHI - 3.0)).abs() < 1e-15);
    }

    #[test]
    fn test_embedding_matches_float_for_small_values() {
        let ctx = ctx();
        let n = 1000u32;
        let e = embed(&ctx, &BigUint::from(n), 1.0, 3).unwrap();
        for (d, coord) in e.to_f64(&ctx).iter().enumerate() {
            let expected = (n as f64 * PHI.powi(d as i32 + 1)).fract();
            assert!((coord - expected).abs() < 1e-9, "dimension {}", d + 1);
        }
    }

    #[test]
    fn test_large_values_agree_across_precisions() {
        let n: BigUint = "137524771864208156028430259349934309717".parse().unwrap();
        let low = PrecisionContext::with_digits(150);
        let high = PrecisionContext::with_digits(700);
        let a = embed(&low, &n, DEFAULT_K, DEFAULT_DIMENSIONS).unwrap();
        let b = embed(&high, &n, DEFAULT_K, DEFAULT_DIMENSIONS).unwrap();
        for (x, y) in a.to_f64(&low).iter().zip(b.to_f64(&high)) {
            assert!((x - y).abs() < 1e-14);
        }
    }

    #[test]
    fn test_exponent_bends_coordinates() {
        let ctx = ctx();
        let n = BigUint::from(32759u32);
        let flat = embed(&ctx, &n, 1.0, 4).unwrap().to_f64(&ctx);
        let bent = embed(&ctx, &n, 0.35, 4).unwrap().to_f64(&ctx);
        for (f, b) in flat.iter().zip(&bent) {
            assert!((0.0..1.0).contains(b));
            assert!((b - f.powf(0.35)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_distance_wraps() {
        let ctx = ctx();
        let a = TorusEmbedding::from_f64(&ctx, &[0.05, 0.5]);
        let b = TorusEmbedding::from_f64(&ctx, &[0.95, 0.5]);
        let d = ctx.to_f64(&geodesic_distance(&ctx, &a, &b));
        assert!((d - 0.1).abs() < 1e-12);
        let back = ctx.to_f64(&geodesic_distance(&ctx, &b, &a));
        assert!((d - back).abs() < 1e-15);
    }

    #[test]
    fn test_distance_bounds() {
        let ctx = ctx();
        let ranker = GeodesicRanker::new(ctx, &BigUint::from(32759u32), DEFAULT_K, 7).unwrap();
        let max = (7f64).sqrt() / 2.0;
        for v in 32700u32..32720 {
            let amp = ranker.amplitude(&BigUint::from(v));
            assert!(amp >= 0.0 && amp <= max + 1e-12);
        }
        assert_eq!(ranker.amplitude(&BigUint::from(32759u32)), 0.0);
    }

    #[test]
    fn test_invalid_parameters() {
        let ctx = ctx();
        let n = BigUint::from(10u32);
        assert!(matches!(embed(&ctx, &n, 0.0, 7), Err(SearchError::InvalidExponent(_))));
        assert!(matches!(embed(&ctx, &n, 1.5, 7), Err(SearchError::InvalidExponent(_))));
        assert!(matches!(embed(&ctx, &n, f64::NAN, 7), Err(SearchError::InvalidExponent(_))));
        assert!(matches!(embed(&ctx, &n, 0.35, 0), Err(SearchError::ZeroDimensions)));
        assert!(matches!(
            GeodesicRanker::new(ctx, &n, 0.35, 0),
            Err(SearchError::ZeroDimensions)
        ));
    }

    #[test]
    fn test_rank_prefers_true_divisor() {
        let n = BigUint::from(15u32);
        let sqrt_n = BigUint::from(3u32);
        let ranker = GeodesicRanker::new(ctx(), &sqrt_n, DEFAULT_K, DEFAULT_DIMENSIONS).unwrap();
        let ranked = ranker.rank(&n, vec![BigUint::from(4u32), BigUint::from(3u32)]);
        assert_eq!(ranked[0].value, BigUint::from(3u32));
        assert!(ranked[0].is_divisor);
        assert!(!ranked[1].is_divisor);
        assert!(ranked[0].amplitude <= ranked[1].amplitude);
    }

    #[test]
    fn test_flat_scorer() {
        assert_eq!(FlatScorer.amplitude(&BigUint::from(99u32)), 0.0);
    }
}
