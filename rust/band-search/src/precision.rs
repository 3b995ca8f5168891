//! Fixed-point arbitrary-precision arithmetic bound to one search.
//!
//! A [`PrecisionContext`] fixes the working precision for every geometric
//! computation of a search. Values are `BigInt`s scaled by `2^bits`. The
//! context is an owned value handed to whatever needs it, so two searches at
//! different precisions never share state and nothing has to be restored
//! when a search ends early.

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{Float, One, Signed, ToPrimitive, Zero};

/// Smallest decimal precision a search runs at.
pub const DEFAULT_PRECISION_FLOOR: u32 = 100;

/// Extra binary digits carried beyond the requested decimal precision.
const GUARD_BITS: u64 = 32;

/// `exp` divides its reduced argument by `2^EXP_HALVINGS` and squares back.
const EXP_HALVINGS: u32 = 8;

/// Bits kept when converting a fixed-point value to `f64`.
const F64_KEEP_BITS: u64 = 64;

/// Decimal digits needed for a target: `max(floor, bits(n) * 4 + 200)`.
///
/// Non-decreasing in the bit length of `n`.
pub fn required_precision(n: &BigUint, floor: u32) -> u32 {
    let adaptive = n.bits().saturating_mul(4).saturating_add(200);
    u32::try_from(adaptive).unwrap_or(u32::MAX).max(floor)
}

/// Binary digits covering `digits` decimal digits (log2 10 rounded up).
fn digits_to_bits(digits: u32) -> u64 {
    (digits as u64 * 33_220 + 9_999) / 10_000
}

/// Working precision plus the constants every computation under it shares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecisionContext {
    digits: u32,
    bits: u64,
    one: BigInt,
    ln2: BigInt,
}

impl PrecisionContext {
    /// Context carrying `digits` decimal digits.
    pub fn with_digits(digits: u32) -> Self {
        let digits = digits.max(1);
        let bits = digits_to_bits(digits) + GUARD_BITS;
        let mut ctx = PrecisionContext {
            digits,
            bits,
            one: BigInt::one() << bits,
            ln2: BigInt::zero(),
        };
        // ln 2 = 2 atanh(1/3)
        let third = &ctx.one / 3u32;
        ctx.ln2 = ctx.atanh_series(&third) << 1u32;
        ctx
    }

    /// Context for searching `n`, never below `floor` digits.
    pub fn for_target(n: &BigUint, floor: u32) -> Self {
        Self::with_digits(required_precision(n, floor))
    }

    /// Decimal digits requested for this context.
    pub fn digits(&self) -> u32 {
        self.digits
    }

    /// Fraction bits of every fixed-point value under this context.
    pub fn bits(&self) -> u64 {
        self.bits
    }

    /// The fixed-point representation of 1.
    pub fn one(&self) -> &BigInt {
        &self.one
    }

    /// ln 2 at this precision.
    pub fn ln2(&self) -> &BigInt {
        &self.ln2
    }

    pub fn from_integer(&self, n: &BigUint) -> BigInt {
        BigInt::from_biguint(Sign::Plus, n.clone()) << self.bits
    }

    /// Exact conversion: every finite `f64` is a dyadic rational.
    pub fn from_f64(&self, x: f64) -> BigInt {
        if !x.is_finite() || x == 0.0 {
            return BigInt::zero();
        }
        let (mantissa, exponent, sign) = Float::integer_decode(x);
        let shift = exponent as i64 + self.bits as i64;
        let magnitude = BigInt::from(mantissa);
        let scaled = if shift >= 0 {
            magnitude << shift as u64
        } else {
            magnitude >> shift.unsigned_abs()
        };
        if sign < 0 {
            -scaled
        } else {
            scaled
        }
    }

    /// Nearest `f64` to a fixed-point value, from its top 64 bits.
    pub fn to_f64(&self, v: &BigInt) -> f64 {
        if self.bits > F64_KEEP_BITS {
            let top: BigInt = v >> (self.bits - F64_KEEP_BITS);
            top.to_f64().unwrap_or(f64::NAN) / 2f64.powi(F64_KEEP_BITS as i32)
        } else {
            v.to_f64().unwrap_or(f64::NAN) / 2f64.powi(self.bits as i32)
        }
    }

    pub fn mul(&self, a: &BigInt, b: &BigInt) -> BigInt {
        (a * b) >> self.bits
    }

    /// Fractional part in `[0, 1)`, also for negative inputs.
    pub fn frac(&self, v: &BigInt) -> BigInt {
        v.mod_floor(&self.one)
    }

    /// Square root; zero for non-positive input.
    pub fn sqrt(&self, v: &BigInt) -> BigInt {
        if v.sign() != Sign::Plus {
            return BigInt::zero();
        }
        (v << self.bits).sqrt()
    }

    /// `sum z^(2i+1) / (2i+1)` for `0 <= z < 1`.
    fn atanh_series(&self, z: &BigInt) -> BigInt {
        let z2 = self.mul(z, z);
        let mut power = z.clone();
        let mut sum = BigInt::zero();
        let mut k = 1u64;
        while !power.is_zero() {
            sum += &power / k;
            power = self.mul(&power, &z2);
            k += 2;
        }
        sum
    }

    /// Natural logarithm; `None` for non-positive input.
    pub fn ln(&self, x: &BigInt) -> Option<BigInt> {
        if x.sign() != Sign::Plus {
            return None;
        }
        // x = m * 2^e with m in [1, 2)
        let e = x.bits() as i64 - 1 - self.bits as i64;
        let m = if e >= 0 {
            x >> e as u64
        } else {
            x << e.unsigned_abs()
        };
        let z = ((&m - &self.one) << self.bits) / (&m + &self.one);
        let ln_m = self.atanh_series(&z) << 1u32;
        Some(ln_m + &self.ln2 * e)
    }

    /// `e^y`; `None` when the result does not fit a shift by an `i64`.
    pub fn exp(&self, y: &BigInt) -> Option<BigInt> {
        // y = q ln2 + r with r in [0, ln2)
        let q = y.div_floor(&self.ln2);
        let r = y - &q * &self.ln2;
        let reduced: BigInt = r >> EXP_HALVINGS;

        let mut term = self.one.clone();
        let mut sum = self.one.clone();
        let mut k = 1u64;
        loop {
            term = self.mul(&term, &reduced) / k;
            if term.is_zero() {
                break;
            }
            sum += &term;
            k += 1;
        }
        for _ in 0..EXP_HALVINGS {
            sum = self.mul(&sum, &sum);
        }

        match q.to_i64() {
            Some(q) if q >= 0 => Some(sum << q as u64),
            Some(q) => Some(sum >> q.unsigned_abs()),
            None if q.is_negative() => Some(BigInt::zero()),
            None => None,
        }
    }

    /// `x^k` for `x >= 0`; zero when `x` is zero.
    pub fn powf(&self, x: &BigInt, k: &BigInt) -> BigInt {
        self.ln(x)
            .and_then(|ln_x| self.exp(&self.mul(&ln_x, k)))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-14
    }

    #[test]
    fn test_required_precision() {
        let n127: BigUint = "137524771864208156028430259349934309717".parse().unwrap();
        assert_eq!(n127.bits(), 127);
        assert_eq!(required_precision(&n127, DEFAULT_PRECISION_FLOOR), 708);

        let n330 = BigUint::one() << 329u32;
        assert_eq!(required_precision(&n330, DEFAULT_PRECISION_FLOOR), 1520);

        let fifteen = BigUint::from(15u32);
        assert_eq!(required_precision(&fifteen, DEFAULT_PRECISION_FLOOR), 216);
        assert_eq!(required_precision(&fifteen, 1000), 1000);
    }

    #[test]
    fn test_required_precision_monotone() {
        let mut last = 0;
        for bits in 1..400u32 {
            let n = BigUint::one() << (bits - 1);
            let p = required_precision(&n, DEFAULT_PRECISION_FLOOR);
            assert!(p >= last);
            last = p;
        }
    }

    #[test]
    fn test_ln2_digits() {
        let ctx = PrecisionContext::with_digits(100);
        let scale = BigInt::from(10u32).pow(50u32);
        let truncated: BigInt = (ctx.ln2() * scale) >> ctx.bits();
        assert_eq!(
            truncated.to_string(),
            "69314718055994530941723212145817656807550013436025"
        );
    }

    #[test]
    fn test_f64_round_trip() {
        let ctx = PrecisionContext::with_digits(120);
        for x in [0.35, 1.0, -2.5, 1e-9, 12345.678] {
            assert!(close(ctx.to_f64(&ctx.from_f64(x)), x), "{}", x);
        }
        assert!(ctx.from_f64(f64::NAN).is_zero());
    }

    #[test]
    fn test_ln_exp() {
        let ctx = PrecisionContext::with_digits(120);
        let ten = ctx.from_integer(&BigUint::from(10u32));
        let ln10 = ctx.ln(&ten).unwrap();
        assert!(close(ctx.to_f64(&ln10), std::f64::consts::LN_10));

        let back = ctx.exp(&ln10).unwrap();
        assert!(close(ctx.to_f64(&back), 10.0));

        let quarter = ctx.from_f64(0.25);
        let ln_quarter = ctx.ln(&quarter).unwrap();
        assert!(close(ctx.to_f64(&ln_quarter), 0.25f64.ln()));

        assert!(ctx.ln(&BigInt::zero()).is_none());
        assert!(ctx.ln(&-ctx.one().clone()).is_none());
    }

    #[test]
    fn test_powf() {
        let ctx = PrecisionContext::with_digits(120);
        let half = ctx.powf(&ctx.from_f64(0.25), &ctx.from_f64(0.5));
        assert!(close(ctx.to_f64(&half), 0.5));

        let p = ctx.powf(&ctx.from_f64(0.7), &ctx.from_f64(0.35));
        assert!(close(ctx.to_f64(&p), 0.7f64.powf(0.35)));

        assert!(ctx.powf(&BigInt::zero(), &ctx.from_f64(0.35)).is_zero());
    }

    #[test]
    fn test_sqrt_and_frac() {
        let ctx = PrecisionContext::with_digits(100);
        let two = ctx.from_integer(&BigUint::from(2u32));
        assert!(close(ctx.to_f64(&ctx.sqrt(&two)), std::f64::consts::SQRT_2));

        let v = ctx.from_f64(-1.25);
        assert!(close(ctx.to_f64(&ctx.frac(&v)), 0.75));
        assert!(ctx.sqrt(&v).is_zero());
    }

    #[test]
    fn test_contexts_are_independent() {
        let low = PrecisionContext::with_digits(100);
        let high = PrecisionContext::with_digits(800);
        assert!(high.bits() > low.bits());
        // Building a second context leaves the first untouched.
        let again = PrecisionContext::with_digits(100);
        assert_eq!(low, again);
        assert!(close(low.to_f64(low.ln2()), high.to_f64(high.ln2())));
    }
}
