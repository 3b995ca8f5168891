//! Shared number-theory utilities for the near-square-root search crates.
//!
//! Integer square roots, deterministic primality testing and balanced
//! semiprime generation for test targets with known factors.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};
use rand::Rng;

/// Fixed Miller-Rabin witnesses. The first twelve primes make the test exact
/// for every n < 3.3 * 10^24 and keep results reproducible above that.
const WITNESSES: [u32; 16] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53];

/// A semiprime with known factors, `p <= q`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Semiprime {
    pub n: BigUint,
    pub p: BigUint,
    pub q: BigUint,
    pub bit_size: u32,
}

impl Semiprime {
    /// Build from two factors, ordering them so that `p <= q`.
    pub fn from_factors(a: BigUint, b: BigUint) -> Self {
        let (p, q) = ordered_pair(a, b);
        let n = &p * &q;
        let bit_size = n.bits() as u32;
        Semiprime { n, p, q, bit_size }
    }

    /// Whether `(a, b)` is a factorization of this semiprime, in either order.
    pub fn verify(&self, a: &BigUint, b: &BigUint) -> bool {
        a * b == self.n && ((a == &self.p && b == &self.q) || (a == &self.q && b == &self.p))
    }
}

/// Return the two values ordered ascending.
pub fn ordered_pair(a: BigUint, b: BigUint) -> (BigUint, BigUint) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Floor of the square root.
pub fn isqrt(n: &BigUint) -> BigUint {
    n.sqrt()
}

/// Whether `s` is exactly `floor(sqrt(n))`.
pub fn is_isqrt(n: &BigUint, s: &BigUint) -> bool {
    let next = s + 1u32;
    s * s <= *n && &next * &next > *n
}

/// Miller-Rabin with the first `rounds` fixed prime witnesses.
///
/// Deterministic: the same input always gives the same answer, which the
/// search tests rely on.
pub fn is_probably_prime(n: &BigUint, rounds: u32) -> bool {
    let two = BigUint::from(2u32);
    if *n < two {
        return false;
    }
    if let Some(small) = n.to_u32() {
        if WITNESSES.contains(&small) {
            return true;
        }
    }
    if n.is_even() {
        return false;
    }

    let n_minus_1 = n - 1u32;
    let mut d = n_minus_1.clone();
    let mut r = 0u32;
    while d.is_even() {
        d >>= 1u32;
        r += 1;
    }

    let rounds = (rounds as usize).clamp(1, WITNESSES.len());
    'witness: for &a in &WITNESSES[..rounds] {
        let a = BigUint::from(a);
        if &a % n == BigUint::zero() {
            continue;
        }
        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_1 {
            continue 'witness;
        }
        for _ in 1..r {
            x = x.modpow(&two, n);
            if x == n_minus_1 {
                continue 'witness;
            }
        }
        return false;
    }

    true
}

/// Smallest probable prime `>= n`.
pub fn next_prime(n: &BigUint) -> BigUint {
    let two = BigUint::from(2u32);
    if *n <= two {
        return two;
    }
    let mut candidate = n.clone();
    if candidate.is_even() {
        candidate += 1u32;
    }
    while !is_probably_prime(&candidate, 16) {
        candidate += 2u32;
    }
    candidate
}

/// Random probable prime with exactly `bits` bits.
pub fn random_prime(bits: u32, rng: &mut impl Rng) -> BigUint {
    assert!(bits >= 2, "Cannot generate a prime with fewer than 2 bits");
    loop {
        let num_bytes = (bits as usize + 7) / 8;
        let mut bytes = vec![0u8; num_bytes];
        rng.fill(&mut bytes[..]);

        let excess_bits = (num_bytes * 8) as u32 - bits;
        if excess_bits > 0 {
            bytes[0] &= (1u8 << (8 - excess_bits)) - 1;
        }
        bytes[0] |= 1u8 << ((bits - 1) % 8);
        if let Some(last) = bytes.last_mut() {
            *last |= 0x01;
        }

        let candidate = BigUint::from_bytes_be(&bytes);
        if is_probably_prime(&candidate, 16) {
            return candidate;
        }
    }
}

/// Balanced semiprime of roughly `bits` bits: both factors carry half the
/// bits, so they straddle `floor(sqrt(n))` closely.
pub fn generate_balanced_semiprime(bits: u32, rng: &mut impl Rng) -> Semiprime {
    assert!(bits >= 6, "balanced semiprimes need at least 6 bits");
    let half = bits / 2;
    loop {
        let p = random_prime(half, rng);
        let q = random_prime(bits - half, rng);
        if p != q {
            return Semiprime::from_factors(p, q);
        }
    }
}
