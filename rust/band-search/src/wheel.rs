//! 210-wheel admissibility filter.
//!
//! A value is admissible when it shares no factor with 2·3·5·7, or is one
//! of those wheel primes itself. Residue tables are built at compile time.

use num_bigint::BigUint;
use num_traits::ToPrimitive;

/// The primes the wheel removes.
pub const WHEEL_PRIMES: [u32; 4] = [2, 3, 5, 7];

/// Product of the wheel primes.
pub const WHEEL_MODULUS: u32 = 210;

/// Number of residues mod 210 coprime to 210.
pub const WHEEL_SIZE: usize = 48;

const MODULUS: usize = WHEEL_MODULUS as usize;

/// Below this bound the wheel primes themselves are in range and the
/// residue tables alone are not enough.
const SMALL_LIMIT: u64 = 11;

const fn build_coprime() -> [bool; MODULUS] {
    let mut table = [false; MODULUS];
    let mut r = 0;
    while r < MODULUS {
        table[r] = r % 2 != 0 && r % 3 != 0 && r % 5 != 0 && r % 7 != 0;
        r += 1;
    }
    table
}

const COPRIME: [bool; MODULUS] = build_coprime();

const fn build_next_gap() -> [u8; MODULUS] {
    let mut table = [0u8; MODULUS];
    let mut r = 0;
    while r < MODULUS {
        let mut g = 0;
        while !COPRIME[(r + g) % MODULUS] {
            g += 1;
        }
        table[r] = g as u8;
        r += 1;
    }
    table
}

const fn build_prev_gap() -> [u8; MODULUS] {
    let mut table = [0u8; MODULUS];
    let mut r = 0;
    while r < MODULUS {
        let mut g = 0;
        while !COPRIME[(r + MODULUS - g) % MODULUS] {
            g += 1;
        }
        table[r] = g as u8;
        r += 1;
    }
    table
}

const fn build_residues() -> [u16; WHEEL_SIZE] {
    let mut residues = [0u16; WHEEL_SIZE];
    let mut r = 0;
    let mut i = 0;
    while r < MODULUS {
        if COPRIME[r] {
            residues[i] = r as u16;
            i += 1;
        }
        r += 1;
    }
    residues
}

/// Distance from each residue up to the next residue coprime to 210.
const NEXT_GAP: [u8; MODULUS] = build_next_gap();

/// Distance from each residue down to the previous residue coprime to 210.
const PREV_GAP: [u8; MODULUS] = build_prev_gap();

const RESIDUES: [u16; WHEEL_SIZE] = build_residues();

/// The 48 residues mod 210 that survive the wheel, ascending.
pub fn admissible_residues() -> &'static [u16; WHEEL_SIZE] {
    &RESIDUES
}

/// Fraction of integers that survive the wheel (48/210).
pub fn wheel_factor() -> f64 {
    WHEEL_SIZE as f64 / WHEEL_MODULUS as f64
}

/// `x mod 210`.
pub fn residue(x: &BigUint) -> u32 {
    (x % WHEEL_MODULUS).to_u32().unwrap_or(0)
}

fn small_value(x: &BigUint) -> Option<u64> {
    x.to_u64().filter(|&v| v < SMALL_LIMIT)
}

fn is_admissible_small(v: u64) -> bool {
    WHEEL_PRIMES.contains(&(v as u32)) || COPRIME[(v % WHEEL_MODULUS as u64) as usize]
}

/// Whether `x` is free of the wheel primes (or is one of them).
pub fn is_admissible(x: &BigUint) -> bool {
    match small_value(x) {
        Some(v) => is_admissible_small(v),
        None => COPRIME[residue(x) as usize],
    }
}

/// Distance from `x` up to the smallest admissible value `>= x`.
pub fn next_admissible_gap(x: &BigUint) -> u64 {
    match small_value(x) {
        Some(v) => (v..).find(|&c| is_admissible_small(c)).map_or(0, |c| c - v),
        None => NEXT_GAP[residue(x) as usize] as u64,
    }
}

/// Smallest admissible value `>= x`.
pub fn next_admissible(x: &BigUint) -> BigUint {
    x + next_admissible_gap(x)
}

/// Distance from `x` down to the largest admissible value `<= x`.
/// `None` only for zero, below which nothing is admissible.
pub fn previous_admissible_gap(x: &BigUint) -> Option<u64> {
    match small_value(x) {
        Some(v) => (1..=v).rev().find(|&c| is_admissible_small(c)).map(|c| v - c),
        None => Some(PREV_GAP[residue(x) as usize] as u64),
    }
}

/// Largest admissible value `<= x`.
pub fn previous_admissible(x: &BigUint) -> Option<BigUint> {
    previous_admissible_gap(x).map(|gap| x - gap)
}
