//! Band search: a density-prioritized, wheel-filtered divisor search near
//! `floor(sqrt(N))` for balanced semiprimes.
//!
//! The offset range around `S = floor(sqrt(N))` is split into bands, ordered
//! by estimated prime density and walked with a density-driven step. Values
//! divisible by 2, 3, 5 or 7 are skipped. Each surviving candidate carries a
//! geodesic amplitude that ranks it but never filters it.
//!
//! This is a heuristic prioritizer. It finds a factor only when one lies
//! within the searched offsets, and it is not a cryptographic primitive.
//!
//! ```no_run
//! use band_search::{SearchConfig, SearchDriver, SearchTarget};
//!
//! let target: SearchTarget = "1073217479".parse().unwrap();
//! let config = SearchConfig { delta_max: 5000, num_bands: 3, ..Default::default() };
//! let report = SearchDriver::new(target, config).unwrap().run().unwrap();
//! println!("{}", report.outcome);
//! ```

pub mod bands;
pub mod calibration;
pub mod config;
pub mod density;
pub mod driver;
pub mod error;
pub mod geodesic;
pub mod pipeline;
pub mod precision;
pub mod runlog;
pub mod stepper;
pub mod wheel;

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;

pub use bands::Band;
pub use config::SearchConfig;
pub use driver::{SearchDriver, SearchOutcome, SearchReport};
pub use error::SearchError;
pub use geodesic::{AmplitudeScorer, FlatScorer, GeodesicRanker, TorusEmbedding};
pub use pipeline::{Candidate, CandidateStream};
pub use precision::{required_precision, PrecisionContext};

/// The number being searched and its integer square root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTarget {
    n: BigUint,
    sqrt_n: BigUint,
}

impl SearchTarget {
    pub fn new(n: BigUint) -> Result<Self, SearchError> {
        if n < BigUint::from(4u32) {
            return Err(SearchError::TargetTooSmall(n));
        }
        let sqrt_n = factoring_core::isqrt(&n);
        Ok(SearchTarget { n, sqrt_n })
    }

    /// Use a caller-supplied `floor(sqrt(n))`, checked exactly.
    pub fn with_sqrt(n: BigUint, sqrt_n: BigUint) -> Result<Self, SearchError> {
        if n < BigUint::from(4u32) {
            return Err(SearchError::TargetTooSmall(n));
        }
        if !factoring_core::is_isqrt(&n, &sqrt_n) {
            return Err(SearchError::SqrtMismatch { n, sqrt_n });
        }
        Ok(SearchTarget { n, sqrt_n })
    }

    pub fn n(&self) -> &BigUint {
        &self.n
    }

    pub fn sqrt_n(&self) -> &BigUint {
        &self.sqrt_n
    }

    pub fn bits(&self) -> u64 {
        self.n.bits()
    }
}

impl FromStr for SearchTarget {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: BigUint = s
            .trim()
            .parse()
            .map_err(|_| SearchError::ParseTarget(s.to_string()))?;
        SearchTarget::new(n)
    }
}

impl fmt::Display for SearchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bits)", self.n, self.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_sqrt() {
        let target = SearchTarget::new(BigUint::from(1_073_217_479u64)).unwrap();
        assert_eq!(*target.sqrt_n(), BigUint::from(32759u32));
        assert_eq!(target.bits(), 30);
    }

    #[test]
    fn test_target_too_small() {
        assert!(matches!(
            SearchTarget::new(BigUint::from(3u32)),
            Err(SearchError::TargetTooSmall(_))
        ));
        assert!(SearchTarget::new(BigUint::from(4u32)).is_ok());
    }

    #[test]
    fn test_with_sqrt_checks_root() {
        let n = BigUint::from(15u32);
        assert!(SearchTarget::with_sqrt(n.clone(), BigUint::from(3u32)).is_ok());
        assert!(matches!(
            SearchTarget::with_sqrt(n, BigUint::from(4u32)),
            Err(SearchError::SqrtMismatch { .. })
        ));
    }

    #[test]
    fn test_parse() {
        let target: SearchTarget = " 137524771864208156028430259349934309717 ".parse().unwrap();
        assert_eq!(target.bits(), 127);
        assert!(matches!(
            "12x".parse::<SearchTarget>(),
            Err(SearchError::ParseTarget(_))
        ));
        assert!(matches!(
            "2".parse::<SearchTarget>(),
            Err(SearchError::TargetTooSmall(_))
        ));
    }
}
