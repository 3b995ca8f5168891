//! Errors raised before a search starts or while writing its run log.

use num_bigint::BigUint;

/// Errors that can occur while configuring or driving a band search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("target N={0} is too small (need N >= 4)")]
    TargetTooSmall(BigUint),

    #[error("supplied square root {sqrt_n} is not floor(sqrt({n}))")]
    SqrtMismatch { n: BigUint, sqrt_n: BigUint },

    #[error("num_bands must be positive")]
    ZeroBands,

    #[error("delta_max must be positive")]
    ZeroDeltaMax,

    #[error("num_bands={num_bands} exceeds delta_max={delta_max}; bands would be empty")]
    TooManyBands { num_bands: usize, delta_max: u64 },

    #[error("delta_max={0} does not fit a signed 64-bit offset")]
    DeltaTooLarge(u64),

    #[error("torus dimension count must be positive")]
    ZeroDimensions,

    #[error("geodesic exponent k={0} must lie in (0, 1]")]
    InvalidExponent(f64),

    #[error("base_step must be positive")]
    ZeroBaseStep,

    #[error("step scale {0} must be finite and positive")]
    InvalidStepScale(f64),

    #[error("could not parse target: {0}")]
    ParseTarget(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
