//! Density-driven step sizing: small steps where primes are dense, larger
//! ones where they are sparse.

use crate::error::SearchError;

/// Step multiplier applied when no density estimate is available.
const FALLBACK_MULTIPLE: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveStepper {
    base_step: u64,
    scale: f64,
    max_multiple: u64,
}

impl Default for AdaptiveStepper {
    fn default() -> Self {
        AdaptiveStepper {
            base_step: 1,
            scale: 50.0,
            max_multiple: 10,
        }
    }
}

impl AdaptiveStepper {
    pub fn new(base_step: u64, scale: f64, max_multiple: u64) -> Result<Self, SearchError> {
        if base_step == 0 {
            return Err(SearchError::ZeroBaseStep);
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(SearchError::InvalidStepScale(scale));
        }
        Ok(AdaptiveStepper {
            base_step,
            scale,
            max_multiple: max_multiple.max(1),
        })
    }

    pub fn base_step(&self) -> u64 {
        self.base_step
    }

    /// Largest step this stepper ever returns for a positive density.
    pub fn max_step(&self) -> u64 {
        self.base_step.saturating_mul(self.max_multiple)
    }

    /// `max(1, floor(base / (density * scale)))`, capped at `max_step()`.
    /// Non-positive (or NaN) density falls back to ten base steps.
    pub fn step(&self, density: f64) -> u64 {
        if density.is_nan() || density <= 0.0 {
            return self.base_step.saturating_mul(FALLBACK_MULTIPLE);
        }
        let raw = (self.base_step as f64 / (density * self.scale)).floor();
        // `as` saturates for values past u64::MAX
        (raw as u64).max(1).min(self.max_step())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_steps() {
        let stepper = AdaptiveStepper::default();
        // 1 / (0.1 * 50) = 0.2
        assert_eq!(stepper.step(0.1), 1);
        // 1 / (0.001 * 50) = 20, capped at 10
        assert_eq!(stepper.step(0.001), 10);
        assert_eq!(stepper.step(0.0), 10);
        assert_eq!(stepper.step(-1.0), 10);
        assert_eq!(stepper.step(f64::NAN), 10);
    }

    #[test]
    fn test_sparse_regions_take_longer_steps() {
        let stepper = AdaptiveStepper::default();
        assert!(stepper.step(0.01) >= stepper.step(0.1));
    }

    #[test]
    fn test_scaled_base_step() {
        let stepper = AdaptiveStepper::new(100, 50.0, 10).unwrap();
        // 100 / (0.0625 * 50) = 32
        assert_eq!(stepper.step(0.0625), 32);
        assert_eq!(stepper.step(1e-9), 1000);
        assert_eq!(stepper.step(1e9), 1);
        assert_eq!(stepper.max_step(), 1000);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            AdaptiveStepper::new(0, 50.0, 10),
            Err(SearchError::ZeroBaseStep)
        ));
        assert!(matches!(
            AdaptiveStepper::new(1, 0.0, 10),
            Err(SearchError::InvalidStepScale(_))
        ));
        assert!(matches!(
            AdaptiveStepper::new(1, f64::INFINITY, 10),
            Err(SearchError::InvalidStepScale(_))
        ));
    }
}
