//! Search parameters, loadable from a JSON parameters file.
//!
//! Every field has a default, so a parameters file only needs the values it
//! changes. `validate()` rejects anything that would make the search
//! ill-defined before a single candidate is produced.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bands::validate_layout;
use crate::error::SearchError;
use crate::geodesic::{DEFAULT_DIMENSIONS, DEFAULT_K};
use crate::precision::DEFAULT_PRECISION_FLOOR;
use crate::stepper::AdaptiveStepper;

fn default_delta_max() -> u64 {
    100_000
}

fn default_num_bands() -> usize {
    10
}

fn default_k_value() -> f64 {
    DEFAULT_K
}

fn default_dimensions() -> usize {
    DEFAULT_DIMENSIONS
}

fn default_base_step() -> u64 {
    1
}

fn default_step_scale() -> f64 {
    50.0
}

fn default_max_step_multiple() -> u64 {
    10
}

fn default_precision_floor() -> u32 {
    DEFAULT_PRECISION_FLOOR
}

fn default_log_interval() -> u64 {
    1000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Largest offset searched on either side of `floor(sqrt(N))` (exclusive).
    #[serde(default = "default_delta_max")]
    pub delta_max: u64,
    #[serde(default = "default_num_bands")]
    pub num_bands: usize,
    /// Geodesic exponent, in `(0, 1]`.
    #[serde(default = "default_k_value")]
    pub k_value: f64,
    /// Torus dimensions used by the ranker.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    #[serde(default = "default_base_step")]
    pub base_step: u64,
    #[serde(default = "default_step_scale")]
    pub step_scale: f64,
    #[serde(default = "default_max_step_multiple")]
    pub max_step_multiple: u64,
    /// Lowest working precision, in decimal digits.
    #[serde(default = "default_precision_floor")]
    pub precision_floor: u32,
    /// Stop after testing this many candidates.
    #[serde(default)]
    pub max_candidates: Option<u64>,
    /// Stop once this much wall-clock time has passed.
    #[serde(default)]
    pub timeout_secs: Option<f64>,
    /// Tested candidates between progress records.
    #[serde(default = "default_log_interval")]
    pub log_interval: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            delta_max: default_delta_max(),
            num_bands: default_num_bands(),
            k_value: default_k_value(),
            dimensions: default_dimensions(),
            base_step: default_base_step(),
            step_scale: default_step_scale(),
            max_step_multiple: default_max_step_multiple(),
            precision_floor: default_precision_floor(),
            max_candidates: None,
            timeout_secs: None,
            log_interval: default_log_interval(),
        }
    }
}

impl SearchConfig {
    /// Read a parameters file; missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SearchError> {
        let text = std::fs::read_to_string(path)?;
        let config: SearchConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        validate_layout(self.delta_max, self.num_bands)?;
        if i64::try_from(self.delta_max).is_err() {
            return Err(SearchError::DeltaTooLarge(self.delta_max));
        }
        if self.dimensions == 0 {
            return Err(SearchError::ZeroDimensions);
        }
        if !(self.k_value > 0.0 && self.k_value <= 1.0) {
            return Err(SearchError::InvalidExponent(self.k_value));
        }
        self.stepper().map(|_| ())
    }

    pub fn stepper(&self) -> Result<AdaptiveStepper, SearchError> {
        AdaptiveStepper::new(self.base_step, self.step_scale, self.max_step_multiple)
    }

    /// Timeout as a `Duration`; negative or non-finite values mean "stop at once".
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .map(|secs| Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO))
    }
}
