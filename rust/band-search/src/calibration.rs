//! Budget planning from calibration inputs.
//!
//! A run is sized by its *coverage*: the expected number of primes in the
//! searched offset span, `C = δ_span · (48/210) / ln S`. Given a target
//! coverage the planner solves for the span and turns it into a candidate
//! budget. Fitting the calibration curve itself happens elsewhere; this
//! module only reads one.

use std::path::Path;

use num_bigint::{BigInt, BigUint};
use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::density::ln_big;
use crate::error::SearchError;
use crate::wheel::wheel_factor;

/// Coverage used when no rehearsal data is available.
pub const FALLBACK_TARGET_COVERAGE: f64 = 100.0;

/// Safety margin applied to the mean coverage of successful rehearsals.
const REHEARSAL_MARGIN: f64 = 1.5;

/// Adaptive steps revisit less than a unit stride would, so budgets double.
const STEP_MARGIN: u64 = 2;

/// Linear density-error margin `ε(bits) = intercept + slope · bits`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationCurve {
    #[serde(rename = "a")]
    pub intercept: f64,
    #[serde(rename = "b")]
    pub slope: f64,
}

impl Default for CalibrationCurve {
    fn default() -> Self {
        CalibrationCurve {
            intercept: 0.01,
            slope: 0.0001,
        }
    }
}

impl CalibrationCurve {
    /// Read `{"a": .., "b": ..}` from a calibration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SearchError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn epsilon(&self, bits: u64) -> f64 {
        self.intercept + self.slope * bits as f64
    }
}

/// Target coverage from the coverages of successful rehearsal runs:
/// their mean plus a 50% margin, or the fallback with no data.
pub fn target_coverage(successful_coverages: &[f64]) -> f64 {
    if successful_coverages.is_empty() {
        return FALLBACK_TARGET_COVERAGE;
    }
    let mean = successful_coverages.iter().sum::<f64>() / successful_coverages.len() as f64;
    mean * REHEARSAL_MARGIN
}

fn ln_sqrt(sqrt_n: &BigUint) -> f64 {
    ln_big(&BigInt::from(sqrt_n.clone())).unwrap_or(0.0)
}

/// Expected primes in an offset span of `delta_span` around `sqrt_n`.
pub fn coverage(delta_span: u64, sqrt_n: &BigUint) -> f64 {
    let l = ln_sqrt(sqrt_n);
    if l <= 0.0 {
        return 0.0;
    }
    delta_span as f64 * wheel_factor() / l
}

/// Candidate budget split across band priorities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetPlan {
    pub target_coverage: f64,
    pub delta_max: u64,
    pub total_budget: u64,
    /// 70%: the densest bands.
    pub high_priority: u64,
    /// 20%: middle bands.
    pub outer_shells: u64,
    /// 10%: the sparsest bands.
    pub safety_net: u64,
}

impl BudgetPlan {
    /// Overwrite `delta_max` and `max_candidates`, keeping at least one
    /// offset per band.
    pub fn apply(&self, config: &mut SearchConfig) {
        config.delta_max = self.delta_max.max(config.num_bands as u64);
        config.max_candidates = Some(self.total_budget);
    }
}

/// `tenths / 10` of `total`, rounded down.
fn share(total: u64, tenths: u64) -> u64 {
    (total as u128 * tenths as u128 / 10) as u64
}

/// Span and candidate budget reaching `target` coverage around `sqrt_n`.
pub fn plan_budget(target: f64, sqrt_n: &BigUint) -> BudgetPlan {
    let span = (target.max(0.0) * ln_sqrt(sqrt_n) / wheel_factor()).max(1.0);
    // `as` saturates, so absurd targets clamp instead of wrapping
    let delta_max = (span as u64).clamp(1, i64::MAX as u64);
    let total_budget = ((span * wheel_factor()) as u64)
        .max(1)
        .saturating_mul(STEP_MARGIN);
    BudgetPlan {
        target_coverage: target,
        delta_max,
        total_budget,
        high_priority: share(total_budget, 7),
        outer_shells: share(total_budget, 2),
        safety_net: share(total_budget, 1),
    }
}
