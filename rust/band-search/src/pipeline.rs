//! The candidate pipeline: a lazy, finite, single-use stream of candidates
//! around `floor(sqrt(N))`.
//!
//! Bands are visited densest first. Inside a band two cursors run side by
//! side, one walking `S + δ` upward and one walking `S - δ` downward, each
//! skipping inadmissible values and advancing by the band's step from the
//! offset it last emitted. Emission alternates between the two cursors while
//! both have work left. Offset 0 belongs to the upward cursor only.
//!
//! Every emitted value is admissible. The amplitude is attached after the
//! value is chosen and never influences which values are emitted.

use std::iter::FusedIterator;

use num_bigint::BigUint;

use crate::bands::{prioritize, Band};
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::geodesic::{AmplitudeScorer, GeodesicRanker};
use crate::precision::PrecisionContext;
use crate::stepper::AdaptiveStepper;
use crate::wheel;
use crate::SearchTarget;

/// One value to test, with everything the pipeline knew when choosing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub value: BigUint,
    /// `value - floor(sqrt(N))`.
    pub offset: i64,
    /// `value mod 210`.
    pub residue: u32,
    /// Density estimate of the originating band.
    pub density: f64,
    pub amplitude: f64,
    pub band_index: usize,
    pub step_size: u64,
}

/// Traversal state of the band currently being walked.
#[derive(Debug)]
struct BandCursor {
    band: Band,
    step: u64,
    /// Next upward offset to try; `None` once that side is finished.
    upward: Option<u64>,
    /// Next downward distance to try; `None` once that side is finished.
    downward: Option<u64>,
    downward_turn: bool,
}

impl BandCursor {
    fn new(band: Band, step: u64) -> Self {
        let downward = Some(band.offset_start.max(1));
        BandCursor {
            upward: Some(band.offset_start),
            downward,
            band,
            step,
            downward_turn: false,
        }
    }

    fn next_upward(&mut self, sqrt_n: &BigUint) -> Option<(BigUint, i64)> {
        let delta = self.upward.take()?;
        if delta >= self.band.offset_end {
            return None;
        }
        let gap = wheel::next_admissible_gap(&(sqrt_n + delta));
        let delta = delta.checked_add(gap).filter(|&d| d < self.band.offset_end)?;
        self.upward = delta.checked_add(self.step);
        let offset = i64::try_from(delta).ok()?;
        Some((sqrt_n + delta, offset))
    }

    fn next_downward(&mut self, sqrt_n: &BigUint) -> Option<(BigUint, i64)> {
        let delta = self.downward.take()?;
        if delta >= self.band.offset_end || BigUint::from(delta) >= *sqrt_n {
            return None;
        }
        let gap = wheel::previous_admissible_gap(&(sqrt_n - delta))?;
        let delta = delta.checked_add(gap).filter(|&d| d < self.band.offset_end)?;
        let distance = BigUint::from(delta);
        if distance >= *sqrt_n {
            return None;
        }
        let value = sqrt_n - distance;
        if value <= BigUint::from(1u32) {
            return None;
        }
        self.downward = delta.checked_add(self.step);
        let offset = i64::try_from(delta).ok()?;
        Some((value, -offset))
    }

    /// Alternate sides while both have work; `None` once the band is done.
    fn next(&mut self, sqrt_n: &BigUint) -> Option<(BigUint, i64)> {
        let downward_first = self.downward_turn;
        self.downward_turn = !self.downward_turn;
        if downward_first {
            self.next_downward(sqrt_n)
                .or_else(|| self.next_upward(sqrt_n))
        } else {
            self.next_upward(sqrt_n)
                .or_else(|| self.next_downward(sqrt_n))
        }
    }
}

/// Lazy candidate sequence for one search.
///
/// Finite and single-use: once it returns `None` it keeps returning `None`.
/// Building a fresh stream with the same inputs reproduces the same sequence.
#[derive(Debug)]
pub struct CandidateStream<R: AmplitudeScorer = GeodesicRanker> {
    sqrt_n: BigUint,
    scorer: R,
    layout: Vec<Band>,
    pending: std::vec::IntoIter<Band>,
    current: Option<BandCursor>,
    stepper: AdaptiveStepper,
    emitted: u64,
}

impl CandidateStream<GeodesicRanker> {
    /// Stream ranked by the geodesic distance to `floor(sqrt(N))`, computed
    /// under a precision context sized for `N`.
    pub fn new(target: &SearchTarget, config: &SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let ctx = PrecisionContext::for_target(target.n(), config.precision_floor);
        log::info!(
            "band search: N has {} bits, precision {} digits, delta_max={} in {} bands",
            target.bits(),
            ctx.digits(),
            config.delta_max,
            config.num_bands
        );
        let ranker = GeodesicRanker::new(ctx, target.sqrt_n(), config.k_value, config.dimensions)?;
        Self::with_scorer(target, config, ranker)
    }
}

impl<R: AmplitudeScorer> CandidateStream<R> {
    /// Stream whose amplitudes come from `scorer`.
    pub fn with_scorer(
        target: &SearchTarget,
        config: &SearchConfig,
        scorer: R,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        let stepper = config.stepper()?;
        let layout = prioritize(target.sqrt_n(), config.delta_max, config.num_bands)?;
        Ok(CandidateStream {
            sqrt_n: target.sqrt_n().clone(),
            scorer,
            pending: layout.clone().into_iter(),
            layout,
            current: None,
            stepper,
            emitted: 0,
        })
    }

    /// Bands in the order they are traversed.
    pub fn bands(&self) -> &[Band] {
        &self.layout
    }

    pub fn scorer(&self) -> &R {
        &self.scorer
    }

    /// Candidates yielded so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    fn next_band(&mut self) -> Option<BandCursor> {
        let band = self.pending.next()?;
        let step = self.stepper.step(band.density_estimate);
        log::debug!(
            "entering band {} [{}, {}) density={:.6e} step={}",
            band.index,
            band.offset_start,
            band.offset_end,
            band.density_estimate,
            step
        );
        Some(BandCursor::new(band, step))
    }
}

impl<R: AmplitudeScorer> Iterator for CandidateStream<R> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        loop {
            if self.current.is_none() {
                self.current = Some(self.next_band()?);
            }
            let cursor = self.current.as_mut()?;
            match cursor.next(&self.sqrt_n) {
                Some((value, offset)) => {
                    let candidate = Candidate {
                        residue: wheel::residue(&value),
                        amplitude: self.scorer.amplitude(&value),
                        density: cursor.band.density_estimate,
                        band_index: cursor.band.index,
                        step_size: cursor.step,
                        offset,
                        value,
                    };
                    self.emitted += 1;
                    return Some(candidate);
                }
                None => self.current = None,
            }
        }
    }
}

impl<R: AmplitudeScorer> FusedIterator for CandidateStream<R> {}
