//! Search driver: consumes a candidate stream, tests divisibility and stops
//! on a factor, an exhausted stream, the candidate budget or the timeout.

use std::fmt;
use std::time::{Duration, Instant};

use num_bigint::BigUint;
use num_traits::{One, Zero};

use factoring_core::ordered_pair;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::geodesic::AmplitudeScorer;
use crate::pipeline::{Candidate, CandidateStream};
use crate::precision::required_precision;
use crate::runlog::{NullLog, RunObserver, RunRecord};
use crate::SearchTarget;

/// How a search ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// `p * q == N` with `p <= q`.
    Factored { p: BigUint, q: BigUint },
    /// Every band was traversed without a factor.
    Exhausted,
    BudgetExhausted,
    TimedOut,
}

impl SearchOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            SearchOutcome::Factored { .. } => "factored",
            SearchOutcome::Exhausted => "exhausted",
            SearchOutcome::BudgetExhausted => "budget_exhausted",
            SearchOutcome::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchOutcome::Factored { p, q } => write!(f, "factored: {} x {}", p, q),
            other => f.write_str(other.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    /// Candidates tested for divisibility.
    pub tested: u64,
    pub elapsed: Duration,
    /// Band and offset of the last candidate tested.
    pub last_band: Option<usize>,
    pub last_offset: Option<i64>,
}

impl SearchReport {
    pub fn factors(&self) -> Option<(&BigUint, &BigUint)> {
        match &self.outcome {
            SearchOutcome::Factored { p, q } => Some((p, q)),
            _ => None,
        }
    }

    pub fn is_factored(&self) -> bool {
        self.factors().is_some()
    }
}

/// A non-trivial divisor: `1 < value < n` and `n mod value == 0`.
fn divides(n: &BigUint, value: &BigUint) -> bool {
    *value > BigUint::one() && value < n && (n % value).is_zero()
}

/// Runs one search over a target and reports records to an observer.
pub struct SearchDriver<O: RunObserver = NullLog> {
    target: SearchTarget,
    config: SearchConfig,
    observer: O,
}

impl SearchDriver<NullLog> {
    pub fn new(target: SearchTarget, config: SearchConfig) -> Result<Self, SearchError> {
        Self::with_observer(target, config, NullLog)
    }
}

impl<O: RunObserver> SearchDriver<O> {
    pub fn with_observer(
        target: SearchTarget,
        config: SearchConfig,
        observer: O,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(SearchDriver {
            target,
            config,
            observer,
        })
    }

    pub fn target(&self) -> &SearchTarget {
        &self.target
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Search with the geodesic-ranked candidate stream.
    pub fn run(&mut self) -> Result<SearchReport, SearchError> {
        let stream = CandidateStream::new(&self.target, &self.config)?;
        self.run_stream(stream)
    }

    /// Search an already-built stream.
    pub fn run_stream<R: AmplitudeScorer>(
        &mut self,
        mut stream: CandidateStream<R>,
    ) -> Result<SearchReport, SearchError> {
        let start = Instant::now();
        let n = self.target.n().clone();
        let timeout = self.config.timeout();

        self.observer.record(&RunRecord::Header {
            n: n.to_string(),
            sqrt_n: self.target.sqrt_n().to_string(),
            bits: self.target.bits(),
            precision_digits: required_precision(&n, self.config.precision_floor),
            delta_max: self.config.delta_max,
            num_bands: self.config.num_bands,
            k_value: self.config.k_value,
            max_candidates: self.config.max_candidates,
            timeout_secs: self.config.timeout_secs,
        })?;

        let mut tested = 0u64;
        let mut last: Option<(usize, i64)> = None;

        let outcome = loop {
            if let Some(budget) = self.config.max_candidates {
                if tested >= budget {
                    log::warn!("candidate budget of {} exhausted", budget);
                    break SearchOutcome::BudgetExhausted;
                }
            }
            let Some(candidate) = stream.next() else {
                break SearchOutcome::Exhausted;
            };
            tested += 1;
            last = Some((candidate.band_index, candidate.offset));

            if divides(&n, &candidate.value) {
                let outcome = self.report_factor(&n, &candidate, tested, start.elapsed())?;
                break outcome;
            }

            if self.config.log_interval > 0 && tested % self.config.log_interval == 0 {
                let elapsed = start.elapsed().as_secs_f64();
                self.observer.record(&RunRecord::Progress {
                    tested,
                    elapsed_secs: elapsed,
                    band_index: candidate.band_index,
                    offset: candidate.offset,
                    candidates_per_sec: if elapsed > 0.0 {
                        tested as f64 / elapsed
                    } else {
                        0.0
                    },
                })?;
            }

            if let Some(limit) = timeout {
                if start.elapsed() >= limit {
                    log::warn!("timeout of {:?} reached after {} candidates", limit, tested);
                    break SearchOutcome::TimedOut;
                }
            }
        };

        let elapsed = start.elapsed();
        self.observer.record(&RunRecord::Completion {
            outcome: outcome.label().to_string(),
            tested,
            elapsed_secs: elapsed.as_secs_f64(),
        })?;

        Ok(SearchReport {
            outcome,
            tested,
            elapsed,
            last_band: last.map(|(band, _)| band),
            last_offset: last.map(|(_, offset)| offset),
        })
    }

    fn report_factor(
        &mut self,
        n: &BigUint,
        candidate: &Candidate,
        tested: u64,
        elapsed: Duration,
    ) -> Result<SearchOutcome, SearchError> {
        let (p, q) = ordered_pair(candidate.value.clone(), n / &candidate.value);
        log::info!(
            "factor found after {} candidates: {} = {} x {} (band {}, offset {})",
            tested,
            n,
            p,
            q,
            candidate.band_index,
            candidate.offset
        );
        self.observer.record(&RunRecord::Success {
            p: p.to_string(),
            q: q.to_string(),
            tested,
            elapsed_secs: elapsed.as_secs_f64(),
            band_index: candidate.band_index,
            offset: candidate.offset,
            amplitude: candidate.amplitude,
        })?;
        Ok(SearchOutcome::Factored { p, q })
    }
}
