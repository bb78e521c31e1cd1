//! Transition candidate tracker — queues of unconfirmed reversal levels
//! and the CISD confirmation test.

use crate::config::IndicatorConfig;
use crate::domain::{Bar, Polarity, TransitionCandidate};
use crate::engine::buffer::BarBuffer;
use crate::engine::swings::SweepContext;
use std::collections::VecDeque;

/// A confirmed change in state of delivery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Confirmation {
    pub level: f64,
    /// True when the confirmation followed a recent liquidity sweep.
    pub sweep: bool,
}

/// Per-polarity candidate queues.
///
/// Candidates join at the back, so scanning front-to-back visits the
/// oldest first; the first candidate to confirm wins and the whole queue
/// of that polarity is dropped atomically. Candidates whose origin bar
/// falls out of the rolling window are pruned — the ratio test can no
/// longer be evaluated for them.
#[derive(Debug, Clone)]
pub struct CandidateTracker {
    tolerance: f64,
    liquidity_lookback: usize,
    bearish: VecDeque<TransitionCandidate>,
    bullish: VecDeque<TransitionCandidate>,
}

impl CandidateTracker {
    pub fn new(config: &IndicatorConfig) -> Self {
        Self {
            tolerance: config.tolerance,
            liquidity_lookback: config.liquidity_lookback,
            bearish: VecDeque::new(),
            bullish: VecDeque::new(),
        }
    }

    /// Create candidates from a one-bar color flip between `prev` and the
    /// bar at `index`.
    pub fn observe_flip(&mut self, prev: &Bar, cur: &Bar, index: usize) {
        if prev.is_bearish() && cur.is_bullish() {
            self.bearish.push_back(TransitionCandidate {
                bar: index,
                level: cur.open,
                polarity: Polarity::Bearish,
            });
        }
        if prev.is_bullish() && cur.is_bearish() {
            self.bullish.push_back(TransitionCandidate {
                bar: index,
                level: cur.open,
                polarity: Polarity::Bullish,
            });
        }
    }

    /// Bearish confirmation test for the bar at `index`. On success the
    /// entire bearish queue is cleared.
    pub fn confirm_bearish(
        &mut self,
        buffer: &BarBuffer,
        index: usize,
        sweep_ctx: SweepContext,
    ) -> Option<Confirmation> {
        let cur = &buffer[index];
        let mut confirmed = None;

        for cand in &self.bearish {
            if cur.close >= cand.level {
                continue;
            }
            let highest = (cand.bar..=index)
                .map(|j| buffer[j].close)
                .fold(f64::NEG_INFINITY, f64::max);

            // Open of the last bar in the bearish run that preceded the
            // flip level's breach; zero when no such run exists.
            let mut top = 0.0;
            let mut j = cand.bar + 1;
            while j < index && buffer[j].is_bearish() {
                top = buffer[j].open;
                j += 1;
            }

            if top > 0.0 && (highest - cand.level) / (top - cand.level) > self.tolerance {
                // The recency window is measured against the wick strictly
                // before this bar, but the breach is tested against the
                // latest wicked level (which this bar may have re-touched).
                let sweep = sweep_ctx
                    .prior_wick_bar
                    .is_some_and(|bar| index - bar <= self.liquidity_lookback)
                    && sweep_ctx.last_level.is_some_and(|level| cur.close < level);
                confirmed = Some(Confirmation {
                    level: cand.level,
                    sweep,
                });
                break;
            }
        }

        if confirmed.is_some() {
            self.bearish.clear();
        }
        confirmed
    }

    /// Bullish confirmation test, mirrored from the bearish one.
    pub fn confirm_bullish(
        &mut self,
        buffer: &BarBuffer,
        index: usize,
        sweep_ctx: SweepContext,
    ) -> Option<Confirmation> {
        let cur = &buffer[index];
        let mut confirmed = None;

        for cand in &self.bullish {
            if cur.close <= cand.level {
                continue;
            }
            let lowest = (cand.bar..=index)
                .map(|j| buffer[j].close)
                .fold(f64::INFINITY, f64::min);

            let mut bottom = 0.0;
            let mut j = cand.bar + 1;
            while j < index && buffer[j].is_bullish() {
                bottom = buffer[j].open;
                j += 1;
            }

            if bottom > 0.0 && (cand.level - lowest) / (cand.level - bottom) > self.tolerance {
                let sweep = sweep_ctx
                    .prior_wick_bar
                    .is_some_and(|bar| index - bar <= self.liquidity_lookback)
                    && sweep_ctx.last_level.is_some_and(|level| cur.close > level);
                confirmed = Some(Confirmation {
                    level: cand.level,
                    sweep,
                });
                break;
            }
        }

        if confirmed.is_some() {
            self.bullish.clear();
        }
        confirmed
    }

    /// Drop candidates whose origin bar was evicted from the window.
    pub fn prune(&mut self, base: usize) {
        while self.bearish.front().is_some_and(|c| c.bar < base) {
            self.bearish.pop_front();
        }
        while self.bullish.front().is_some_and(|c| c.bar < base) {
            self.bullish.pop_front();
        }
    }

    pub fn bearish_len(&self) -> usize {
        self.bearish.len()
    }

    pub fn bullish_len(&self) -> usize {
        self.bullish.len()
    }
}
