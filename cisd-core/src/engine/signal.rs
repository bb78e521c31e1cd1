//! Signal engine — per-bar orchestration of the swing and candidate
//! trackers, with persistent trend state.

use crate::config::{ConfigError, IndicatorConfig};
use crate::domain::{Bar, BarError, BarResult, SwingLevel};
use crate::engine::buffer::BarBuffer;
use crate::engine::candidates::CandidateTracker;
use crate::engine::swings::SwingTracker;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors from feeding a bar to the engine. Input rejection never mutates
/// engine state; the stream can simply continue with the next bar.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    InvalidBar(#[from] BarError),

    #[error("bar at {time} is not after the last processed bar at {last}")]
    NonMonotonicBar {
        time: DateTime<Utc>,
        last: DateTime<Utc>,
    },
}

/// Stateful market-structure engine for one symbol/timeframe stream.
///
/// Feed bars oldest-first, one at a time; each call returns exactly one
/// [`BarResult`]. Results are a pure function of config plus bar history,
/// so two fresh instances fed the same stream agree bar for bar. Never
/// share one instance across instruments.
#[derive(Debug, Clone)]
pub struct SignalEngine {
    config: IndicatorConfig,
    buffer: BarBuffer,
    swings: SwingTracker,
    candidates: CandidateTracker,
    trend: i8,
    last_time: Option<DateTime<Utc>>,
}

impl SignalEngine {
    pub fn new(config: IndicatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            buffer: BarBuffer::new(config.buffer_capacity),
            swings: SwingTracker::new(&config),
            candidates: CandidateTracker::new(&config),
            trend: 0,
            last_time: None,
            config,
        })
    }

    /// Process the next closed bar.
    pub fn process_bar(&mut self, bar: Bar) -> Result<BarResult, EngineError> {
        // Reject before any mutation.
        bar.validate()?;
        if let Some(last) = self.last_time {
            if bar.time <= last {
                return Err(EngineError::NonMonotonicBar {
                    time: bar.time,
                    last,
                });
            }
        }

        self.last_time = Some(bar.time);
        let index = self.buffer.push(bar);
        self.candidates.prune(self.buffer.base());

        let (swing_high, swing_low) = self.swings.detect_pivots(&self.buffer, index);
        let wicks = self.swings.update(&bar, index);

        if let Some(prev_index) = index.checked_sub(1) {
            if let Some(prev) = self.buffer.get(prev_index) {
                self.candidates.observe_flip(prev, &bar, index);
            }
        }

        let mut result = BarResult {
            index,
            time: bar.time,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            swing_high,
            swing_low,
            cisd: 0,
            cisd_level: None,
            wicked_high: wicks.wicked_high,
            wicked_low: wicks.wicked_low,
            bullish_sweep: false,
            bearish_sweep: false,
            trend: self.trend,
        };

        // Bearish before bullish, deterministically; a bearish confirmation
        // does not suppress the bullish test on the same bar.
        if let Some(conf) =
            self.candidates
                .confirm_bearish(&self.buffer, index, self.swings.high_sweep_context())
        {
            result.cisd = -1;
            result.cisd_level = Some(conf.level);
            result.bearish_sweep = conf.sweep;
            self.trend = -1;
        }
        if let Some(conf) =
            self.candidates
                .confirm_bullish(&self.buffer, index, self.swings.low_sweep_context())
        {
            result.cisd = 1;
            result.cisd_level = Some(conf.level);
            result.bullish_sweep = conf.sweep;
            self.trend = 1;
        }

        result.trend = self.trend;
        Ok(result)
    }

    /// Convenience: process a whole series, stopping at the first rejected
    /// bar.
    pub fn process_series(
        &mut self,
        bars: impl IntoIterator<Item = Bar>,
    ) -> Result<Vec<BarResult>, EngineError> {
        bars.into_iter().map(|bar| self.process_bar(bar)).collect()
    }

    /// Total bars accepted so far.
    pub fn bars_seen(&self) -> usize {
        self.buffer.bars_seen()
    }

    /// True once enough history accumulated for meaningful output.
    pub fn ready(&self) -> bool {
        self.bars_seen() >= self.config.min_history()
    }

    pub fn min_history(&self) -> usize {
        self.config.min_history()
    }

    pub fn trend(&self) -> i8 {
        self.trend
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    /// Read-only view of tracked pivot-high levels, newest first.
    pub fn swing_highs(&self) -> &[SwingLevel] {
        self.swings.swing_highs()
    }

    /// Read-only view of tracked pivot-low levels, newest first.
    pub fn swing_lows(&self) -> &[SwingLevel] {
        self.swings.swing_lows()
    }
}
