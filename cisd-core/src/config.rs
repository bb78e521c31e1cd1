//! Engine and trade-policy configuration.

use crate::domain::Direction;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Extra history the engine wants beyond the pivot window before results
/// are considered meaningful.
const HISTORY_MARGIN: usize = 10;

/// Configuration errors surfaced by `validate()`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("tolerance must be in (0, 1), got {0}")]
    Tolerance(f64),

    #[error("swing_period must be >= 1")]
    SwingPeriod,

    #[error("expiry_bars must be >= 1")]
    ExpiryBars,

    #[error("buffer_capacity {capacity} too small, need at least {required}")]
    BufferCapacity { capacity: usize, required: usize },

    #[error("stop_pct must be in (0, 1), got {0}")]
    StopPct(f64),

    #[error("target_pct must be in (0, 1), got {0}")]
    TargetPct(f64),

    #[error("quantity must be positive, got {0}")]
    Quantity(f64),
}

/// Parameters of the market-structure signal engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Ratio threshold for confirming a transition candidate.
    pub tolerance: f64,
    /// Pivot lookback = lookahead width in bars.
    pub swing_period: usize,
    /// Swing levels older than this are expired.
    pub expiry_bars: usize,
    /// How recent a wick must be for a confirmation to count as a sweep.
    pub liquidity_lookback: usize,
    /// Deactivate a level as soon as price touches it.
    pub hide_mitigated_levels: bool,
    /// Deactivate levels past `expiry_bars`.
    pub hide_expired_levels: bool,
    /// Bars retained in the rolling window.
    pub buffer_capacity: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.7,
            swing_period: 12,
            expiry_bars: 100,
            liquidity_lookback: 10,
            hide_mitigated_levels: false,
            hide_expired_levels: true,
            buffer_capacity: 500,
        }
    }
}

impl IndicatorConfig {
    /// Bars of history required before the engine output is meaningful.
    /// Fewer bars is not an error, results just stay neutral.
    pub fn min_history(&self) -> usize {
        self.swing_period * 2 + HISTORY_MARGIN
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tolerance > 0.0 && self.tolerance < 1.0) {
            return Err(ConfigError::Tolerance(self.tolerance));
        }
        if self.swing_period < 1 {
            return Err(ConfigError::SwingPeriod);
        }
        if self.expiry_bars < 1 {
            return Err(ConfigError::ExpiryBars);
        }
        // The buffer must cover the pivot window, level expiry, and the
        // sweep lookback, or the trackers would reference evicted bars.
        let required = self
            .min_history()
            .max(self.expiry_bars)
            .max(self.liquidity_lookback + 1);
        if self.buffer_capacity < required {
            return Err(ConfigError::BufferCapacity {
                capacity: self.buffer_capacity,
                required,
            });
        }
        Ok(())
    }
}

/// Fixed-percentage stop/target policy for opened trades.
///
/// Defaults follow the stricter late revision of the trading rules:
/// stop 0.8% and target 1.2% away from entry, 50 units per trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradePolicy {
    pub stop_pct: f64,
    pub target_pct: f64,
    pub quantity: f64,
}

impl Default for TradePolicy {
    fn default() -> Self {
        Self {
            stop_pct: 0.008,
            target_pct: 0.012,
            quantity: 50.0,
        }
    }
}

impl TradePolicy {
    /// Stop and target prices for an entry, asymmetric by direction.
    pub fn levels(&self, entry: f64, direction: Direction) -> (f64, f64) {
        match direction {
            Direction::Long => (
                entry * (1.0 - self.stop_pct),
                entry * (1.0 + self.target_pct),
            ),
            Direction::Short => (
                entry * (1.0 + self.stop_pct),
                entry * (1.0 - self.target_pct),
            ),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.stop_pct > 0.0 && self.stop_pct < 1.0) {
            return Err(ConfigError::StopPct(self.stop_pct));
        }
        if !(self.target_pct > 0.0 && self.target_pct < 1.0) {
            return Err(ConfigError::TargetPct(self.target_pct));
        }
        if !(self.quantity > 0.0) {
            return Err(ConfigError::Quantity(self.quantity));
        }
        Ok(())
    }
}
