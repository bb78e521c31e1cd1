//! Per-bar engine output and the derived signal summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One output record per input bar, produced in input order.
///
/// `cisd` is -1 for a bearish confirmation, 1 for bullish, 0 otherwise.
/// `trend` carries the persistent bias forward and only changes on a bar
/// where `cisd != 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarResult {
    pub index: usize,
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Pivot high level detected on this bar (retrospective by `swing_period`).
    pub swing_high: Option<f64>,
    /// Pivot low level detected on this bar.
    pub swing_low: Option<f64>,
    pub cisd: i8,
    pub cisd_level: Option<f64>,
    pub wicked_high: bool,
    pub wicked_low: bool,
    pub bullish_sweep: bool,
    pub bearish_sweep: bool,
    pub trend: i8,
}

impl BarResult {
    /// A strong signal: confirmation reinforced by a liquidity sweep.
    /// Only strong signals open trades.
    pub fn is_strong(&self) -> bool {
        self.bullish_sweep || self.bearish_sweep
    }

    /// Anything worth broadcasting: a confirmation or a sweep.
    pub fn is_signal(&self) -> bool {
        self.cisd != 0 || self.is_strong()
    }

    /// Classify this bar into the coarse summary used by downstream
    /// consumers (push channel, persisted signal records).
    pub fn summary(&self) -> SignalSummary {
        let (bias, strength, confidence) = if self.cisd == 1 {
            if self.bullish_sweep {
                (Bias::Bullish, Strength::Strong, 85)
            } else {
                (Bias::Bullish, Strength::Normal, 65)
            }
        } else if self.cisd == -1 {
            if self.bearish_sweep {
                (Bias::Bearish, Strength::Strong, 85)
            } else {
                (Bias::Bearish, Strength::Normal, 65)
            }
        } else if self.trend == 1 {
            (Bias::Bullish, Strength::Weak, 40)
        } else if self.trend == -1 {
            (Bias::Bearish, Strength::Weak, 40)
        } else {
            (Bias::Neutral, Strength::None, 0)
        };

        SignalSummary {
            bias,
            strength,
            confidence,
            price: self.close,
            time: self.time,
            cisd: self.cisd,
            cisd_level: self.cisd_level,
            trend: self.trend,
            bullish_sweep: self.bullish_sweep,
            bearish_sweep: self.bearish_sweep,
        }
    }
}

/// Coarse directional read of the most recent bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

/// How convincing the read is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strength {
    Strong,
    Normal,
    Weak,
    None,
}

/// The signal record shape consumed by the push channel and persistence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalSummary {
    pub bias: Bias,
    pub strength: Strength,
    /// 0-100.
    pub confidence: u8,
    pub price: f64,
    pub time: DateTime<Utc>,
    pub cisd: i8,
    pub cisd_level: Option<f64>,
    pub trend: i8,
    pub bullish_sweep: bool,
    pub bearish_sweep: bool,
}
