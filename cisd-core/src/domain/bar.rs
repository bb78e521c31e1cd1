//! Bar — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One closed OHLCV bar for a single symbol/timeframe bucket.
///
/// Bars are immutable once closed. The engine requires them in strictly
/// increasing `time` order; the symbol itself lives at the feed layer since
/// an engine instance is scoped to exactly one symbol/timeframe stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Validation failures for a single bar.
#[derive(Debug, Error)]
pub enum BarError {
    #[error("non-finite OHLC field in bar at {time}")]
    NonFinite { time: DateTime<Utc> },

    #[error("inconsistent OHLC range in bar at {time} (high {high}, low {low})")]
    InvalidRange {
        time: DateTime<Utc>,
        high: f64,
        low: f64,
    },
}

impl Bar {
    /// Closed above its open.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Closed below its open.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Returns true if every OHLC field is a finite number.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
    }

    /// Full sanity check: finite fields and a consistent high/low range.
    pub fn validate(&self) -> Result<(), BarError> {
        if !self.is_finite() {
            return Err(BarError::NonFinite { time: self.time });
        }
        if self.high < self.low
            || self.high < self.open
            || self.high < self.close
            || self.low > self.open
            || self.low > self.close
        {
            return Err(BarError::InvalidRange {
                time: self.time,
                high: self.high,
                low: self.low,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_bar() -> Bar {
        Bar {
            time: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn valid_bar_passes() {
        assert!(sample_bar().validate().is_ok());
    }

    #[test]
    fn detects_non_finite() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        assert!(matches!(bar.validate(), Err(BarError::NonFinite { .. })));

        bar.close = f64::INFINITY;
        assert!(matches!(bar.validate(), Err(BarError::NonFinite { .. })));
    }

    #[test]
    fn detects_high_below_low() {
        let mut bar = sample_bar();
        bar.high = 97.0; // below low
        assert!(matches!(bar.validate(), Err(BarError::InvalidRange { .. })));
    }

    #[test]
    fn color_helpers() {
        let bar = sample_bar();
        assert!(bar.is_bullish());
        assert!(!bar.is_bearish());

        let mut doji = bar;
        doji.close = doji.open;
        assert!(!doji.is_bullish());
        assert!(!doji.is_bearish());
    }

    #[test]
    fn serialization_roundtrip() {
        let bar = sample_bar();
        let json = serde_json::to_string(&bar).unwrap();
        let deser: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, deser);
    }
}
