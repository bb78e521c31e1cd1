//! Swing tracker — pivot detection plus wick/expiry bookkeeping.

use crate::config::IndicatorConfig;
use crate::domain::{Bar, SwingDirection, SwingLevel};
use crate::engine::buffer::BarBuffer;

/// Most recent touch of a swing level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WickMark {
    pub level: f64,
    pub bar: usize,
}

/// Outcome of the per-bar swing update.
#[derive(Debug, Clone, Copy, Default)]
pub struct WickFlags {
    pub wicked_high: bool,
    pub wicked_low: bool,
}

/// Inputs to the sweep test for one side.
///
/// `last_level` is the most recently wicked level and may have been touched
/// by the bar currently being processed; `prior_wick_bar` is the newest
/// wick bar strictly before that bar, which is what the recency window is
/// measured against. Keeping the two separate means a confirming bar that
/// re-wicks a level does not erase the earlier wick it is sweeping.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SweepContext {
    pub last_level: Option<f64>,
    pub prior_wick_bar: Option<usize>,
}

/// Rolling sets of active pivot-high and pivot-low levels.
///
/// Levels are stored newest-first and capped at [`MAX_LEVELS`]; the tracker
/// owns them exclusively, the engine only reads.
#[derive(Debug, Clone)]
pub struct SwingTracker {
    len: usize,
    expiry_bars: usize,
    hide_mitigated: bool,
    hide_expired: bool,
    swing_highs: Vec<SwingLevel>,
    swing_lows: Vec<SwingLevel>,
    last_wicked_high: Option<WickMark>,
    last_wicked_low: Option<WickMark>,
    prior_wick_high_bar: Option<usize>,
    prior_wick_low_bar: Option<usize>,
}

const MAX_LEVELS: usize = 100;

impl SwingTracker {
    pub fn new(config: &IndicatorConfig) -> Self {
        Self {
            len: config.swing_period,
            expiry_bars: config.expiry_bars,
            hide_mitigated: config.hide_mitigated_levels,
            hide_expired: config.hide_expired_levels,
            swing_highs: Vec::new(),
            swing_lows: Vec::new(),
            last_wicked_high: None,
            last_wicked_low: None,
            prior_wick_high_bar: None,
            prior_wick_low_bar: None,
        }
    }

    /// Run pivot detection for the arrival of bar `index`.
    ///
    /// The candidate pivot sits `len` bars back; it qualifies only when its
    /// extreme is strictly beyond every bar in the symmetric window (ties
    /// disqualify). Detection is therefore always retrospective by `len`
    /// bars. Returns the detected (high, low) levels, if any.
    pub fn detect_pivots(
        &mut self,
        buffer: &BarBuffer,
        index: usize,
    ) -> (Option<f64>, Option<f64>) {
        let center = match index.checked_sub(self.len) {
            Some(c) => c,
            None => return (None, None),
        };
        let window_start = match center.checked_sub(self.len) {
            Some(s) if s >= buffer.base() => s,
            _ => return (None, None),
        };

        let center_bar = &buffer[center];
        let mut is_high = true;
        let mut is_low = true;
        for i in window_start..=index {
            if i == center {
                continue;
            }
            let other = &buffer[i];
            if other.high >= center_bar.high {
                is_high = false;
            }
            if other.low <= center_bar.low {
                is_low = false;
            }
            if !is_high && !is_low {
                break;
            }
        }

        let high = if is_high {
            self.swing_highs.insert(
                0,
                SwingLevel::new(center_bar.high, center, SwingDirection::High),
            );
            Some(center_bar.high)
        } else {
            None
        };
        let low = if is_low {
            self.swing_lows
                .insert(0, SwingLevel::new(center_bar.low, center, SwingDirection::Low));
            Some(center_bar.low)
        } else {
            None
        };
        (high, low)
    }

    /// Per-bar wick/expiry update. Must run before the level state is read
    /// elsewhere in the same bar.
    pub fn update(&mut self, bar: &Bar, index: usize) -> WickFlags {
        let mut flags = WickFlags::default();

        // Everything marked so far happened on earlier bars, so the marks
        // as of now are the "strictly before this bar" wick bars, even if
        // this bar wicks again below.
        self.prior_wick_high_bar = self.last_wicked_high.map(|w| w.bar);
        self.prior_wick_low_bar = self.last_wicked_low.map(|w| w.bar);

        // Oldest levels first, so the remembered wick level is the newest
        // one touched this bar.
        for swing in self.swing_highs.iter_mut().rev() {
            if swing.active && swing.age(index) < self.expiry_bars {
                if bar.high >= swing.level {
                    flags.wicked_high = true;
                    self.last_wicked_high = Some(WickMark {
                        level: swing.level,
                        bar: index,
                    });
                    if self.hide_mitigated {
                        swing.active = false;
                    }
                }
            } else if self.hide_expired {
                swing.active = false;
            }
        }

        for swing in self.swing_lows.iter_mut().rev() {
            if swing.active && swing.age(index) < self.expiry_bars {
                if bar.low <= swing.level {
                    flags.wicked_low = true;
                    self.last_wicked_low = Some(WickMark {
                        level: swing.level,
                        bar: index,
                    });
                    if self.hide_mitigated {
                        swing.active = false;
                    }
                }
            } else if self.hide_expired {
                swing.active = false;
            }
        }

        self.swing_highs.truncate(MAX_LEVELS);
        self.swing_lows.truncate(MAX_LEVELS);
        flags
    }

    pub fn last_wicked_high(&self) -> Option<WickMark> {
        self.last_wicked_high
    }

    pub fn last_wicked_low(&self) -> Option<WickMark> {
        self.last_wicked_low
    }

    /// Sweep inputs for the high side, valid for the bar just passed to
    /// [`update`](Self::update).
    pub fn high_sweep_context(&self) -> SweepContext {
        SweepContext {
            last_level: self.last_wicked_high.map(|w| w.level),
            prior_wick_bar: self.prior_wick_high_bar,
        }
    }

    /// Sweep inputs for the low side.
    pub fn low_sweep_context(&self) -> SweepContext {
        SweepContext {
            last_level: self.last_wicked_low.map(|w| w.level),
            prior_wick_bar: self.prior_wick_low_bar,
        }
    }

    /// Tracked pivot-high levels, newest first.
    pub fn swing_highs(&self) -> &[SwingLevel] {
        &self.swing_highs
    }

    /// Tracked pivot-low levels, newest first.
    pub fn swing_lows(&self) -> &[SwingLevel] {
        &self.swing_lows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn make_bar(i: usize, open: f64, high: f64, low: f64, close: f64) -> Bar {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        Bar {
            time: t0 + Duration::minutes(i as i64),
            open,
            high,
            low,
            close,
            volume: 1_000.0,
        }
    }

    fn buffer_from_highs(highs: &[f64]) -> BarBuffer {
        let mut buf = BarBuffer::new(64);
        for (i, &h) in highs.iter().enumerate() {
            buf.push(make_bar(i, h - 2.0, h, h - 3.0, h - 1.0));
        }
        buf
    }

    fn config_with_len(len: usize) -> IndicatorConfig {
        IndicatorConfig {
            swing_period: len,
            ..Default::default()
        }
    }

    #[test]
    fn detects_pivot_high_retrospectively() {
        let cfg = config_with_len(2);
        let mut tracker = SwingTracker::new(&cfg);
        let buf = buffer_from_highs(&[10.0, 11.0, 13.0, 12.0, 11.5]);

        // At bar 3 only one bar of lookahead exists: no detection yet.
        assert_eq!(tracker.detect_pivots(&buf, 3), (None, None));

        // Bar 4 completes the window around center 2.
        let (high, _low) = tracker.detect_pivots(&buf, 4);
        assert_eq!(high, Some(13.0));
        assert_eq!(tracker.swing_highs().len(), 1);
        assert_eq!(tracker.swing_highs()[0].origin_bar, 2);
    }

    #[test]
    fn tie_disqualifies_pivot() {
        let cfg = config_with_len(2);
        let mut tracker = SwingTracker::new(&cfg);
        // Center high equals a lookahead high.
        let buf = buffer_from_highs(&[10.0, 11.0, 13.0, 13.0, 11.5]);
        let (high, _) = tracker.detect_pivots(&buf, 4);
        assert_eq!(high, None);
    }

    #[test]
    fn wick_marks_and_mitigation() {
        let cfg = IndicatorConfig {
            swing_period: 2,
            hide_mitigated_levels: true,
            ..Default::default()
        };
        let mut tracker = SwingTracker::new(&cfg);
        let mut buf = buffer_from_highs(&[10.0, 11.0, 13.0, 12.0, 11.5]);
        tracker.detect_pivots(&buf, 4);

        // A later bar whose high reaches the level wicks and deactivates it.
        let idx = buf.push(make_bar(5, 12.5, 13.2, 12.0, 12.8));
        let flags = tracker.update(&buf[idx], idx);
        assert!(flags.wicked_high);
        assert_eq!(
            tracker.last_wicked_high(),
            Some(WickMark { level: 13.0, bar: 5 })
        );
        assert!(!tracker.swing_highs()[0].active);
    }

    #[test]
    fn mitigated_level_stays_active_without_policy() {
        let cfg = config_with_len(2); // hide_mitigated_levels = false
        let mut tracker = SwingTracker::new(&cfg);
        let mut buf = buffer_from_highs(&[10.0, 11.0, 13.0, 12.0, 11.5]);
        tracker.detect_pivots(&buf, 4);

        let idx = buf.push(make_bar(5, 12.5, 13.2, 12.0, 12.8));
        let flags = tracker.update(&buf[idx], idx);
        assert!(flags.wicked_high);
        assert!(tracker.swing_highs()[0].active);
    }

    #[test]
    fn expiry_deactivates_and_never_reactivates() {
        let cfg = IndicatorConfig {
            swing_period: 2,
            expiry_bars: 3,
            hide_expired_levels: true,
            ..Default::default()
        };
        let mut tracker = SwingTracker::new(&cfg);
        let mut buf = buffer_from_highs(&[10.0, 11.0, 13.0, 12.0, 11.5]);
        tracker.detect_pivots(&buf, 4); // origin_bar = 2

        // Age 3 at bar 5: expired.
        let idx = buf.push(make_bar(5, 11.0, 11.2, 10.5, 10.8));
        tracker.update(&buf[idx], idx);
        assert!(!tracker.swing_highs()[0].active);

        // Even a touching bar later does not reactivate or wick it.
        let idx = buf.push(make_bar(6, 12.5, 14.0, 12.0, 13.5));
        let flags = tracker.update(&buf[idx], idx);
        assert!(!flags.wicked_high);
        assert!(!tracker.swing_highs()[0].active);
    }

    #[test]
    fn rewick_on_a_later_bar_keeps_the_prior_wick_bar() {
        let cfg = config_with_len(2);
        let mut tracker = SwingTracker::new(&cfg);
        let mut buf = buffer_from_highs(&[10.0, 11.0, 13.0, 12.0, 11.5]);
        tracker.detect_pivots(&buf, 4); // level 13 at origin 2

        // First wick at bar 5.
        let idx = buf.push(make_bar(5, 12.5, 13.2, 12.0, 12.8));
        tracker.update(&buf[idx], idx);
        assert_eq!(tracker.high_sweep_context().prior_wick_bar, None);

        // Bar 6 wicks the same level again: the context still points at
        // bar 5 as the wick strictly before the current bar.
        let idx = buf.push(make_bar(6, 12.8, 13.5, 12.2, 12.4));
        tracker.update(&buf[idx], idx);
        let ctx = tracker.high_sweep_context();
        assert_eq!(ctx.last_level, Some(13.0));
        assert_eq!(ctx.prior_wick_bar, Some(5));

        // A quiet bar 7: the prior wick advances to bar 6.
        let idx = buf.push(make_bar(7, 12.4, 12.6, 11.8, 12.0));
        tracker.update(&buf[idx], idx);
        assert_eq!(tracker.high_sweep_context().prior_wick_bar, Some(6));
    }

    #[test]
    fn level_lists_are_capped() {
        let cfg = IndicatorConfig {
            swing_period: 1,
            expiry_bars: 1_000,
            hide_expired_levels: false,
            buffer_capacity: 2_000,
            ..Default::default()
        };
        let mut tracker = SwingTracker::new(&cfg);
        let mut buf = BarBuffer::new(2_000);
        // Alternate highs so every odd bar is a pivot high for len=1.
        for i in 0..400 {
            let h = if i % 2 == 1 { 110.0 + i as f64 * 0.01 } else { 100.0 };
            let idx = buf.push(make_bar(i, h - 2.0, h, h - 3.0, h - 1.0));
            tracker.detect_pivots(&buf, idx);
            tracker.update(&buf[idx], idx);
        }
        assert!(tracker.swing_highs().len() <= MAX_LEVELS);
    }
}
