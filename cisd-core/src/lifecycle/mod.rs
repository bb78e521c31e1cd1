//! Position lifecycle — opens trades on strong signals and closes them on
//! stop or target touches.

use crate::config::TradePolicy;
use crate::domain::{BarResult, Direction, Outcome, Position, PositionStatus};
use chrono::{DateTime, Utc};

/// Single-slot trade manager.
///
/// At most one position is `Pending` at any instant: strong signals that
/// arrive while a position is open are dropped, not queued. Exit checks run
/// on every price tick, not just bar closes, and are a no-op when flat.
/// Callers sharing a manager across scheduling contexts must serialize
/// access (the feed wraps it in a mutex).
#[derive(Debug, Clone)]
pub struct TradeManager {
    policy: TradePolicy,
    open: Option<Position>,
    completed: Vec<Position>,
}

impl TradeManager {
    pub fn new(policy: TradePolicy) -> Self {
        Self {
            policy,
            open: None,
            completed: Vec::new(),
        }
    }

    /// Consume a per-bar result; opens a position on a strong signal when
    /// the slot is free. Returns the newly opened position, if any.
    pub fn on_bar_result(&mut self, result: &BarResult) -> Option<&Position> {
        if !result.is_strong() || self.open.is_some() {
            return None;
        }

        let direction = if result.bullish_sweep {
            Direction::Long
        } else {
            Direction::Short
        };
        let entry = result.close;
        let (stop_loss, target) = self.policy.levels(entry, direction);

        self.open = Some(Position {
            direction,
            entry_price: entry,
            stop_loss,
            target,
            quantity: self.policy.quantity,
            status: PositionStatus::Pending,
            outcome: Outcome::Open,
            profit_loss_pct: 0.0,
            entry_time: result.time,
            exit_price: None,
            exit_time: None,
        });
        self.open.as_ref()
    }

    /// Evaluate exits against a price tick. Target is checked before stop,
    /// so a gapped tick that satisfies both resolves as a winner.
    /// Returns the position completed by this tick, if any.
    pub fn on_price(&mut self, price: f64, time: DateTime<Utc>) -> Option<&Position> {
        let mut pos = self.open.take()?;

        let hit_target = match pos.direction {
            Direction::Long => price >= pos.target,
            Direction::Short => price <= pos.target,
        };
        let hit_stop = match pos.direction {
            Direction::Long => price <= pos.stop_loss,
            Direction::Short => price >= pos.stop_loss,
        };

        let outcome = if hit_target {
            Outcome::Winner
        } else if hit_stop {
            Outcome::Loser
        } else {
            self.open = Some(pos);
            return None;
        };

        pos.status = PositionStatus::Completed;
        pos.outcome = outcome;
        pos.exit_price = Some(price);
        pos.exit_time = Some(time);
        pos.profit_loss_pct = match pos.direction {
            Direction::Long => ((price - pos.entry_price) / pos.entry_price) * 100.0,
            Direction::Short => ((pos.entry_price - price) / pos.entry_price) * 100.0,
        };
        self.completed.push(pos);
        self.completed.last()
    }

    pub fn has_pending(&self) -> bool {
        self.open.is_some()
    }

    pub fn open_position(&self) -> Option<&Position> {
        self.open.as_ref()
    }

    /// Completed positions, oldest first.
    pub fn completed(&self) -> &[Position] {
        &self.completed
    }

    pub fn policy(&self) -> &TradePolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap()
    }

    fn strong_result(close: f64, bullish: bool) -> BarResult {
        BarResult {
            index: 40,
            time: now(),
            open: close - 0.5,
            high: close + 0.5,
            low: close - 1.0,
            close,
            swing_high: None,
            swing_low: None,
            cisd: if bullish { 1 } else { -1 },
            cisd_level: Some(close + if bullish { -1.0 } else { 1.0 }),
            wicked_high: !bullish,
            wicked_low: bullish,
            bullish_sweep: bullish,
            bearish_sweep: !bullish,
            trend: if bullish { 1 } else { -1 },
        }
    }

    #[test]
    fn strong_bullish_signal_opens_long() {
        let mut tm = TradeManager::new(TradePolicy::default());
        let pos = tm.on_bar_result(&strong_result(100.0, true)).copied().unwrap();
        assert_eq!(pos.direction, Direction::Long);
        assert_eq!(pos.entry_price, 100.0);
        assert!((pos.stop_loss - 99.2).abs() < 1e-9);
        assert!((pos.target - 101.2).abs() < 1e-9);
        assert!(tm.has_pending());
    }

    #[test]
    fn normal_signal_does_not_open() {
        let mut tm = TradeManager::new(TradePolicy::default());
        let mut r = strong_result(100.0, true);
        r.bullish_sweep = false;
        r.bearish_sweep = false;
        assert!(tm.on_bar_result(&r).is_none());
        assert!(!tm.has_pending());
    }

    #[test]
    fn signal_during_open_position_is_dropped() {
        let mut tm = TradeManager::new(TradePolicy::default());
        tm.on_bar_result(&strong_result(100.0, true));
        assert!(tm.on_bar_result(&strong_result(105.0, false)).is_none());
        // The original long is untouched.
        assert_eq!(tm.open_position().unwrap().entry_price, 100.0);
    }

    #[test]
    fn on_price_is_noop_when_flat() {
        let mut tm = TradeManager::new(TradePolicy::default());
        assert!(tm.on_price(123.0, now()).is_none());
        assert!(tm.completed().is_empty());
    }

    #[test]
    fn gapped_tick_resolves_as_winner() {
        // A tick far through both levels at once: target check runs first.
        let mut tm = TradeManager::new(TradePolicy {
            stop_pct: 0.5,
            target_pct: 0.5,
            quantity: 50.0,
        });
        tm.on_bar_result(&strong_result(100.0, false)); // short
        // 40.0 is below both the short target (50) and, nonsensically for a
        // sane feed, would also sit beyond a long stop; only the short's
        // levels matter and target wins.
        let done = tm.on_price(40.0, now()).copied().unwrap();
        assert_eq!(done.outcome, Outcome::Winner);
    }

    #[test]
    fn slot_frees_after_completion() {
        let mut tm = TradeManager::new(TradePolicy::default());
        tm.on_bar_result(&strong_result(100.0, true));
        tm.on_price(101.3, now());
        assert!(!tm.has_pending());
        assert_eq!(tm.completed().len(), 1);

        // A new strong signal can open again.
        assert!(tm.on_bar_result(&strong_result(102.0, false)).is_some());
    }
}
