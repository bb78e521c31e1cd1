//! Property tests for engine and lifecycle invariants.
//!
//! Uses proptest to verify:
//! 1. Determinism — two fresh engines on the same stream agree bar for bar
//! 2. Trend coherence — trend only changes on bars with a confirmation
//! 3. Sweep implies confirmation — a sweep flag never appears alone
//! 4. Single slot — at most one pending position no matter the signal order
//! 5. Exit accounting — completed trades always carry exit data

use chrono::{DateTime, Duration, TimeZone, Utc};
use cisd_core::config::{IndicatorConfig, TradePolicy};
use cisd_core::domain::{Bar, Outcome, PositionStatus};
use cisd_core::engine::SignalEngine;
use cisd_core::lifecycle::TradeManager;
use proptest::prelude::*;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
}

// ── Strategies (proptest) ────────────────────────────────────────────

/// A sane OHLC bar around a given close: positive, finite, high/low
/// bracketing open and close.
fn arb_bar_shape() -> impl Strategy<Value = (f64, f64, f64)> {
    // (body move, upper wick, lower wick), all small fractions of price.
    (
        -0.02..0.02_f64,
        0.0..0.01_f64,
        0.0..0.01_f64,
    )
}

/// A random-walk bar series with 40..120 bars starting near 100.
fn arb_bar_series() -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec(arb_bar_shape(), 40..120).prop_map(|shapes| {
        let mut price = 100.0;
        shapes
            .into_iter()
            .enumerate()
            .map(|(i, (body, upper, lower))| {
                let open = price;
                let close = open * (1.0 + body);
                let high = open.max(close) * (1.0 + upper);
                let low = open.min(close) * (1.0 - lower);
                price = close;
                Bar {
                    time: t0() + Duration::minutes(i as i64),
                    open,
                    high,
                    low,
                    close,
                    volume: 1_000.0,
                }
            })
            .collect()
    })
}

fn small_engine() -> SignalEngine {
    SignalEngine::new(IndicatorConfig {
        swing_period: 3,
        ..Default::default()
    })
    .unwrap()
}

// ── 1. Determinism ───────────────────────────────────────────────────

proptest! {
    /// Same stream, same config, same output.
    #[test]
    fn engine_is_deterministic(bars in arb_bar_series()) {
        let mut a = small_engine();
        let mut b = small_engine();
        let ra = a.process_series(bars.clone()).unwrap();
        let rb = b.process_series(bars).unwrap();
        prop_assert_eq!(ra, rb);
    }
}

// ── 2. Trend coherence ───────────────────────────────────────────────

proptest! {
    /// The trend only ever moves on a bar with `cisd != 0`, and when it
    /// moves it matches the confirmation's direction.
    #[test]
    fn trend_changes_only_on_confirmation(bars in arb_bar_series()) {
        let mut eng = small_engine();
        let mut prev_trend: i8 = 0;
        for bar in bars {
            let r = eng.process_bar(bar).unwrap();
            if r.cisd == 0 {
                prop_assert_eq!(r.trend, prev_trend);
            } else {
                prop_assert_eq!(r.trend, r.cisd);
            }
            prev_trend = r.trend;
        }
    }
}

// ── 3. Sweep implies confirmation ────────────────────────────────────

proptest! {
    /// Sweep flags are a refinement of confirmations: a bar flagged as a
    /// sweep must also carry the matching confirmation and its level.
    #[test]
    fn sweep_only_with_confirmation(bars in arb_bar_series()) {
        let mut eng = small_engine();
        for bar in bars {
            let r = eng.process_bar(bar).unwrap();
            if r.bearish_sweep {
                prop_assert_eq!(r.cisd, -1);
                prop_assert!(r.cisd_level.is_some());
            }
            if r.bullish_sweep {
                prop_assert_eq!(r.cisd, 1);
                prop_assert!(r.cisd_level.is_some());
            }
        }
    }
}

// ── 4. Single slot ───────────────────────────────────────────────────

proptest! {
    /// No bar stream, however signal-dense, can put two positions in
    /// flight at once.
    #[test]
    fn at_most_one_pending_position(bars in arb_bar_series()) {
        let mut eng = small_engine();
        let mut tm = TradeManager::new(TradePolicy::default());
        for bar in bars {
            let r = eng.process_bar(bar).unwrap();
            tm.on_bar_result(&r);
            tm.on_price(bar.close, bar.time + Duration::seconds(30));

            let pending = usize::from(tm.has_pending());
            let open_in_completed = tm
                .completed()
                .iter()
                .filter(|p| p.status == PositionStatus::Pending)
                .count();
            prop_assert!(pending <= 1);
            prop_assert_eq!(open_in_completed, 0);
        }
    }
}

// ── 5. Exit accounting ───────────────────────────────────────────────

proptest! {
    /// Every completed trade has an exit price, an exit time not before
    /// entry, and a profit sign consistent with its outcome.
    #[test]
    fn completed_trades_are_fully_accounted(bars in arb_bar_series()) {
        let mut eng = small_engine();
        let mut tm = TradeManager::new(TradePolicy::default());
        for bar in bars {
            let r = eng.process_bar(bar).unwrap();
            tm.on_bar_result(&r);
            tm.on_price(bar.close, bar.time + Duration::seconds(30));
        }

        for pos in tm.completed() {
            prop_assert_eq!(pos.status, PositionStatus::Completed);
            let exit = pos.exit_price;
            prop_assert!(exit.is_some());
            prop_assert!(pos.exit_time.unwrap() >= pos.entry_time);
            match pos.outcome {
                Outcome::Winner => prop_assert!(pos.profit_loss_pct > 0.0),
                Outcome::Loser => prop_assert!(pos.profit_loss_pct < 0.0),
                Outcome::Open => prop_assert!(false, "completed trade left Open"),
            }
        }
    }
}
