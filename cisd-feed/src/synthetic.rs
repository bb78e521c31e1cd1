//! Synthetic random-walk provider for demos and offline testing.
//!
//! Candles are generated on wall-clock interval boundaries so the driver's
//! duplicate-candle handling behaves exactly as it does against a real
//! exchange: polling inside the same interval returns the same closed
//! candles plus a moving current candle.

use crate::provider::{interval_ms, BarProvider, FeedError, FetchOutcome, RawKline};
use chrono::{Duration, TimeZone, Utc};
use cisd_core::domain::Bar;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::Mutex;

const HISTORY_CAP: usize = 1_000;

/// Generate a standalone seeded random-walk bar series, one minute apart.
/// Used by the demo command and by tests that need a plausible stream.
pub fn random_walk(seed: u64, n: usize, start_price: f64) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let mut price = start_price;
    (0..n)
        .map(|i| {
            let drift: f64 = rng.gen_range(-0.004..0.004);
            let open = price;
            let close = open * (1.0 + drift);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.002));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.002));
            price = close;
            Bar {
                time: t0 + Duration::minutes(i as i64),
                open,
                high,
                low,
                close,
                volume: rng.gen_range(100.0..10_000.0),
            }
        })
        .collect()
}

struct WalkState {
    rng: StdRng,
    price: f64,
    history: VecDeque<RawKline>,
    next_open_ms: Option<i64>,
}

impl WalkState {
    fn make_kline(&mut self, open_ms: i64, candle_ms: i64) -> RawKline {
        let drift: f64 = self.rng.gen_range(-0.004..0.004);
        let open = self.price;
        let close = open * (1.0 + drift);
        let high = open.max(close) * (1.0 + self.rng.gen_range(0.0..0.002));
        let low = open.min(close) * (1.0 - self.rng.gen_range(0.0..0.002));
        self.price = close;
        RawKline {
            open_time_ms: open_ms,
            open,
            high,
            low,
            close,
            volume: self.rng.gen_range(100.0..10_000.0),
            close_time_ms: open_ms + candle_ms - 1,
        }
    }
}

/// In-process provider backed by a seeded random walk.
pub struct SyntheticProvider {
    state: Mutex<WalkState>,
}

impl SyntheticProvider {
    pub fn new(seed: u64, start_price: f64) -> Self {
        Self {
            state: Mutex::new(WalkState {
                rng: StdRng::seed_from_u64(seed),
                price: start_price,
                history: VecDeque::new(),
                next_open_ms: None,
            }),
        }
    }
}

impl BarProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch_latest(
        &self,
        _symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<FetchOutcome, FeedError> {
        let candle_ms = interval_ms(interval)?;
        let now_ms = Utc::now().timestamp_millis();
        let current_open_ms = now_ms - now_ms.rem_euclid(candle_ms);

        let mut st = self.state.lock().unwrap();

        // Backfill on first call, then extend the walk up to the boundary
        // of the currently-forming candle.
        let mut open_ms = st
            .next_open_ms
            .unwrap_or(current_open_ms - candle_ms * limit as i64);
        while open_ms < current_open_ms {
            let k = st.make_kline(open_ms, candle_ms);
            st.history.push_back(k);
            open_ms += candle_ms;
        }
        st.next_open_ms = Some(current_open_ms);
        while st.history.len() > HISTORY_CAP {
            st.history.pop_front();
        }

        // The forming candle jitters around the walk's last close without
        // committing to it.
        let last_close = st.price;
        let tick: f64 = st.rng.gen_range(-0.001..0.001);
        let live_price = last_close * (1.0 + tick);
        let current = RawKline {
            open_time_ms: current_open_ms,
            open: last_close,
            high: last_close.max(live_price),
            low: last_close.min(live_price),
            close: live_price,
            volume: 0.0,
            close_time_ms: current_open_ms + candle_ms - 1,
        };

        let closed = st
            .history
            .iter()
            .rev()
            .take(limit)
            .rev()
            .copied()
            .collect();
        Ok(FetchOutcome {
            closed,
            current: Some(current),
        })
    }
}
