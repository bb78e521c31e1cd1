//! Polling driver: the loop that feeds the engine and the trade manager.
//!
//! One cycle fetches through the failover chain, applies any newly closed
//! candles to the engine, lets the trade manager act on results, and runs
//! exit checks against the live price of the still-forming candle. A candle
//! whose close time was already processed is never re-fed to the engine —
//! its price only drives exit evaluation. The `busy` flag is a single-flight
//! guard so a slow cycle is skipped over, never overlapped.

use crate::config::FeedConfig;
use crate::failover::SourceChain;
use crate::provider::RawKline;
use chrono::Utc;
use cisd_core::config::ConfigError;
use cisd_core::domain::{BarResult, Position, SignalSummary};
use cisd_core::engine::SignalEngine;
use cisd_core::lifecycle::TradeManager;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// Push boundary for everything the driver produces. Implementations own
/// persistence, broadcasting, or display; the driver only calls.
pub trait Sink: Send + Sync {
    fn on_bar(&self, _result: &BarResult) {}
    fn on_signal(&self, _signal: &SignalSummary) {}
    fn on_position(&self, _position: &Position) {}
}

/// Sink that discards everything.
pub struct NoopSink;

impl Sink for NoopSink {}

/// Snapshot of driver progress, safe to take from any thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferStatus {
    pub bars_seen: usize,
    pub min_required: usize,
    pub ready: bool,
    pub trend: i8,
    pub has_pending: bool,
    pub completed_trades: usize,
}

struct DriverState {
    engine: SignalEngine,
    trades: TradeManager,
    last_close_ms: Option<i64>,
}

/// Fixed-period polling loop on a background thread.
pub struct PollDriver {
    config: FeedConfig,
    fetch_limit: usize,
    chain: Arc<SourceChain>,
    sink: Arc<dyn Sink>,
    state: Arc<Mutex<DriverState>>,
    running: Arc<AtomicBool>,
    busy: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl PollDriver {
    pub fn new(
        config: FeedConfig,
        chain: SourceChain,
        sink: Arc<dyn Sink>,
    ) -> Result<Self, ConfigError> {
        let engine = SignalEngine::new(config.indicator)?;
        config.trade.validate()?;
        let fetch_limit = config.indicator.min_history() + 10;
        let trade = config.trade;

        Ok(Self {
            config,
            fetch_limit,
            chain: Arc::new(chain),
            sink,
            state: Arc::new(Mutex::new(DriverState {
                engine,
                trades: TradeManager::new(trade),
                last_close_ms: None,
            })),
            running: Arc::new(AtomicBool::new(false)),
            busy: Arc::new(AtomicBool::new(false)),
            worker: None,
        })
    }

    /// Start the background polling loop. Idempotent.
    pub fn start(&mut self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let chain = Arc::clone(&self.chain);
        let state = Arc::clone(&self.state);
        let sink = Arc::clone(&self.sink);
        let running = Arc::clone(&self.running);
        let busy = Arc::clone(&self.busy);
        let symbol = self.config.symbol.clone();
        let interval = self.config.interval.clone();
        let limit = self.fetch_limit;
        let period = Duration::from_secs(self.config.poll_secs.max(1));

        tracing::info!(symbol = %symbol, interval = %interval, "poll driver starting");
        self.worker = Some(std::thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                poll_cycle(&chain, &state, sink.as_ref(), &busy, &symbol, &interval, limit);

                // Sleep in short slices so stop() is responsive.
                let mut slept = Duration::ZERO;
                while slept < period && running.load(Ordering::SeqCst) {
                    let step = Duration::from_millis(100).min(period - slept);
                    std::thread::sleep(step);
                    slept += step;
                }
            }
        }));
    }

    /// Run exactly one poll cycle on the calling thread. Shares the
    /// single-flight guard with the background loop.
    pub fn poll_now(&self) {
        poll_cycle(
            &self.chain,
            &self.state,
            self.sink.as_ref(),
            &self.busy,
            &self.config.symbol,
            &self.config.interval,
            self.fetch_limit,
        );
    }

    /// Stop the loop and join the worker; the in-flight cycle completes,
    /// so a fetched bar is either fully applied or discarded.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
            tracing::info!("poll driver stopped");
        }
    }

    pub fn status(&self) -> BufferStatus {
        let st = self.state.lock().unwrap();
        BufferStatus {
            bars_seen: st.engine.bars_seen(),
            min_required: st.engine.min_history(),
            ready: st.engine.ready(),
            trend: st.engine.trend(),
            has_pending: st.trades.has_pending(),
            completed_trades: st.trades.completed().len(),
        }
    }

    pub fn completed_positions(&self) -> Vec<Position> {
        self.state.lock().unwrap().trades.completed().to_vec()
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }
}

impl Drop for PollDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn poll_cycle(
    chain: &SourceChain,
    state: &Mutex<DriverState>,
    sink: &dyn Sink,
    busy: &AtomicBool,
    symbol: &str,
    interval: &str,
    limit: usize,
) {
    if busy
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        tracing::warn!("previous poll cycle still in flight, skipping");
        return;
    }

    let outcome = match chain.fetch_latest(symbol, interval, limit) {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!(error = %err, "fetch failed, will retry next cycle");
            busy.store(false, Ordering::SeqCst);
            return;
        }
    };

    {
        let mut st = state.lock().unwrap();
        for kline in &outcome.closed {
            if st.last_close_ms.is_some_and(|last| kline.close_time_ms <= last) {
                continue;
            }
            apply_closed_kline(&mut st, sink, kline);
        }

        // Live price of the forming candle: exit checks only, never the
        // engine.
        if let Some(current) = outcome.current {
            if let Some(done) = st.trades.on_price(current.close, Utc::now()).copied() {
                tracing::info!(
                    outcome = ?done.outcome,
                    pl_pct = done.profit_loss_pct,
                    exit = current.close,
                    "position closed on live tick"
                );
                sink.on_position(&done);
            }
        }
    }

    busy.store(false, Ordering::SeqCst);
}

fn apply_closed_kline(st: &mut DriverState, sink: &dyn Sink, kline: &RawKline) {
    let bar = match kline.into_bar() {
        Ok(bar) => bar,
        Err(err) => {
            tracing::warn!(error = %err, "dropping malformed kline");
            return;
        }
    };

    match st.engine.process_bar(bar) {
        Ok(result) => {
            st.last_close_ms = Some(kline.close_time_ms);
            sink.on_bar(&result);

            if result.is_signal() {
                let summary = result.summary();
                tracing::info!(
                    cisd = result.cisd,
                    trend = result.trend,
                    price = result.close,
                    strong = result.is_strong(),
                    "signal"
                );
                sink.on_signal(&summary);
            }

            if let Some(opened) = st.trades.on_bar_result(&result).copied() {
                tracing::info!(
                    direction = ?opened.direction,
                    entry = opened.entry_price,
                    stop = opened.stop_loss,
                    target = opened.target,
                    "position opened"
                );
                sink.on_position(&opened);
            }

            if let Some(done) = st.trades.on_price(bar.close, bar.time).copied() {
                tracing::info!(
                    outcome = ?done.outcome,
                    pl_pct = done.profit_loss_pct,
                    "position closed on bar close"
                );
                sink.on_position(&done);
            }
        }
        Err(err) => {
            // The bar is consumed either way so a bad candle cannot wedge
            // the stream.
            st.last_close_ms = Some(kline.close_time_ms);
            tracing::warn!(error = %err, "engine rejected bar");
        }
    }
}
