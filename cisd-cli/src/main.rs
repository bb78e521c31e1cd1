//! CISD CLI — demo, replay, and live run commands.
//!
//! Commands:
//! - `demo` — run a seeded synthetic stream through the engine and print
//!   every signal and trade
//! - `replay` — feed a CSV bar file through the engine, optionally writing
//!   the completed trades to another CSV
//! - `run` — live polling loop from a TOML feed config, until Ctrl-C

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use cisd_core::config::{IndicatorConfig, TradePolicy};
use cisd_core::domain::{Bar, Outcome, Position, SignalSummary};
use cisd_core::engine::SignalEngine;
use cisd_core::lifecycle::TradeManager;
use cisd_feed::driver::{PollDriver, Sink};
use cisd_feed::synthetic::random_walk;
use cisd_feed::FeedConfig;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

#[derive(Parser)]
#[command(name = "cisd", about = "Change-in-state-of-delivery signal engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a seeded synthetic stream through the engine.
    Demo {
        /// Number of bars to generate.
        #[arg(long, default_value_t = 300)]
        bars: usize,

        /// Random walk seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Pivot lookback/lookahead width.
        #[arg(long, default_value_t = 12)]
        swing_period: usize,
    },
    /// Replay a CSV bar file through the engine.
    Replay {
        /// CSV with time,open,high,low,close[,volume] columns; time is
        /// RFC 3339.
        #[arg(long)]
        file: PathBuf,

        /// Write completed trades to this CSV file.
        #[arg(long)]
        trades_out: Option<PathBuf>,

        /// Pivot lookback/lookahead width.
        #[arg(long, default_value_t = 12)]
        swing_period: usize,
    },
    /// Poll live data until interrupted.
    Run {
        /// Path to the feed TOML config.
        #[arg(long, default_value = "feed.toml")]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Demo {
            bars,
            seed,
            swing_period,
        } => cmd_demo(bars, seed, swing_period),
        Commands::Replay {
            file,
            trades_out,
            swing_period,
        } => cmd_replay(&file, trades_out.as_deref(), swing_period),
        Commands::Run { config } => cmd_run(&config),
    }
}

// ──────────────────────────────────────────────
// demo
// ──────────────────────────────────────────────

fn cmd_demo(bars: usize, seed: u64, swing_period: usize) -> Result<()> {
    let series = random_walk(seed, bars, 100.0);
    println!("Demo: {bars} synthetic bars, seed {seed}, swing period {swing_period}");
    let stats = run_series(&series, swing_period)?;
    stats.print();
    Ok(())
}

// ──────────────────────────────────────────────
// replay
// ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CsvBar {
    time: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

fn cmd_replay(
    file: &std::path::Path,
    trades_out: Option<&std::path::Path>,
    swing_period: usize,
) -> Result<()> {
    let mut reader = csv::Reader::from_path(file)
        .with_context(|| format!("cannot open {}", file.display()))?;
    let mut series = Vec::new();
    for record in reader.deserialize() {
        let row: CsvBar = record.context("malformed CSV row")?;
        series.push(Bar {
            time: row.time,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }
    println!("Replay: {} bars from {}", series.len(), file.display());

    let stats = run_series(&series, swing_period)?;
    stats.print();

    if let Some(path) = trades_out {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("cannot create {}", path.display()))?;
        for pos in &stats.completed {
            writer.serialize(pos)?;
        }
        writer.flush()?;
        println!("Wrote {} trades to {}", stats.completed.len(), path.display());
    }
    Ok(())
}

// ──────────────────────────────────────────────
// run
// ──────────────────────────────────────────────

/// Sink that prints signals and trade events as they happen.
struct PrintSink;

impl Sink for PrintSink {
    fn on_signal(&self, signal: &SignalSummary) {
        println!(
            "{}  {:?}/{:?} conf={} price={:.2} cisd={} trend={}",
            signal.time.format("%Y-%m-%d %H:%M"),
            signal.bias,
            signal.strength,
            signal.confidence,
            signal.price,
            signal.cisd,
            signal.trend,
        );
    }

    fn on_position(&self, position: &Position) {
        match position.outcome {
            Outcome::Open => println!(
                "OPEN  {:?} entry={:.2} stop={:.2} target={:.2}",
                position.direction, position.entry_price, position.stop_loss, position.target,
            ),
            outcome => println!(
                "CLOSE {:?} {:?} pl={:+.2}%",
                position.direction, outcome, position.profit_loss_pct,
            ),
        }
    }
}

fn cmd_run(config_path: &std::path::Path) -> Result<()> {
    let config = FeedConfig::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let chain = config.build_chain()?;
    let mut driver = PollDriver::new(config, chain, Arc::new(PrintSink))?;

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    })
    .context("installing Ctrl-C handler")?;

    driver.start();
    println!(
        "Polling {} every {}s (Ctrl-C to stop)",
        driver.config().symbol,
        driver.config().poll_secs
    );
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(200));
    }

    driver.stop();
    let status = driver.status();
    println!(
        "Stopped after {} bars: trend={} pending={} completed={}",
        status.bars_seen, status.trend, status.has_pending, status.completed_trades
    );
    Ok(())
}

// ──────────────────────────────────────────────
// shared
// ──────────────────────────────────────────────

struct RunStats {
    bars: usize,
    signals: usize,
    strong_signals: usize,
    completed: Vec<Position>,
    final_trend: i8,
}

impl RunStats {
    fn print(&self) {
        let winners = self
            .completed
            .iter()
            .filter(|p| p.outcome == Outcome::Winner)
            .count();
        let total_pl: f64 = self.completed.iter().map(|p| p.profit_loss_pct).sum();
        println!("Bars processed:  {}", self.bars);
        println!(
            "Signals:         {} ({} strong)",
            self.signals, self.strong_signals
        );
        println!(
            "Trades:          {} ({} winners, {} losers)",
            self.completed.len(),
            winners,
            self.completed.len() - winners
        );
        println!("Total P/L:       {total_pl:+.2}%");
        println!("Final trend:     {}", self.final_trend);
    }
}

fn run_series(series: &[Bar], swing_period: usize) -> Result<RunStats> {
    let mut engine = SignalEngine::new(IndicatorConfig {
        swing_period,
        ..Default::default()
    })?;
    let mut trades = TradeManager::new(TradePolicy::default());

    let mut signals = 0;
    let mut strong_signals = 0;
    for bar in series {
        let result = match engine.process_bar(*bar) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(error = %err, "skipping bar");
                continue;
            }
        };
        if result.is_signal() {
            signals += 1;
            if result.is_strong() {
                strong_signals += 1;
            }
            let s = result.summary();
            println!(
                "{}  {:?}/{:?} price={:.2} cisd={} trend={}",
                s.time.format("%Y-%m-%d %H:%M"),
                s.bias,
                s.strength,
                s.price,
                s.cisd,
                s.trend,
            );
        }
        if let Some(opened) = trades.on_bar_result(&result) {
            println!(
                "  OPEN  {:?} entry={:.2} stop={:.2} target={:.2}",
                opened.direction, opened.entry_price, opened.stop_loss, opened.target,
            );
        }
        if let Some(done) = trades.on_price(bar.close, bar.time) {
            println!(
                "  CLOSE {:?} {:?} pl={:+.2}%",
                done.direction, done.outcome, done.profit_loss_pct,
            );
        }
    }

    Ok(RunStats {
        bars: engine.bars_seen(),
        signals,
        strong_signals,
        completed: trades.completed().to_vec(),
        final_trend: engine.trend(),
    })
}
