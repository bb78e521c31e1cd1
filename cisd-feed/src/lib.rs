//! CISD Feed — market data plumbing around the core engine.
//!
//! - Providers: Binance klines, CryptoCompare histominute, and a seeded
//!   synthetic random walk
//! - Failover: ordered fallback or race-all across providers
//! - Driver: the fixed-period polling loop with single-flight guarding,
//!   duplicate-candle handling, and the [`Sink`] push boundary
//!
//! All I/O lives here; `cisd-core` stays pure.

pub mod binance;
pub mod config;
pub mod cryptocompare;
pub mod driver;
pub mod failover;
pub mod provider;
pub mod synthetic;

pub use config::{FeedConfig, FeedConfigError, ProviderKind};
pub use driver::{BufferStatus, NoopSink, PollDriver, Sink};
pub use failover::{FailoverStrategy, SourceChain};
pub use provider::{BarProvider, FeedError, FetchOutcome, RawKline};
