//! Provider failover: ordered fallback or race-all.
//!
//! Individual provider failures are logged and absorbed here; only the
//! exhaustion of every provider surfaces as an error. The driver never sees
//! which source answered.

use crate::provider::{BarProvider, FeedError, FetchOutcome};
use serde::{Deserialize, Serialize};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

/// How the chain consults its providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailoverStrategy {
    /// Try providers in configured order, first success wins.
    #[default]
    Ordered,
    /// Query all providers concurrently, first success wins.
    Race,
}

/// An ordered set of providers behind one fetch call.
pub struct SourceChain {
    providers: Vec<Arc<dyn BarProvider>>,
    strategy: FailoverStrategy,
}

impl SourceChain {
    pub fn new(providers: Vec<Arc<dyn BarProvider>>, strategy: FailoverStrategy) -> Self {
        assert!(!providers.is_empty(), "source chain needs at least one provider");
        Self {
            providers,
            strategy,
        }
    }

    pub fn strategy(&self) -> FailoverStrategy {
        self.strategy
    }

    /// Fetch through the chain according to its strategy.
    pub fn fetch_latest(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<FetchOutcome, FeedError> {
        match self.strategy {
            FailoverStrategy::Ordered => self.fetch_ordered(symbol, interval, limit),
            FailoverStrategy::Race => self.fetch_race(symbol, interval, limit),
        }
    }

    fn fetch_ordered(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<FetchOutcome, FeedError> {
        let mut last = String::from("no providers configured");
        for provider in &self.providers {
            match provider.fetch_latest(symbol, interval, limit) {
                Ok(outcome) => {
                    tracing::debug!(provider = provider.name(), "fetch succeeded");
                    return Ok(outcome);
                }
                Err(err) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %err,
                        "provider failed, trying next"
                    );
                    last = format!("{}: {err}", provider.name());
                }
            }
        }
        Err(FeedError::Exhausted { last })
    }

    /// One worker thread per provider; the first success wins and the
    /// losers' results are dropped with the channel.
    fn fetch_race(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> Result<FetchOutcome, FeedError> {
        let (tx, rx) = mpsc::channel();
        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let tx = tx.clone();
            let symbol = symbol.to_string();
            let interval = interval.to_string();
            thread::spawn(move || {
                let result = provider.fetch_latest(&symbol, &interval, limit);
                let _ = tx.send((provider.name().to_string(), result));
            });
        }
        drop(tx);

        let mut last = String::from("no providers configured");
        while let Ok((name, result)) = rx.recv() {
            match result {
                Ok(outcome) => {
                    tracing::debug!(provider = %name, "race won");
                    return Ok(outcome);
                }
                Err(err) => {
                    tracing::warn!(provider = %name, error = %err, "race entrant failed");
                    last = format!("{name}: {err}");
                }
            }
        }
        Err(FeedError::Exhausted { last })
    }
}
