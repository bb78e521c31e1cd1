//! Feed configuration, loaded from a TOML file.

use crate::binance::BinanceProvider;
use crate::cryptocompare::CryptoCompareProvider;
use crate::failover::{FailoverStrategy, SourceChain};
use crate::provider::{interval_ms, BarProvider, FeedError};
use crate::synthetic::SyntheticProvider;
use cisd_core::config::{ConfigError, IndicatorConfig, TradePolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] ConfigError),

    #[error("provider list is empty")]
    NoProviders,

    #[error(transparent)]
    Feed(#[from] FeedError),
}

/// Provider identifiers accepted in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Binance,
    Cryptocompare,
    Synthetic,
}

/// Top-level feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub symbol: String,
    pub interval: String,
    /// Seconds between poll cycles.
    pub poll_secs: u64,
    pub providers: Vec<ProviderKind>,
    pub failover: FailoverStrategy,
    pub indicator: IndicatorConfig,
    pub trade: TradePolicy,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            interval: "1m".to_string(),
            poll_secs: 5,
            providers: vec![ProviderKind::Binance, ProviderKind::Cryptocompare],
            failover: FailoverStrategy::Ordered,
            indicator: IndicatorConfig::default(),
            trade: TradePolicy::default(),
        }
    }
}

impl FeedConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FeedConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| FeedConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FeedConfigError> {
        if self.providers.is_empty() {
            return Err(FeedConfigError::NoProviders);
        }
        interval_ms(&self.interval)?;
        self.indicator.validate()?;
        self.trade.validate()?;
        Ok(())
    }

    /// Instantiate the configured providers as a failover chain.
    pub fn build_chain(&self) -> Result<SourceChain, FeedConfigError> {
        let mut providers: Vec<Arc<dyn BarProvider>> = Vec::with_capacity(self.providers.len());
        for kind in &self.providers {
            let provider: Arc<dyn BarProvider> = match kind {
                ProviderKind::Binance => Arc::new(BinanceProvider::new()?),
                ProviderKind::Cryptocompare => Arc::new(CryptoCompareProvider::new()?),
                ProviderKind::Synthetic => Arc::new(SyntheticProvider::new(42, 100.0)),
            };
            providers.push(provider);
        }
        if providers.is_empty() {
            return Err(FeedConfigError::NoProviders);
        }
        Ok(SourceChain::new(providers, self.failover))
    }
}
