//! CISD Core — market-structure signal engine and trade lifecycle.
//!
//! This crate contains the deterministic heart of the system:
//! - Domain types (bars, swing levels, transition candidates, per-bar
//!   results, positions)
//! - The signal engine: pivot/swing tracking, change-in-state-of-delivery
//!   confirmation, liquidity-sweep classification
//! - The single-slot position lifecycle manager
//!
//! Everything here is pure given state plus input: no I/O, no clocks, no
//! logging. The feed crate drives it and owns all side effects.

pub mod config;
pub mod domain;
pub mod engine;
pub mod lifecycle;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: engine and lifecycle state can cross thread
    /// boundaries, since the feed runs them behind a mutex on a worker
    /// thread.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::BarResult>();
        require_sync::<domain::BarResult>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::SignalSummary>();
        require_sync::<domain::SignalSummary>();

        require_send::<engine::SignalEngine>();
        require_sync::<engine::SignalEngine>();
        require_send::<lifecycle::TradeManager>();
        require_sync::<lifecycle::TradeManager>();

        require_send::<config::IndicatorConfig>();
        require_sync::<config::IndicatorConfig>();
        require_send::<config::TradePolicy>();
        require_sync::<config::TradePolicy>();
    }
}
