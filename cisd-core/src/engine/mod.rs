//! The market-structure signal engine.
//!
//! Per bar, in order: pivot detection, swing wick/expiry update, candidate
//! creation on a one-bar color flip, confirmation tests (bearish before
//! bullish), then one [`BarResult`] out. All state is owned by the engine
//! instance; nothing here performs I/O.

pub mod buffer;
pub mod candidates;
pub mod signal;
pub mod swings;

pub use buffer::BarBuffer;
pub use candidates::{CandidateTracker, Confirmation};
pub use signal::{EngineError, SignalEngine};
pub use swings::{SweepContext, SwingTracker, WickFlags, WickMark};
