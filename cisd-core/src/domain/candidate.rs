//! Transition candidates — levels whose breach confirms a change in state
//! of delivery.

use serde::{Deserialize, Serialize};

/// Polarity of the reversal a candidate would confirm.
///
/// The mapping is deliberately inverted relative to the bar color that
/// creates it: a one-bar flip from bearish to bullish leaves behind the
/// bullish bar's open as a `Bearish` candidate — price closing back *below*
/// that open later confirms a bearish reversal. Mirror for `Bullish`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Bearish,
    Bullish,
}

/// An unconfirmed reversal level created on a one-bar color flip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionCandidate {
    /// Absolute index of the bar whose open defines the level.
    pub bar: usize,
    pub level: f64,
    pub polarity: Polarity,
}
