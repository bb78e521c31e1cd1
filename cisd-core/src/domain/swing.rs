//! Swing levels — pivot highs and lows tracked until expiry or mitigation.

use serde::{Deserialize, Serialize};

/// Which extreme a swing level marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwingDirection {
    High,
    Low,
}

/// A confirmed pivot level.
///
/// Created when a pivot is detected at `origin_bar` (the center of the
/// symmetric lookback/lookahead window). `active` goes false once the level
/// expires or is mitigated, and never comes back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingLevel {
    pub level: f64,
    pub origin_bar: usize,
    pub active: bool,
    pub direction: SwingDirection,
}

impl SwingLevel {
    pub fn new(level: f64, origin_bar: usize, direction: SwingDirection) -> Self {
        Self {
            level,
            origin_bar,
            active: true,
            direction,
        }
    }

    /// Bars elapsed since the pivot bar.
    pub fn age(&self, current_bar: usize) -> usize {
        current_bar.saturating_sub(self.origin_bar)
    }
}
