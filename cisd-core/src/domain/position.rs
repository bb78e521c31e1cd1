//! Position — a simulated trade with entry, stop, target, and lifecycle
//! status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Long,
    Short,
}

/// Lifecycle state: a position is `Pending` while open and `Completed`
/// once an exit level is touched. Terminal once `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionStatus {
    Pending,
    Completed,
}

/// Result of the trade. `Open` until completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Open,
    Winner,
    Loser,
}

/// A simulated trade record. Created by the lifecycle manager on a strong
/// signal and mutated only by it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub target: f64,
    pub quantity: f64,
    pub status: PositionStatus,
    pub outcome: Outcome,
    /// Signed percentage return; 0.0 while the position is open.
    pub profit_loss_pct: f64,
    pub entry_time: DateTime<Utc>,
    pub exit_price: Option<f64>,
    pub exit_time: Option<DateTime<Utc>>,
}

impl Position {
    pub fn is_pending(&self) -> bool {
        self.status == PositionStatus::Pending
    }

    pub fn is_winner(&self) -> bool {
        self.outcome == Outcome::Winner
    }
}
