//! Domain types for the CISD engine and trade lifecycle.

pub mod bar;
pub mod candidate;
pub mod position;
pub mod result;
pub mod swing;

pub use bar::{Bar, BarError};
pub use candidate::{Polarity, TransitionCandidate};
pub use position::{Direction, Outcome, Position, PositionStatus};
pub use result::{BarResult, Bias, SignalSummary, Strength};
pub use swing::{SwingDirection, SwingLevel};
