//! Trade: a completed round trip reconstructed from per-bar engine output.

use super::side::Side;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a completed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// `None` for a flat side.
    pub fn from_side(side: Side) -> Option<Self> {
        match side {
            Side::Long => Some(Direction::Long),
            Side::Short => Some(Direction::Short),
            Side::Flat => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => f.write_str("LONG"),
            Direction::Short => f.write_str("SHORT"),
        }
    }
}

/// A complete round-trip trade: entry → exit.
///
/// `realized_pnl` is the sum of bar P&L strictly after the entry bar up to and
/// including the exit bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub direction: Direction,
    pub realized_pnl: f64,
    pub entry_index: usize,
    pub exit_index: usize,
}

impl Trade {
    pub fn bars_held(&self) -> usize {
        self.exit_index.saturating_sub(self.entry_index)
    }

    pub fn is_winner(&self) -> bool {
        self.realized_pnl > 0.0
    }
}
