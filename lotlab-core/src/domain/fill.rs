use super::side::Side;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FillAction {
    Buy,
    Sell,
}

impl FillAction {
    /// The action that opens or adds to a position on `side`.
    pub fn entering(side: Side) -> Self {
        match side {
            Side::Short => FillAction::Sell,
            _ => FillAction::Buy,
        }
    }

    /// The action that closes a position on `side`.
    pub fn exiting(side: Side) -> Self {
        match side {
            Side::Long => FillAction::Sell,
            _ => FillAction::Buy,
        }
    }
}

impl fmt::Display for FillAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillAction::Buy => f.write_str("BUY"),
            FillAction::Sell => f.write_str("SELL"),
        }
    }
}

/// Why the martingale engine changed the position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FillNote {
    Open,
    Add { multiplier: f64 },
    TakeProfit { amount: f64 },
    /// Opposite signal closed the position. `forced` is set when closing on
    /// every flip is configured, as opposed to closing because the position was
    /// not underwater.
    FlipClose { forced: bool },
    FlipOpen,
    SessionClose,
}

impl FillNote {
    pub fn is_exit(&self) -> bool {
        matches!(
            self,
            FillNote::TakeProfit { .. } | FillNote::FlipClose { .. } | FillNote::SessionClose
        )
    }
}

impl fmt::Display for FillNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillNote::Open => f.write_str("Open"),
            FillNote::Add { multiplier } => write!(f, "Add x{multiplier}"),
            FillNote::TakeProfit { amount } => write!(f, "TP close (+{amount})"),
            FillNote::FlipClose { forced: true } => f.write_str("Flip close"),
            FillNote::FlipClose { forced: false } => f.write_str("Flip close (no DD)"),
            FillNote::FlipOpen => f.write_str("Flip open"),
            FillNote::SessionClose => f.write_str("Session close"),
        }
    }
}

/// Ledger entry: one action the martingale engine took.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub timestamp: NaiveDateTime,
    pub action: FillAction,
    pub price: f64,
    /// Signed exposure after this fill.
    pub resulting_position: f64,
    pub note: FillNote,
}
