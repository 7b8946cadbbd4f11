use super::side::Side;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Per-bar engine output, keyed by the input bar's timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarOutput {
    pub timestamp: NaiveDateTime,
    /// Signed exposure recorded for this bar.
    pub position: f64,
    /// Profit or loss earned during this bar.
    pub pnl: f64,
    /// A round-trip trade ended on this bar.
    pub closed: bool,
    /// Side whose exposure earned `pnl`. Flat when nothing was held.
    pub held: Side,
}

impl BarOutput {
    /// Output for a bar with no exposure: the first bar, skipped bars, flat bars.
    pub fn idle(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            position: 0.0,
            pnl: 0.0,
            closed: false,
            held: Side::Flat,
        }
    }

    /// The same bar, force-closed and flattened at the end of a session.
    pub fn session_closed(self) -> Self {
        Self {
            position: 0.0,
            closed: true,
            ..self
        }
    }
}
