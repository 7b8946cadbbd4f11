//! Trade extraction: folds per-bar engine output into round-trip trades.
//!
//! Pure function of the `BarOutput` sequence. A trade opens either
//! - on the first bar whose P&L was earned by a held side (entered at the
//!   previous bar's close), or
//! - on a bar that ends with a non-zero position and no open trade (plain
//!   adoption, or the reopen half of a flip).
//!
//! A trade exits on the next bar flagged `closed`. Every P&L-bearing bar lies in
//! exactly one trade, so the sum of trade P&L equals the sum of bar P&L.

use crate::domain::{BarOutput, Direction, Side, Trade};

/// State for an open trade being tracked during extraction.
struct OpenTrade {
    entry_index: usize,
    direction: Direction,
    pnl: f64,
}

impl OpenTrade {
    fn new(entry_index: usize, side: Side) -> Option<Self> {
        Direction::from_side(side).map(|direction| Self {
            entry_index,
            direction,
            pnl: 0.0,
        })
    }

    fn close(self, outputs: &[BarOutput], exit_index: usize) -> Trade {
        Trade {
            entry_time: outputs[self.entry_index].timestamp,
            exit_time: outputs[exit_index].timestamp,
            direction: self.direction,
            realized_pnl: self.pnl,
            entry_index: self.entry_index,
            exit_index,
        }
    }
}

/// Extract round-trip trades from per-bar engine output.
///
/// A trade still open at the final bar is closed there. A flip that closes and
/// reopens on the same bar produces two trades sharing that timestamp.
pub fn extract_trades(outputs: &[BarOutput]) -> Vec<Trade> {
    let mut trades = Vec::new();
    let mut open: Option<OpenTrade> = None;

    for (i, bar) in outputs.iter().enumerate() {
        if open.is_none() && !bar.held.is_flat() {
            open = OpenTrade::new(i.saturating_sub(1), bar.held);
        }

        if let Some(trade) = open.as_mut() {
            trade.pnl += bar.pnl;
        }

        if bar.closed {
            if let Some(trade) = open.take() {
                trades.push(trade.close(outputs, i));
            }
        }

        if open.is_none() && bar.position != 0.0 {
            open = OpenTrade::new(i, Side::from_quantity(bar.position));
        }
    }

    if let Some(trade) = open.take() {
        let last = outputs.len() - 1;
        trades.push(trade.close(outputs, last));
    }

    trades
}
