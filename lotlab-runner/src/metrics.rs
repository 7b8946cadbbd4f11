//! Accounting summary: pure functions over per-bar output and trades.
//!
//! All money figures are in price units times lot, the same unit the engines
//! report P&L in.

use std::fmt;

use serde::{Deserialize, Serialize};

use lotlab_core::domain::{BarOutput, Trade};

/// Profit factor reported when there are winners and no losers.
pub const PROFIT_FACTOR_CAP: f64 = 100.0;

/// Aggregate accounting for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountingSummary {
    pub starting_equity: f64,
    pub ending_equity: f64,
    pub total_pnl: f64,
    /// Largest peak-to-trough drop of the equity curve. Always `>= 0`.
    pub max_drawdown: f64,
    pub trade_count: usize,
    pub win_rate: f64,
    pub avg_trade_pnl: f64,
    pub profit_factor: f64,
    pub max_consecutive_losses: usize,
    /// Mean bars between entry and exit.
    #[serde(default)]
    pub avg_bars_held: f64,
    /// Largest absolute position held on any bar.
    pub max_exposure: f64,
    /// Bars with non-zero P&L.
    pub active_bars: usize,
    pub fill_count: usize,
}

impl AccountingSummary {
    /// Compute all figures from engine output, trades, and the fill count.
    pub fn compute(
        outputs: &[BarOutput],
        trades: &[Trade],
        fill_count: usize,
        starting_equity: f64,
    ) -> Self {
        let curve = equity_curve(outputs, starting_equity);
        let total_pnl: f64 = outputs.iter().map(|o| o.pnl).sum();
        Self {
            starting_equity,
            ending_equity: curve.last().copied().unwrap_or(starting_equity),
            total_pnl,
            max_drawdown: max_drawdown(&curve),
            trade_count: trades.len(),
            win_rate: win_rate(trades),
            avg_trade_pnl: avg_trade_pnl(trades),
            profit_factor: profit_factor(trades),
            max_consecutive_losses: max_consecutive_losses(trades),
            avg_bars_held: avg_bars_held(trades),
            max_exposure: max_exposure(outputs),
            active_bars: outputs.iter().filter(|o| o.pnl != 0.0).count(),
            fill_count,
        }
    }
}

impl fmt::Display for AccountingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Performance Summary ===")?;
        writeln!(f, "Starting Equity   : {:.2}", self.starting_equity)?;
        writeln!(f, "Trades            : {}", self.trade_count)?;
        writeln!(f, "Win Rate          : {:.1}%", self.win_rate * 100.0)?;
        writeln!(f, "Avg Trade P&L     : {:.2}", self.avg_trade_pnl)?;
        writeln!(f, "Profit Factor     : {:.2}", self.profit_factor)?;
        writeln!(f, "Max Losing Streak : {}", self.max_consecutive_losses)?;
        writeln!(f, "Avg Bars Held     : {:.1}", self.avg_bars_held)?;
        writeln!(f, "Max Exposure      : {:.2}", self.max_exposure)?;
        writeln!(f, "Total P&L         : {:.2}", self.total_pnl)?;
        writeln!(f, "Max Drawdown      : {:.2}", self.max_drawdown)?;
        writeln!(f, "Ending Equity     : {:.2}", self.ending_equity)?;
        write!(f, "===========================")
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Running sum of bar P&L offset by the starting equity. One point per bar.
pub fn equity_curve(outputs: &[BarOutput], starting_equity: f64) -> Vec<f64> {
    outputs
        .iter()
        .scan(starting_equity, |equity, o| {
            *equity += o.pnl;
            Some(*equity)
        })
        .collect()
}

/// Maximum drawdown as an absolute amount: the largest drop from a running peak.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        peak = peak.max(eq);
        max_dd = max_dd.max(peak - eq);
    }
    max_dd
}

/// Fraction of trades with positive P&L.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

pub fn avg_trade_pnl(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.realized_pnl).sum::<f64>() / trades.len() as f64
}

/// Profit factor: gross profits / gross losses.
///
/// Capped at [`PROFIT_FACTOR_CAP`] for edge cases (all winners, zero losses).
pub fn profit_factor(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = trades
        .iter()
        .filter(|t| t.realized_pnl > 0.0)
        .map(|t| t.realized_pnl)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.realized_pnl < 0.0)
        .map(|t| t.realized_pnl.abs())
        .sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 {
            PROFIT_FACTOR_CAP
        } else {
            0.0
        };
    }
    (gross_profit / gross_loss).min(PROFIT_FACTOR_CAP)
}

/// Longest run of consecutive non-winning trades.
pub fn max_consecutive_losses(trades: &[Trade]) -> usize {
    let mut max_streak = 0;
    let mut current = 0;
    for trade in trades {
        if trade.is_winner() {
            current = 0;
        } else {
            current += 1;
            max_streak = max_streak.max(current);
        }
    }
    max_streak
}

pub fn avg_bars_held(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.bars_held()).sum::<usize>() as f64 / trades.len() as f64
}

/// Largest absolute position recorded on any bar.
pub fn max_exposure(outputs: &[BarOutput]) -> f64 {
    outputs.iter().map(|o| o.position.abs()).fold(0.0, f64::max)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use lotlab_core::domain::{Direction, Side};
    use proptest::prelude::*;

    fn outputs_from(pnls: &[f64]) -> Vec<BarOutput> {
        let start = NaiveDate::from_ymd_opt(2025, 8, 19)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        pnls.iter()
            .enumerate()
            .map(|(i, &pnl)| BarOutput {
                timestamp: start + Duration::minutes(i as i64),
                position: 1.0,
                pnl,
                closed: false,
                held: Side::Long,
            })
            .collect()
    }

    fn trades_from(pnls: &[f64]) -> Vec<Trade> {
        let outputs = outputs_from(pnls);
        outputs
            .iter()
            .enumerate()
            .map(|(i, o)| Trade {
                entry_time: o.timestamp,
                exit_time: o.timestamp,
                direction: Direction::Long,
                realized_pnl: o.pnl,
                entry_index: i,
                exit_index: i,
            })
            .collect()
    }

    proptest! {
        #[test]
        fn equity_curve_ends_at_start_plus_total(
            pnls in prop::collection::vec(-50.0..50.0_f64, 0..200),
            start in 0.0..10_000.0_f64,
        ) {
            let curve = equity_curve(&outputs_from(&pnls), start);
            prop_assert_eq!(curve.len(), pnls.len());
            let expected = start + pnls.iter().sum::<f64>();
            let last = curve.last().copied().unwrap_or(start);
            prop_assert!((last - expected).abs() < 1e-6);
        }

        #[test]
        fn drawdown_is_bounded_by_curve_range(
            curve in prop::collection::vec(-1_000.0..1_000.0_f64, 0..200),
        ) {
            let dd = max_drawdown(&curve);
            prop_assert!(dd >= 0.0);
            if let (Some(hi), Some(lo)) = (
                curve.iter().copied().reduce(f64::max),
                curve.iter().copied().reduce(f64::min),
            ) {
                prop_assert!(dd <= hi - lo + 1e-9);
            }
        }

        #[test]
        fn trade_ratios_stay_in_range(
            pnls in prop::collection::vec(-20.0..20.0_f64, 0..100),
        ) {
            let trades = trades_from(&pnls);
            let wr = win_rate(&trades);
            prop_assert!((0.0..=1.0).contains(&wr));
            let pf = profit_factor(&trades);
            prop_assert!((0.0..=PROFIT_FACTOR_CAP).contains(&pf));
            prop_assert!(max_consecutive_losses(&trades) <= trades.len());
        }
    }
}
