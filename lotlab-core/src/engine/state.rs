//! Engine trait and run result types.

use crate::domain::{Bar, BarOutput, Fill, Trade};
use crate::engine::error::EngineError;
use crate::engine::trade_extraction::extract_trades;
use serde::{Deserialize, Serialize};

/// A signal-to-position engine.
///
/// Implementations are stateless between runs: everything a run mutates lives on
/// the stack of `run`, so one engine value can serve many threads at once.
pub trait Engine: Send + Sync {
    /// Short identifier used in logs and result files.
    fn name(&self) -> &'static str;

    fn run(&self, bars: &[Bar]) -> Result<EngineRun, EngineError>;
}

/// Result of one engine run: one output per input bar plus the fill ledger.
///
/// Engines that do not keep a ledger return an empty `fills`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineRun {
    pub outputs: Vec<BarOutput>,
    pub fills: Vec<Fill>,
}

impl EngineRun {
    pub fn total_pnl(&self) -> f64 {
        self.outputs.iter().map(|o| o.pnl).sum()
    }

    /// Round-trip trades derived from the per-bar output. Recomputed on each call.
    pub fn trades(&self) -> Vec<Trade> {
        extract_trades(&self.outputs)
    }

    /// Number of bars flagged as closing a trade.
    pub fn closed_count(&self) -> usize {
        self.outputs.iter().filter(|o| o.closed).count()
    }
}
