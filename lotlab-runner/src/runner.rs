//! Backtest runner: wires together config, engine, trade extraction, and metrics.
//!
//! Two entry points:
//! - `run_single_backtest()`: loads bars from a CSV file, then runs. Used by the CLI.
//! - `run_backtest()`: takes pre-loaded bars. Used by sweeps.

use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lotlab_core::domain::{Bar, BarOutput, Fill, Trade};
use lotlab_core::engine::{extract_trades, EngineError};

use crate::config::{ConfigError, RunConfig, RunId};
use crate::data_loader::{load_bars, LoadError};
use crate::metrics::{equity_curve, AccountingSummary};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub engine: String,
    pub config: RunConfig,
    /// BLAKE3 of the input file, when the bars came from one.
    pub dataset_hash: Option<String>,
    pub bar_count: usize,
    pub first_timestamp: Option<NaiveDateTime>,
    pub last_timestamp: Option<NaiveDateTime>,
    pub summary: AccountingSummary,
    pub outputs: Vec<BarOutput>,
    pub fills: Vec<Fill>,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<f64>,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    pub fn total_pnl(&self) -> f64 {
        self.summary.total_pnl
    }
}

/// Run a single backtest from a bar file.
pub fn run_single_backtest(
    bars_path: &Path,
    config: &RunConfig,
) -> Result<BacktestResult, RunError> {
    let loaded = load_bars(bars_path)?;
    let mut result = run_backtest(&loaded.bars, config)?;
    result.dataset_hash = Some(loaded.dataset_hash);
    Ok(result)
}

/// Run a backtest over pre-loaded bars. No I/O.
pub fn run_backtest(bars: &[Bar], config: &RunConfig) -> Result<BacktestResult, RunError> {
    let engine = config.build_engine()?;
    let run_id = config.run_id()?;

    let run = engine.run(bars)?;
    let trades = extract_trades(&run.outputs);
    let curve = equity_curve(&run.outputs, config.starting_equity);
    let summary = AccountingSummary::compute(
        &run.outputs,
        &trades,
        run.fills.len(),
        config.starting_equity,
    );

    tracing::info!(
        engine = engine.name(),
        run_id = %&run_id[..12],
        bars = bars.len(),
        trades = summary.trade_count,
        total_pnl = summary.total_pnl,
        max_drawdown = summary.max_drawdown,
        "run complete"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        engine: engine.name().to_string(),
        config: config.clone(),
        dataset_hash: None,
        bar_count: bars.len(),
        first_timestamp: bars.first().map(|b| b.timestamp),
        last_timestamp: bars.last().map(|b| b.timestamp),
        summary,
        outputs: run.outputs,
        fills: run.fills,
        trades,
        equity_curve: curve,
    })
}
