//! Non-escalating signal execution: one fixed size in, the same size out.
//!
//! Signals are decided on a bar's close and acted on during the next bar, so the
//! side held during bar `i` is the signal observed at bar `i - 1`. P&L for a bar
//! is always attributed to the side held entering it.

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, BarOutput, Side};
use crate::engine::convert::validate_bars;
use crate::engine::error::{require_positive, EngineError};
use crate::engine::state::{Engine, EngineRun};

/// Configuration for the plain signal executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Units held whenever a side is held.
    pub position_size: f64,
    /// `true`: a zero signal flattens the position.
    /// `false`: a zero signal keeps the previous side; only an opposite signal
    /// changes it.
    pub flat_on_zero: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            position_size: 1.0,
            flat_on_zero: true,
        }
    }
}

impl ExecutionConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        require_positive("position_size", self.position_size)
    }
}

/// Convert a signal series into per-bar position, P&L, and closed flags.
pub fn run_signals(
    bars: &[Bar],
    config: &ExecutionConfig,
) -> Result<Vec<BarOutput>, EngineError> {
    config.validate()?;
    validate_bars(bars)?;

    let size = config.position_size;
    let mut outputs = Vec::with_capacity(bars.len());
    let mut side = Side::Flat;

    if let Some(first) = bars.first() {
        outputs.push(BarOutput::idle(first.timestamp));
    }

    for pair in bars.windows(2) {
        let (prev, bar) = (&pair[0], &pair[1]);
        let (Some(prev_close), Some(close)) = (prev.close, bar.close) else {
            outputs.push(BarOutput::idle(bar.timestamp));
            continue;
        };

        let lagged = prev.side();
        let target = if lagged.is_flat() && !config.flat_on_zero {
            side
        } else {
            lagged
        };

        let pnl = if side.is_flat() {
            0.0
        } else {
            (close - prev_close) * side.sign() * size
        };

        outputs.push(BarOutput {
            timestamp: bar.timestamp,
            position: target.sign() * size,
            pnl,
            closed: !side.is_flat() && target != side,
            held: side,
        });
        side = target;
    }

    // Still holding after the last bar: flatten so every position reconciles.
    if !side.is_flat() {
        if let Some(last) = outputs.pop() {
            outputs.push(last.session_closed());
        }
    }

    Ok(outputs)
}

/// [`Engine`] adapter for [`run_signals`]. Produces no fill ledger.
#[derive(Debug, Clone, Default)]
pub struct SignalExecutor {
    pub config: ExecutionConfig,
}

impl SignalExecutor {
    pub fn new(config: ExecutionConfig) -> Self {
        Self { config }
    }
}

impl Engine for SignalExecutor {
    fn name(&self) -> &'static str {
        "signals"
    }

    fn run(&self, bars: &[Bar]) -> Result<EngineRun, EngineError> {
        let run = EngineRun {
            outputs: run_signals(bars, &self.config)?,
            fills: Vec::new(),
        };
        tracing::debug!(
            bars = bars.len(),
            closed = run.closed_count(),
            "signal execution complete"
        );
        Ok(run)
    }
}
