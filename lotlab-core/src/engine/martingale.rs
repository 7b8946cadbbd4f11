//! Martingale lot state machine.
//!
//! Each bar is one pure transition `step(state, bar) -> (state', output, fills)`.
//! The signal driving bar `i` is the one observed at bar `i - 1`, matching the
//! plain executor's lag. Per bar, in order:
//!
//! 1. Flat with a signal: open `base_lot` at the previous close.
//! 2. In position: accrue P&L, then
//!    a. take-profit when the favorable excursion reaches `take_profit`
//!       (ends the bar's processing), else
//!    b. add when price is `step` or more away from the entry, in either
//!       direction: scale the lot and re-anchor the entry.
//! 3. Opposite signal: close and reverse, unless the position is underwater and
//!    `close_on_flip` is off, in which case the flip is ignored.
//!
//! A position still open after the last bar is closed at the last available price.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{Bar, BarOutput, Fill, FillAction, FillNote, PositionState, Side};
use crate::engine::convert::validate_bars;
use crate::engine::error::{require_positive, EngineError};
use crate::engine::state::{Engine, EngineRun};

/// Martingale sizing and exit parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MartingaleConfig {
    /// Size of the first lot on a new position.
    pub base_lot: f64,
    /// Factor applied to the lot on each add.
    pub multiplier: f64,
    /// Absolute price distance from the entry that triggers an add.
    pub step: f64,
    /// Favorable price distance from the entry that closes for profit.
    pub take_profit: f64,
    /// Invert every signal before any other logic.
    pub reverse_signals: bool,
    /// Close and reverse on every opposite signal. When off, opposite signals are
    /// ignored while the position is underwater.
    pub close_on_flip: bool,
}

impl Default for MartingaleConfig {
    fn default() -> Self {
        Self {
            base_lot: 0.02,
            multiplier: 2.0,
            step: 10.0,
            take_profit: 5.0,
            reverse_signals: false,
            close_on_flip: false,
        }
    }
}

impl MartingaleConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        require_positive("base_lot", self.base_lot)?;
        require_positive("multiplier", self.multiplier)?;
        require_positive("step", self.step)?;
        require_positive("take_profit", self.take_profit)?;
        Ok(())
    }

    /// Apply `reverse_signals` to a raw directive.
    pub fn directive(&self, signal: Side) -> Side {
        if self.reverse_signals {
            signal.reversed()
        } else {
            signal
        }
    }
}

/// Inputs to a single transition. Both closes are known-valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarStep {
    pub prev_timestamp: NaiveDateTime,
    pub prev_close: f64,
    pub timestamp: NaiveDateTime,
    pub close: f64,
    /// Lagged directive, already reversed if configured.
    pub signal: Side,
}

/// Result of a single transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: PositionState,
    pub output: BarOutput,
    pub fills: Vec<Fill>,
}

/// Advance the position by one bar.
pub fn step(state: PositionState, bar: &BarStep, config: &MartingaleConfig) -> Transition {
    let mut fills = Vec::new();
    let mut state = state;

    if state.is_flat() && !bar.signal.is_flat() {
        state = PositionState::open(bar.signal, config.base_lot, bar.prev_close);
        fills.push(Fill {
            timestamp: bar.prev_timestamp,
            action: FillAction::entering(bar.signal),
            price: bar.prev_close,
            resulting_position: state.exposure(),
            note: FillNote::Open,
        });
    }

    if state.is_flat() {
        return Transition {
            state,
            output: BarOutput::idle(bar.timestamp),
            fills,
        };
    }

    let side = state.side();
    let mut output = BarOutput {
        timestamp: bar.timestamp,
        position: state.exposure(),
        pnl: (bar.close - bar.prev_close) * side.sign() * state.lot(),
        closed: false,
        held: side,
    };

    if state.excursion(bar.close) >= config.take_profit {
        fills.push(Fill {
            timestamp: bar.timestamp,
            action: FillAction::exiting(side),
            price: bar.close,
            resulting_position: 0.0,
            note: FillNote::TakeProfit {
                amount: config.take_profit,
            },
        });
        output.position = 0.0;
        output.closed = true;
        return Transition {
            state: PositionState::flat(),
            output,
            fills,
        };
    }

    // Distance trigger, not a drawdown trigger: favorable moves add too.
    if state.excursion(bar.close).abs() >= config.step {
        state = state.scaled(config.multiplier, config.base_lot, bar.close);
        fills.push(Fill {
            timestamp: bar.timestamp,
            action: FillAction::entering(side),
            price: bar.close,
            resulting_position: state.exposure(),
            note: FillNote::Add {
                multiplier: config.multiplier,
            },
        });
    }

    if bar.signal.opposes(side) {
        let in_drawdown = state.excursion(bar.close) < 0.0;
        if config.close_on_flip || !in_drawdown {
            fills.push(Fill {
                timestamp: bar.timestamp,
                action: FillAction::exiting(side),
                price: bar.close,
                resulting_position: 0.0,
                note: FillNote::FlipClose {
                    forced: config.close_on_flip,
                },
            });
            state = PositionState::open(bar.signal, config.base_lot, bar.close);
            fills.push(Fill {
                timestamp: bar.timestamp,
                action: FillAction::entering(bar.signal),
                price: bar.close,
                resulting_position: state.exposure(),
                note: FillNote::FlipOpen,
            });
            output.closed = true;
            output.position = state.exposure();
        }
    }

    Transition {
        state,
        output,
        fills,
    }
}

/// Run the martingale engine over a bar series.
pub fn run_martingale(
    bars: &[Bar],
    config: &MartingaleConfig,
) -> Result<EngineRun, EngineError> {
    config.validate()?;
    validate_bars(bars)?;

    let mut outputs = Vec::with_capacity(bars.len());
    let mut fills = Vec::new();
    let mut state = PositionState::flat();
    let mut last_price = None;

    if let Some(first) = bars.first() {
        outputs.push(BarOutput::idle(first.timestamp));
        last_price = first.close;
    }

    for pair in bars.windows(2) {
        let (prev, bar) = (&pair[0], &pair[1]);
        if bar.close.is_some() {
            last_price = bar.close;
        }
        let (Some(prev_close), Some(close)) = (prev.close, bar.close) else {
            outputs.push(BarOutput::idle(bar.timestamp));
            continue;
        };

        let transition = step(
            state,
            &BarStep {
                prev_timestamp: prev.timestamp,
                prev_close,
                timestamp: bar.timestamp,
                close,
                signal: config.directive(prev.side()),
            },
            config,
        );
        state = transition.state;
        outputs.push(transition.output);
        fills.extend(transition.fills);
    }

    if !state.is_flat() {
        if let Some(last) = outputs.pop() {
            fills.push(Fill {
                timestamp: last.timestamp,
                action: FillAction::exiting(state.side()),
                price: last_price.or(state.entry_price()).unwrap_or_default(),
                resulting_position: 0.0,
                note: FillNote::SessionClose,
            });
            outputs.push(last.session_closed());
        }
    }

    let run = EngineRun { outputs, fills };
    tracing::debug!(
        bars = bars.len(),
        fills = run.fills.len(),
        closed = run.closed_count(),
        "martingale run complete"
    );

    Ok(run)
}

/// [`Engine`] adapter for [`run_martingale`].
#[derive(Debug, Clone, Default)]
pub struct MartingaleEngine {
    pub config: MartingaleConfig,
}

impl MartingaleEngine {
    pub fn new(config: MartingaleConfig) -> Self {
        Self { config }
    }
}

impl Engine for MartingaleEngine {
    fn name(&self) -> &'static str {
        "martingale"
    }

    fn run(&self, bars: &[Bar]) -> Result<EngineRun, EngineError> {
        run_martingale(bars, &self.config)
    }
}
