//! Engines: signal series in, per-bar position/P&L/closed columns out.
//!
//! Two engines share the same one-bar execution lag:
//!
//! 1. `execution`: fixed size, no escalation, no fill ledger
//! 2. `martingale`: geometric lot scaling, take-profit, flip handling, fill ledger
//!
//! `trade_extraction` folds either engine's output into round-trip trades.

pub mod convert;
pub mod error;
pub mod execution;
pub mod martingale;
pub mod state;
pub mod trade_extraction;

pub use convert::{ingest, raw_to_bar, validate_bars};
pub use error::EngineError;
pub use execution::{run_signals, ExecutionConfig, SignalExecutor};
pub use martingale::{
    run_martingale, step, BarStep, MartingaleConfig, MartingaleEngine, Transition,
};
pub use state::{Engine, EngineRun};
pub use trade_extraction::extract_trades;
