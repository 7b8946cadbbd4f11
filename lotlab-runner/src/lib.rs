//! lotlab runner: run configuration, bar loading, accounting, artifacts, sweeps.
//!
//! This crate builds on `lotlab-core` to provide:
//! - TOML run configuration with content-addressed run IDs
//! - CSV bar loading with column aliases and flexible timestamps
//! - Single-run orchestration with trade extraction and accounting summary
//! - JSON/CSV artifact export with schema versioning
//! - Parallel parameter sweeps over martingale settings

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod sweep;

pub use config::{ConfigError, EngineConfig, RunConfig, RunId};
pub use data_loader::{load_bars, parse_bars, LoadError, LoadedBars};
pub use export::{export_json, import_json, load_artifacts, save_artifacts};
pub use metrics::AccountingSummary;
pub use runner::{run_backtest, run_single_backtest, BacktestResult, RunError, SCHEMA_VERSION};
pub use sweep::{MartingaleGrid, ParamSweep, SweepResults};
