//! Integration tests for the runner: both engines on a frozen minute-bar fixture.
//!
//! Uses the XAUUSD 1-minute fixture (120 bars, one missing close) to verify
//! loading, trade extraction, accounting, artifacts, and sweeps end to end.

use std::path::{Path, PathBuf};

use lotlab_core::engine::{ExecutionConfig, MartingaleConfig};
use lotlab_runner::config::{EngineConfig, RunConfig};
use lotlab_runner::data_loader::load_bars;
use lotlab_runner::export::{load_artifacts, save_artifacts};
use lotlab_runner::runner::{run_backtest, run_single_backtest, RunError};
use lotlab_runner::sweep::{MartingaleGrid, ParamSweep};
use lotlab_runner::LoadError;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/xauusd_1m.csv")
}

fn write_config(dir: &Path, toml: &str) -> PathBuf {
    let path = dir.join("run.toml");
    std::fs::write(&path, toml).unwrap();
    path
}

fn martingale_toml() -> &'static str {
    r#"
starting_equity = 1000.0

[engine]
type = "martingale"
base_lot = 1.0
multiplier = 2.0
step = 10.0
take_profit = 15.0
reverse_signals = true
close_on_flip = false
"#
}

fn assert_conserved(result: &lotlab_runner::BacktestResult) {
    let trade_total: f64 = result.trades.iter().map(|t| t.realized_pnl).sum();
    let magnitude: f64 = result.outputs.iter().map(|o| o.pnl.abs()).sum();
    assert!(
        (trade_total - result.total_pnl()).abs() <= 1e-9 * (1.0 + magnitude),
        "trades {trade_total} vs bars {}",
        result.total_pnl()
    );
    assert_eq!(result.outputs.last().unwrap().position, 0.0);
}

#[test]
fn fixture_loads_with_one_void_bar() {
    let loaded = load_bars(&fixture()).unwrap();
    assert_eq!(loaded.bars.len(), 120);
    assert_eq!(loaded.void_bars, 1);
    assert_eq!(loaded.missing_signals, 0);
    assert!(loaded.bars[57].close.is_none());

    // Same bytes, same hash.
    let again = load_bars(&fixture()).unwrap();
    assert_eq!(loaded.dataset_hash, again.dataset_hash);
}

#[test]
fn martingale_from_toml_runs_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig::from_file(&write_config(dir.path(), martingale_toml())).unwrap();

    let result = run_single_backtest(&fixture(), &config).unwrap();
    assert_eq!(result.engine, "martingale");
    assert_eq!(result.bar_count, 120);
    assert!(result.dataset_hash.is_some());
    assert!(!result.fills.is_empty());
    assert!(!result.trades.is_empty());
    assert_eq!(result.summary.trade_count, result.trades.len());
    assert_eq!(result.summary.fill_count, result.fills.len());
    assert_eq!(
        *result.equity_curve.last().unwrap(),
        result.summary.ending_equity
    );
    assert_conserved(&result);
}

#[test]
fn signal_engine_runs_end_to_end() {
    let config = RunConfig {
        starting_equity: 1000.0,
        engine: EngineConfig::Signals(ExecutionConfig::default()),
    };
    let result = run_single_backtest(&fixture(), &config).unwrap();
    assert!(result.fills.is_empty());
    assert!(!result.trades.is_empty());
    assert!(result.summary.max_exposure <= 1.0);
    assert_conserved(&result);
}

#[test]
fn runs_are_deterministic() {
    let bars = load_bars(&fixture()).unwrap().bars;
    let config = RunConfig::from_toml(martingale_toml()).unwrap();
    let a = run_backtest(&bars, &config).unwrap();
    let b = run_backtest(&bars, &config).unwrap();
    assert_eq!(a, b);
}

#[test]
fn artifacts_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = load_bars(&fixture()).unwrap();
    let config = RunConfig::from_toml(martingale_toml()).unwrap();
    let result = run_backtest(&loaded.bars, &config).unwrap();

    let run_dir = save_artifacts(&result, &loaded.bars, dir.path()).unwrap();

    let fills = std::fs::read_to_string(run_dir.join("fills.csv")).unwrap();
    assert_eq!(fills.lines().count(), result.fills.len() + 1);
    let trades = std::fs::read_to_string(run_dir.join("trades.csv")).unwrap();
    assert_eq!(trades.lines().count(), result.trades.len() + 1);
    let bars = std::fs::read_to_string(run_dir.join("bars.csv")).unwrap();
    assert_eq!(bars.lines().count(), 121);
    // The void bar keeps its row with an empty close.
    assert!(bars.lines().nth(58).unwrap().starts_with("2025-08-19 15:57:00,,"));

    let restored = load_artifacts(&run_dir).unwrap();
    assert_eq!(restored.run_id, result.run_id);
    assert_eq!(restored.trades, result.trades);
    assert_eq!(restored.fills, result.fills);
}

#[test]
fn missing_bar_file_is_data_error() {
    let err = run_single_backtest(Path::new("/nonexistent/bars.csv"), &RunConfig::default())
        .unwrap_err();
    assert!(matches!(err, RunError::Data(LoadError::Io { .. })));
}

#[test]
fn invalid_toml_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[engine]\ntype = \"martingale\"\nmultiplier = -2.0\n");
    let config = RunConfig::from_file(&path).unwrap();
    let err = run_single_backtest(&fixture(), &config).unwrap_err();
    assert!(matches!(err, RunError::Config(_)));
}

#[test]
fn sweep_over_fixture_ranks_results() {
    let bars = load_bars(&fixture()).unwrap().bars;
    let base = RunConfig::from_toml(martingale_toml()).unwrap();
    let grid = MartingaleGrid {
        base_lots: vec![1.0],
        multipliers: vec![1.5, 2.0],
        steps: vec![5.0, 10.0, 20.0],
        take_profits: vec![5.0, 15.0],
    };

    let results = ParamSweep::new().sweep(&bars, &grid, &base).unwrap();
    assert_eq!(results.len(), 12);
    for result in results.all() {
        assert_conserved(result);
    }

    let top = results.top_n(3);
    assert_eq!(top.len(), 3);
    assert!(top[0].total_pnl() >= top[2].total_pnl());

    // A grid point equal to the base config reproduces the single run.
    let single = run_backtest(
        &bars,
        &RunConfig {
            engine: EngineConfig::Martingale(MartingaleConfig {
                multiplier: 2.0,
                step: 10.0,
                take_profit: 15.0,
                base_lot: 1.0,
                reverse_signals: true,
                close_on_flip: false,
            }),
            ..base.clone()
        },
    )
    .unwrap();
    let swept = results.get(&single.run_id).unwrap();
    assert_eq!(swept.total_pnl(), single.total_pnl());
}
