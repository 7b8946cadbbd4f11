//! Artifact export: JSON and CSV files for a finished run.
//!
//! A run directory holds:
//! - `result.json`: the full `BacktestResult`, schema-versioned
//! - `fills.csv`: the martingale fill ledger (header only for the signal engine)
//! - `trades.csv`: round-trip trades
//! - `bars.csv`: input bars joined with per-bar output and equity
//!
//! Unknown (newer) schema versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, ensure, Context, Result};
use chrono::NaiveDateTime;

use lotlab_core::domain::{Bar, Fill, Trade};

use crate::runner::{BacktestResult, SCHEMA_VERSION};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the fill ledger.
///
/// Columns: timestamp, action, price, resulting_position, note
pub fn export_fills_csv(fills: &[Fill]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "action", "price", "resulting_position", "note"])?;
    for f in fills {
        wtr.write_record([
            &format_ts(&f.timestamp),
            &f.action.to_string(),
            &f.price.to_string(),
            &f.resulting_position.to_string(),
            &f.note.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export round-trip trades.
///
/// Columns: entry_time, exit_time, direction, realized_pnl
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["entry_time", "exit_time", "direction", "realized_pnl"])?;
    for t in trades {
        wtr.write_record([
            &format_ts(&t.entry_time),
            &format_ts(&t.exit_time),
            &t.direction.to_string(),
            &t.realized_pnl.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export input bars joined with engine output and the equity curve.
///
/// Columns: timestamp, close, signal, position, pnl, closed, equity.
/// Missing closes and signals are written as empty cells.
pub fn export_bars_csv(bars: &[Bar], result: &BacktestResult) -> Result<String> {
    ensure!(
        bars.len() == result.outputs.len() && bars.len() == result.equity_curve.len(),
        "bar count {} does not match result ({} outputs, {} equity points)",
        bars.len(),
        result.outputs.len(),
        result.equity_curve.len()
    );

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "timestamp",
        "close",
        "signal",
        "position",
        "pnl",
        "closed",
        "equity",
    ])?;
    for ((bar, out), equity) in bars.iter().zip(&result.outputs).zip(&result.equity_curve) {
        wtr.write_record([
            format_ts(&bar.timestamp),
            bar.close.map(|c| c.to_string()).unwrap_or_default(),
            bar.signal.map(|s| s.to_string()).unwrap_or_default(),
            out.position.to_string(),
            out.pnl.to_string(),
            out.closed.to_string(),
            format!("{equity:.2}"),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single run.
///
/// Creates a directory named `{engine}_{run_id prefix}/` under `output_dir`.
/// Re-running the same config on the same data overwrites the same directory.
///
/// Returns the path to the created directory.
pub fn save_artifacts(
    result: &BacktestResult,
    bars: &[Bar],
    output_dir: &Path,
) -> Result<PathBuf> {
    let prefix = result.run_id.get(..12).unwrap_or(&result.run_id);
    let run_dir = output_dir.join(format!("{}_{}", result.engine, prefix));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write_file(&run_dir.join("result.json"), &export_json(result)?)?;
    write_file(&run_dir.join("fills.csv"), &export_fills_csv(&result.fills)?)?;
    write_file(&run_dir.join("trades.csv"), &export_trades_csv(&result.trades)?)?;
    write_file(&run_dir.join("bars.csv"), &export_bars_csv(bars, result)?)?;

    tracing::info!(dir = %run_dir.display(), "artifacts written");
    Ok(run_dir)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

/// Load a `BacktestResult` from an artifact directory's result.json.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
