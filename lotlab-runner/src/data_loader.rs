//! Bar loading from CSV.
//!
//! Reads a headered CSV with a timestamp, a close, and a signal column into
//! validated bars. Column names are matched case-insensitively, and the
//! timestamp column may be called `timestamp`, `datetime`, or `date`.
//!
//! Cell handling:
//! - empty or unparsable close → missing price (the bar is skipped by engines)
//! - empty or unparsable signal → missing signal (reads as flat)
//! - empty timestamp → data shape error
//! - non-empty timestamp in no known format → `LoadError::Timestamp`

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

use lotlab_core::domain::{Bar, RawBar};
use lotlab_core::engine::{ingest, EngineError};

const TIMESTAMP_ALIASES: &[&str] = &["timestamp", "datetime", "date"];
const CLOSE_ALIASES: &[&str] = &["close"];
const SIGNAL_ALIASES: &[&str] = &["signal"];

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}: unrecognized timestamp '{value}'")]
    Timestamp { row: usize, value: String },

    #[error(transparent)]
    Shape(#[from] EngineError),
}

/// Result of loading bars, with provenance.
#[derive(Debug, Clone)]
pub struct LoadedBars {
    pub bars: Vec<Bar>,
    /// BLAKE3 over the raw file bytes.
    pub dataset_hash: String,
    /// Bars without a usable close.
    pub void_bars: usize,
    /// Bars without a signal value.
    pub missing_signals: usize,
}

/// Load bars from a CSV file.
pub fn load_bars(path: &Path) -> Result<LoadedBars, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let loaded = parse_bars(&bytes)?;

    if loaded.void_bars > 0 {
        tracing::warn!(
            path = %path.display(),
            void_bars = loaded.void_bars,
            "bars without a usable close will be skipped"
        );
    }
    tracing::debug!(
        path = %path.display(),
        bars = loaded.bars.len(),
        missing_signals = loaded.missing_signals,
        "loaded bar file"
    );

    Ok(loaded)
}

/// Parse bars from in-memory CSV bytes.
pub fn parse_bars(bytes: &[u8]) -> Result<LoadedBars, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    let ts_col = find_column(&headers, TIMESTAMP_ALIASES)
        .ok_or(LoadError::MissingColumn("timestamp"))?;
    let close_col =
        find_column(&headers, CLOSE_ALIASES).ok_or(LoadError::MissingColumn("close"))?;
    let signal_col = find_column(&headers, SIGNAL_ALIASES);

    let mut raw = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let timestamp = match record.get(ts_col).filter(|s| !s.is_empty()) {
            Some(value) => Some(parse_timestamp(value).ok_or_else(|| LoadError::Timestamp {
                row,
                value: value.to_string(),
            })?),
            None => None,
        };
        raw.push(RawBar {
            timestamp,
            close: record.get(close_col).and_then(parse_number),
            signal: signal_col.and_then(|c| record.get(c)).and_then(parse_number),
        });
    }

    let missing_signals = raw
        .iter()
        .filter(|r| !r.signal.is_some_and(|s| !s.is_nan()))
        .count();
    let bars = ingest(&raw)?;
    let void_bars = bars.iter().filter(|b| b.is_void()).count();

    Ok(LoadedBars {
        bars,
        dataset_hash: blake3::hash(bytes).to_hex().to_string(),
        void_bars,
        missing_signals,
    })
}

fn find_column(headers: &csv::StringRecord, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|alias| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').eq_ignore_ascii_case(alias))
    })
}

fn parse_number(cell: &str) -> Option<f64> {
    if cell.is_empty() {
        return None;
    }
    cell.parse::<f64>().ok()
}

/// Parse a timestamp cell. Offset-bearing values are normalised to UTC; naive
/// values are taken as-is.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%.f%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.naive_utc());
        }
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
