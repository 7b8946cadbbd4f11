//! Conversion from upstream rows to domain bars.
//!
//! Raw rows carry loosely-typed optional fields. This module resolves them once,
//! before any engine runs: prices become `Option<f64>` (non-finite → missing) and
//! numeric signals become `Option<Side>`.

use crate::domain::{Bar, RawBar, Side};
use crate::engine::error::EngineError;

/// Convert a single `RawBar` into a domain `Bar`.
///
/// The timestamp is the only required field.
pub fn raw_to_bar(raw: &RawBar) -> Result<Bar, EngineError> {
    let timestamp = raw
        .timestamp
        .ok_or_else(|| EngineError::DataShape("bar is missing its timestamp".into()))?;
    Ok(Bar {
        timestamp,
        close: raw.close.filter(|c| c.is_finite()),
        signal: raw.signal.filter(|s| !s.is_nan()).map(Side::from_signal),
    })
}

/// Convert a full table of raw rows, checking ordering.
pub fn ingest(raw: &[RawBar]) -> Result<Vec<Bar>, EngineError> {
    let bars = raw
        .iter()
        .enumerate()
        .map(|(i, r)| {
            raw_to_bar(r).map_err(|e| match e {
                EngineError::DataShape(msg) => EngineError::DataShape(format!("row {i}: {msg}")),
                other => other,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    validate_bars(&bars)?;
    Ok(bars)
}

/// Timestamps must be strictly increasing: no duplicates, no reordering.
pub fn validate_bars(bars: &[Bar]) -> Result<(), EngineError> {
    for (i, pair) in bars.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(EngineError::DataShape(format!(
                "timestamps must be strictly increasing: row {} ({}) follows row {} ({})",
                i + 1,
                pair[1].timestamp,
                i,
                pair[0].timestamp
            )));
        }
    }
    Ok(())
}
