//! Bar: one timestamped close with the upstream signal attached.

use super::side::Side;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Raw row from an upstream table, before shape validation.
///
/// Every field is optional so that ingestion, not the reader, decides what a
/// missing value means.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBar {
    pub timestamp: Option<NaiveDateTime>,
    pub close: Option<f64>,
    pub signal: Option<f64>,
}

/// A validated input bar.
///
/// `close` is `None` for missing or non-finite prices; such bars are skipped by the
/// engines. `signal` is `None` when the upstream stage produced nothing for the bar
/// and reads as flat through [`Bar::side`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub close: Option<f64>,
    pub signal: Option<Side>,
}

impl Bar {
    pub fn new(timestamp: NaiveDateTime, close: f64, signal: Side) -> Self {
        Self {
            timestamp,
            close: Some(close).filter(|c| c.is_finite()),
            signal: Some(signal),
        }
    }

    /// The directive for this bar, with a missing signal read as flat.
    pub fn side(&self) -> Side {
        self.signal.unwrap_or(Side::Flat)
    }

    /// Returns true if the bar carries no usable price.
    pub fn is_void(&self) -> bool {
        self.close.is_none()
    }
}
