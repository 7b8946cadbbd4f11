//! Side: the direction of a signal or an open position.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Short (-1), flat (0), or long (+1).
///
/// Signals and positions share this enumeration. Raw numeric signals are resolved
/// into a `Side` once at ingestion; nothing downstream inspects raw numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Short,
    #[default]
    Flat,
    Long,
}

impl Side {
    /// Resolve a raw numeric signal. Anything other than exactly +1 or -1 is flat.
    pub fn from_signal(value: f64) -> Self {
        if value == 1.0 {
            Side::Long
        } else if value == -1.0 {
            Side::Short
        } else {
            Side::Flat
        }
    }

    /// Sign of a non-zero quantity; zero maps to flat.
    pub fn from_quantity(quantity: f64) -> Self {
        if quantity > 0.0 {
            Side::Long
        } else if quantity < 0.0 {
            Side::Short
        } else {
            Side::Flat
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
            Side::Flat => 0.0,
        }
    }

    pub fn is_flat(self) -> bool {
        self == Side::Flat
    }

    /// The opposite direction. Flat has no opposite and stays flat.
    pub fn reversed(self) -> Self {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
            Side::Flat => Side::Flat,
        }
    }

    /// True when both sides are non-flat and point in different directions.
    pub fn opposes(self, other: Side) -> bool {
        !self.is_flat() && !other.is_flat() && self != other
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Side::Long => 1,
            Side::Short => -1,
            Side::Flat => 0,
        };
        write!(f, "{value}")
    }
}
