use super::side::Side;
use serde::{Deserialize, Serialize};

/// Position held by an engine during a single run.
///
/// Fields are private so the invariant holds by construction:
/// `lot > 0` iff `side` is not flat iff `entry_price` is present.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PositionState {
    side: Side,
    lot: f64,
    entry_price: Option<f64>,
}

impl PositionState {
    pub fn flat() -> Self {
        Self::default()
    }

    /// Open `lot` units on `side` at `price`. A flat side or a non-positive lot
    /// yields a flat state.
    pub fn open(side: Side, lot: f64, price: f64) -> Self {
        if side.is_flat() || lot <= 0.0 {
            return Self::flat();
        }
        Self {
            side,
            lot,
            entry_price: Some(price),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn lot(&self) -> f64 {
        self.lot
    }

    pub fn entry_price(&self) -> Option<f64> {
        self.entry_price
    }

    pub fn is_flat(&self) -> bool {
        self.side.is_flat()
    }

    /// Signed exposure: side times lot.
    pub fn exposure(&self) -> f64 {
        self.side.sign() * self.lot
    }

    /// Favorable excursion of `price` from the entry, in price units.
    /// Negative when the position is underwater; zero when flat.
    pub fn excursion(&self, price: f64) -> f64 {
        match self.entry_price {
            Some(entry) => (price - entry) * self.side.sign(),
            None => 0.0,
        }
    }

    /// Scale the lot by `multiplier` and re-anchor the entry at `price`.
    ///
    /// A zero lot restarts at `base_lot`. A flat state is returned unchanged.
    pub fn scaled(self, multiplier: f64, base_lot: f64, price: f64) -> Self {
        if self.is_flat() {
            return self;
        }
        let lot = if self.lot > 0.0 {
            self.lot * multiplier
        } else {
            base_lot
        };
        Self::open(self.side, lot, price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_state_has_no_entry() {
        let state = PositionState::flat();
        assert!(state.is_flat());
        assert_eq!(state.lot(), 0.0);
        assert_eq!(state.entry_price(), None);
        assert_eq!(state.exposure(), 0.0);
    }

    #[test]
    fn open_with_flat_side_stays_flat() {
        assert_eq!(PositionState::open(Side::Flat, 1.0, 100.0), PositionState::flat());
        assert_eq!(PositionState::open(Side::Long, 0.0, 100.0), PositionState::flat());
    }

    #[test]
    fn short_exposure_is_negative() {
        let state = PositionState::open(Side::Short, 2.5, 100.0);
        assert_eq!(state.exposure(), -2.5);
        assert_eq!(state.excursion(96.0), 4.0);
        assert_eq!(state.excursion(103.0), -3.0);
    }

    #[test]
    fn scaled_multiplies_and_reanchors() {
        let state = PositionState::open(Side::Long, 1.5, 100.0).scaled(2.0, 1.5, 90.0);
        assert_eq!(state.side(), Side::Long);
        assert_eq!(state.lot(), 3.0);
        assert_eq!(state.entry_price(), Some(90.0));
    }

    #[test]
    fn scaled_flat_is_noop() {
        let state = PositionState::flat().scaled(2.0, 1.0, 90.0);
        assert!(state.is_flat());
    }
}
