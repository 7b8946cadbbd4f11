//! Domain types for lotlab

pub mod bar;
pub mod fill;
pub mod output;
pub mod position;
pub mod side;
pub mod trade;

pub use bar::{Bar, RawBar};
pub use fill::{Fill, FillAction, FillNote};
pub use output::BarOutput;
pub use position::PositionState;
pub use side::Side;
pub use trade::{Direction, Trade};
