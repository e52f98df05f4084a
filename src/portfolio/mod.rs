pub mod position;
pub mod trades;

pub use position::{OpenPosition, PositionSide};
pub use trades::{ExitReason, RoundTrip, TradeStats};
