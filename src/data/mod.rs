pub mod bar;
pub mod loader;
pub mod series;

pub use bar::{Bar, BarError, PriceField};
pub use loader::{filter_by_symbol, load_csv};
pub use series::{PnlSeries, PricePoint, PriceSeries};
