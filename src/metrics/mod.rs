pub mod summary;
pub mod timeseries;

pub use summary::{
    annualized_volatility, cumulative_return, sharpe_ratio, PerformanceReport,
    TRADING_DAYS_PER_YEAR,
};
pub use timeseries::{
    calculate_equity_curve, cumulative_growth, drawdown_series, max_drawdown,
    EquityPoint,
};
