//option pricing and strategy evaluation over historical price series

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod instrument;
pub mod metrics;
pub mod portfolio;
pub mod pricing;
pub mod strategy;

//prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{BacktestRules, EvaluationConfig, StrategySpec};
    pub use crate::data::{filter_by_symbol, load_csv, Bar, PnlSeries, PriceField, PriceSeries};
    pub use crate::engine::{
        run_backtest, run_strategy, sweep, sweep_strategies, BacktestResult, EntryCondition,
        EntryRule, ExitRule, RunSettings, StrategyRun, TradeEvent,
    };
    pub use crate::error::{EvalError, EvalResult};
    pub use crate::instrument::{MarketParams, OptionParameters, OptionType, StrategyLeg};
    pub use crate::metrics::{calculate_equity_curve, EquityPoint, PerformanceReport};
    pub use crate::portfolio::{ExitReason, PositionSide, RoundTrip, TradeStats};
    pub use crate::pricing::{greeks, price, Greeks};
    pub use crate::strategy::{
        mean_reversion::MeanReversionStrategy, momentum::MomentumStrategy,
        options::OptionStrategy, rsi_reversion::RsiReversionStrategy, Strategy,
    };
}
