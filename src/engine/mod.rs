pub mod backtest;
pub mod evaluator;
pub mod rules;

pub use backtest::{run_backtest, BacktestEngine, BacktestResult, RunState, TradeAction, TradeEvent};
pub use evaluator::{run_strategy, sweep, sweep_strategies, RunSettings, StrategyRun, SweepOutcome};
pub use rules::{EntryCondition, EntryRule, ExitRule};
