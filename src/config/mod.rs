pub mod evaluation_config;

pub use evaluation_config::{BacktestRules, EvaluationConfig, StrategySpec};
