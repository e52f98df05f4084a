pub mod option_contract;

pub use option_contract::{LegPosition, MarketParams, OptionParameters, OptionType, StrategyLeg};
