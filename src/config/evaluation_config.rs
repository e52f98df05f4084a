use crate::data::PriceField;
use crate::engine::{EntryCondition, EntryRule, ExitRule, RunSettings};
use crate::instrument::{MarketParams, StrategyLeg};
use crate::portfolio::PositionSide;
use crate::strategy::mean_reversion::MeanReversionStrategy;
use crate::strategy::momentum::MomentumStrategy;
use crate::strategy::options::OptionStrategy;
use crate::strategy::rsi_reversion::RsiReversionStrategy;
use crate::strategy::Strategy;
use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

//strategy and its parameters, tagged by "type" in the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategySpec {
    Momentum {
        window: usize,
    },
    MeanReversion {
        window: usize,
        threshold: f64,
    },
    RsiReversion {
        lookback: usize,
        oversold: f64,
        overbought: f64,
    },
    Single {
        leg: StrategyLeg,
    },
    Straddle {
        strike: f64,
    },
    Strangle {
        lower_strike: f64,
        upper_strike: f64,
    },
    BullCallSpread {
        lower_strike: f64,
        upper_strike: f64,
    },
}

impl StrategySpec {
    //builds the strategy, parameters are checked when it is evaluated
    pub fn build(&self) -> Box<dyn Strategy> {
        match *self {
            StrategySpec::Momentum { window } => Box::new(MomentumStrategy::new(window)),
            StrategySpec::MeanReversion { window, threshold } => {
                Box::new(MeanReversionStrategy::new(window, threshold))
            }
            StrategySpec::RsiReversion {
                lookback,
                oversold,
                overbought,
            } => Box::new(RsiReversionStrategy::new(lookback, oversold, overbought)),
            StrategySpec::Single { leg } => Box::new(OptionStrategy::Single { leg }),
            StrategySpec::Straddle { strike } => Box::new(OptionStrategy::Straddle { strike }),
            StrategySpec::Strangle {
                lower_strike,
                upper_strike,
            } => Box::new(OptionStrategy::Strangle {
                lower_strike,
                upper_strike,
            }),
            StrategySpec::BullCallSpread {
                lower_strike,
                upper_strike,
            } => Box::new(OptionStrategy::BullCallSpread {
                lower_strike,
                upper_strike,
            }),
        }
    }

    //the option strategy behind this entry, None for directional strategies
    pub fn option_strategy(&self) -> Option<OptionStrategy> {
        match *self {
            StrategySpec::Single { leg } => Some(OptionStrategy::Single { leg }),
            StrategySpec::Straddle { strike } => Some(OptionStrategy::Straddle { strike }),
            StrategySpec::Strangle {
                lower_strike,
                upper_strike,
            } => Some(OptionStrategy::Strangle {
                lower_strike,
                upper_strike,
            }),
            StrategySpec::BullCallSpread {
                lower_strike,
                upper_strike,
            } => Some(OptionStrategy::BullCallSpread {
                lower_strike,
                upper_strike,
            }),
            StrategySpec::Momentum { .. }
            | StrategySpec::MeanReversion { .. }
            | StrategySpec::RsiReversion { .. } => None,
        }
    }
}

//stateful backtest rules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestRules {
    pub entry: EntryRule,
    #[serde(default)]
    pub exit: ExitRule,
}

//complete evaluation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    //data
    pub data_path: PathBuf,
    pub symbol: String,
    #[serde(default)]
    pub price_field: PriceField,

    //pricing inputs shared by every option strategy
    #[serde(default)]
    pub market: MarketParams,

    //account settings
    #[serde(default)]
    pub settings: RunSettings,

    //strategies in file order, keyed by display name
    pub strategies: IndexMap<String, StrategySpec>,

    //optional entry/exit simulation
    #[serde(default)]
    pub backtest: Option<BacktestRules>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        let mut strategies = IndexMap::new();
        strategies.insert(
            "straddle".to_string(),
            StrategySpec::Straddle { strike: 150.0 },
        );
        strategies.insert(
            "bull call spread".to_string(),
            StrategySpec::BullCallSpread {
                lower_strike: 140.0,
                upper_strike: 160.0,
            },
        );
        strategies.insert("momentum".to_string(), StrategySpec::Momentum { window: 20 });
        strategies.insert(
            "mean reversion".to_string(),
            StrategySpec::MeanReversion {
                window: 20,
                threshold: 0.02,
            },
        );

        EvaluationConfig {
            data_path: PathBuf::from("data.csv"),
            symbol: "AAPL".to_string(),
            price_field: PriceField::Close,
            market: MarketParams::default(),
            settings: RunSettings::default(),
            strategies,
            backtest: Some(BacktestRules {
                entry: EntryRule::new(EntryCondition::PriceBelow(150.0), PositionSide::Long, 1),
                exit: ExitRule::stop_loss(0.05).with_trailing_stop(0.05),
            }),
        }
    }
}

impl EvaluationConfig {
    //load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config: EvaluationConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    //save configuration to a JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)
            .with_context(|| format!("Failed to write config {:?}", path.as_ref()))?;
        Ok(())
    }

    //checks settings shared by the whole run, strategy parameters are
    //reported per strategy when evaluated
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.strategies.is_empty() && self.backtest.is_none() {
            anyhow::bail!("Config defines no strategies and no backtest");
        }
        self.market.validate().context("Invalid market parameters")?;
        let balance = self.settings.initial_balance;
        if balance <= 0.0 || !balance.is_finite() {
            anyhow::bail!("initial_balance must be positive, got {}", balance);
        }
        if let Some(rules) = &self.backtest {
            rules.entry.validate().context("Invalid entry rule")?;
            rules.exit.validate().context("Invalid exit rule")?;
        }
        Ok(())
    }

    //builds every configured strategy, keeping file order
    pub fn build_strategies(&self) -> Vec<(String, Box<dyn Strategy>)> {
        self.strategies
            .iter()
            .map(|(name, spec)| (name.clone(), spec.build()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::OptionType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_round_trips_through_file() {
        let config = EvaluationConfig::default();
        let file = NamedTempFile::new().unwrap();

        config.to_json_file(file.path()).unwrap();
        let loaded = EvaluationConfig::from_json_file(file.path()).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_parses_handwritten_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{
                "data_path": "prices.csv",
                "symbol": "SPY",
                "price_field": "mid",
                "strategies": {{
                    "wide strangle": {{"type": "strangle", "lower_strike": 90.0, "upper_strike": 110.0}},
                    "short put": {{"type": "single", "leg": {{"strike": 95.0, "position": "short", "option_type": "put"}}}},
                    "rsi": {{"type": "rsi_reversion", "lookback": 14, "oversold": 30.0, "overbought": 70.0}}
                }},
                "backtest": {{
                    "entry": {{"condition": {{"type": "cross_above", "level": 100.0}}, "side": "short", "qty": 2}},
                    "exit": {{"stop_loss_pct": 0.05, "take_profit_pct": 0.1}}
                }}
            }}"#
        )
        .unwrap();

        let config = EvaluationConfig::from_json_file(file.path()).unwrap();

        assert_eq!(config.price_field, PriceField::Mid);
        assert_eq!(config.market, MarketParams::default());
        let names: Vec<&str> = config.strategies.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["wide strangle", "short put", "rsi"]);
        assert_eq!(
            config.strategies["short put"],
            StrategySpec::Single {
                leg: StrategyLeg::short(95.0, OptionType::Put).unwrap()
            }
        );

        let rules = config.backtest.unwrap();
        assert_eq!(rules.entry.condition, EntryCondition::CrossAbove(100.0));
        assert_eq!(rules.entry.side, PositionSide::Short);
        assert_eq!(rules.exit.trailing_stop_pct, None);

        let built = config.build_strategies();
        assert_eq!(built[0].1.name(), "Strangle");
        assert_eq!(built[2].1.name(), "RSI Reversion");
    }

    #[test]
    fn test_option_strategy_only_for_option_entries() {
        let config = EvaluationConfig::default();
        assert_eq!(
            config.strategies["straddle"].option_strategy(),
            Some(OptionStrategy::Straddle { strike: 150.0 })
        );
        assert_eq!(config.strategies["momentum"].option_strategy(), None);
    }

    #[test]
    fn test_rejects_invalid_shared_settings() {
        let mut config = EvaluationConfig::default();
        config.market.volatility = -0.2;
        assert!(config.validate().is_err());

        let mut config = EvaluationConfig::default();
        config.strategies.clear();
        config.backtest = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(EvaluationConfig::from_json_file("/nonexistent/optlab.json").is_err());
    }
}
