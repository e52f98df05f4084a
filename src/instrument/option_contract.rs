use crate::error::{ensure_finite, ensure_positive, EvalError, EvalResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//european option type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    //parse option type from string, anything but call/put is rejected
    pub fn parse(s: &str) -> EvalResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "call" | "c" => Ok(OptionType::Call),
            "put" | "p" => Ok(OptionType::Put),
            _ => Err(EvalError::InvalidOptionType(s.to_string())),
        }
    }

    //intrinsic value at the given underlying price
    pub fn payoff(&self, underlying: f64, strike: f64) -> f64 {
        match self {
            OptionType::Call => (underlying - strike).max(0.0),
            OptionType::Put => (strike - underlying).max(0.0),
        }
    }
}

impl FromStr for OptionType {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OptionType::parse(s)
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "call"),
            OptionType::Put => write!(f, "put"),
        }
    }
}

//direction of a strategy leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegPosition {
    Long,
    Short,
}

impl fmt::Display for LegPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegPosition::Long => write!(f, "long"),
            LegPosition::Short => write!(f, "short"),
        }
    }
}

//market inputs shared by every leg of a strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketParams {
    //time to expiry in years
    pub time_to_expiry: f64,
    pub risk_free_rate: f64,
    pub volatility: f64,
}

impl Default for MarketParams {
    fn default() -> Self {
        MarketParams {
            time_to_expiry: 0.1,
            risk_free_rate: 0.01,
            volatility: 0.2,
        }
    }
}

impl MarketParams {
    pub fn new(time_to_expiry: f64, risk_free_rate: f64, volatility: f64) -> EvalResult<Self> {
        let params = MarketParams {
            time_to_expiry,
            risk_free_rate,
            volatility,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> EvalResult<()> {
        ensure_positive("time_to_expiry", self.time_to_expiry)?;
        ensure_finite("risk_free_rate", self.risk_free_rate)?;
        ensure_positive("volatility", self.volatility)?;
        Ok(())
    }
}

//inputs of the black-scholes model for one option
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionParameters {
    pub spot: f64,
    pub strike: f64,
    //time to expiry in years
    pub time_to_expiry: f64,
    pub risk_free_rate: f64,
    pub volatility: f64,
    pub option_type: OptionType,
}

impl OptionParameters {
    pub fn new(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        risk_free_rate: f64,
        volatility: f64,
        option_type: OptionType,
    ) -> EvalResult<Self> {
        let params = OptionParameters {
            spot,
            strike,
            time_to_expiry,
            risk_free_rate,
            volatility,
            option_type,
        };
        params.validate()?;
        Ok(params)
    }

    //combines shared market inputs with a single contract
    pub fn from_market(
        market: &MarketParams,
        spot: f64,
        strike: f64,
        option_type: OptionType,
    ) -> EvalResult<Self> {
        Self::new(
            spot,
            strike,
            market.time_to_expiry,
            market.risk_free_rate,
            market.volatility,
            option_type,
        )
    }

    //checks every input that ends up in a logarithm or denominator
    pub fn validate(&self) -> EvalResult<()> {
        ensure_positive("spot", self.spot)?;
        ensure_positive("strike", self.strike)?;
        ensure_positive("time_to_expiry", self.time_to_expiry)?;
        ensure_finite("risk_free_rate", self.risk_free_rate)?;
        ensure_positive("volatility", self.volatility)?;
        Ok(())
    }

    //same contract with a different option type
    pub fn with_type(&self, option_type: OptionType) -> Self {
        OptionParameters {
            option_type,
            ..*self
        }
    }
}

//one leg of a multi-leg option strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyLeg {
    pub strike: f64,
    pub position: LegPosition,
    pub option_type: OptionType,
}

impl StrategyLeg {
    pub fn new(strike: f64, position: LegPosition, option_type: OptionType) -> EvalResult<Self> {
        ensure_positive("strike", strike)?;
        Ok(StrategyLeg {
            strike,
            position,
            option_type,
        })
    }

    pub fn long(strike: f64, option_type: OptionType) -> EvalResult<Self> {
        Self::new(strike, LegPosition::Long, option_type)
    }

    pub fn short(strike: f64, option_type: OptionType) -> EvalResult<Self> {
        Self::new(strike, LegPosition::Short, option_type)
    }

    //p&l of the leg at `underlying` given the premium priced at entry
    //a short leg's premium is not credited here, its p&l is only the negated payoff
    pub fn pnl(&self, underlying: f64, premium: f64) -> f64 {
        let payoff = self.option_type.payoff(underlying, self.strike);
        match self.position {
            LegPosition::Long => payoff - premium,
            LegPosition::Short => -payoff,
        }
    }
}

impl fmt::Display for StrategyLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} @ {}", self.position, self.option_type, self.strike)
    }
}
