//option strategies evaluated against the underlying's price path
//every leg is priced once at the entry spot (first point of the series) and
//that premium is held for the whole run; pnl is intrinsic value minus premium,
//not a full mark-to-market
//short legs contribute only their negated payoff, their premium is not
//credited, so the bull call spread is
//[max(p - k_low, 0) - long premium] - max(p - k_high, 0)

use crate::data::{PnlSeries, PriceSeries};
use crate::error::{ensure_positive, EvalError, EvalResult};
use crate::instrument::{LegPosition, MarketParams, OptionParameters, OptionType, StrategyLeg};
use crate::pricing::{self, Greeks};
use crate::strategy::{PnlKind, Strategy};
use serde::{Deserialize, Serialize};

//an option strategy of one or two legs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptionStrategy {
    Single { leg: StrategyLeg },
    Straddle { strike: f64 },
    Strangle { lower_strike: f64, upper_strike: f64 },
    BullCallSpread { lower_strike: f64, upper_strike: f64 },
}

//a leg with its entry premium and greeks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricedLeg {
    pub leg: StrategyLeg,
    pub premium: f64,
    pub greeks: Greeks,
}

impl OptionStrategy {
    //legs in a fixed order: calls before puts, lower strikes first
    pub fn legs(&self) -> EvalResult<Vec<StrategyLeg>> {
        match *self {
            OptionStrategy::Single { leg } => {
                ensure_positive("strike", leg.strike)?;
                Ok(vec![leg])
            }
            OptionStrategy::Straddle { strike } => Ok(vec![
                StrategyLeg::long(strike, OptionType::Call)?,
                StrategyLeg::long(strike, OptionType::Put)?,
            ]),
            OptionStrategy::Strangle {
                lower_strike,
                upper_strike,
            } => {
                ensure_ordered(lower_strike, upper_strike)?;
                Ok(vec![
                    StrategyLeg::long(upper_strike, OptionType::Call)?,
                    StrategyLeg::long(lower_strike, OptionType::Put)?,
                ])
            }
            OptionStrategy::BullCallSpread {
                lower_strike,
                upper_strike,
            } => {
                ensure_ordered(lower_strike, upper_strike)?;
                Ok(vec![
                    StrategyLeg::long(lower_strike, OptionType::Call)?,
                    StrategyLeg::short(upper_strike, OptionType::Call)?,
                ])
            }
        }
    }

    //prices every leg at the given entry spot
    pub fn price_legs(&self, spot: f64, market: &MarketParams) -> EvalResult<Vec<PricedLeg>> {
        market.validate()?;

        self.legs()?
            .into_iter()
            .map(|leg| {
                let params = OptionParameters::from_market(market, spot, leg.strike, leg.option_type)?;
                Ok(PricedLeg {
                    leg,
                    premium: pricing::price(&params)?,
                    greeks: pricing::greeks(&params)?,
                })
            })
            .collect()
    }

    //pnl at one underlying price for already priced legs
    pub fn pnl_at(priced: &[PricedLeg], underlying: f64) -> f64 {
        priced
            .iter()
            .map(|p| p.leg.pnl(underlying, p.premium))
            .sum()
    }

    //premium charged by the pnl formula, the sum of long-leg premiums
    pub fn premium_paid(priced: &[PricedLeg]) -> f64 {
        priced
            .iter()
            .filter(|p| p.leg.position == LegPosition::Long)
            .map(|p| p.premium)
            .sum()
    }

    //net greeks of the whole position at entry
    pub fn position_greeks(priced: &[PricedLeg]) -> Greeks {
        priced.iter().fold(
            Greeks {
                delta: 0.0,
                gamma: 0.0,
                vega: 0.0,
                theta: 0.0,
                rho: 0.0,
            },
            |acc, p| {
                let sign = match p.leg.position {
                    LegPosition::Long => 1.0,
                    LegPosition::Short => -1.0,
                };
                Greeks {
                    delta: acc.delta + sign * p.greeks.delta,
                    gamma: acc.gamma + sign * p.greeks.gamma,
                    vega: acc.vega + sign * p.greeks.vega,
                    theta: acc.theta + sign * p.greeks.theta,
                    rho: acc.rho + sign * p.greeks.rho,
                }
            },
        )
    }
}

fn ensure_ordered(lower_strike: f64, upper_strike: f64) -> EvalResult<()> {
    ensure_positive("lower_strike", lower_strike)?;
    ensure_positive("upper_strike", upper_strike)?;
    if lower_strike >= upper_strike {
        return Err(EvalError::InvalidParameter {
            name: "upper_strike",
            value: upper_strike,
            reason: "must be greater than the lower strike",
        });
    }
    Ok(())
}

impl Strategy for OptionStrategy {
    fn evaluate(&self, series: &PriceSeries, market: &MarketParams) -> EvalResult<PnlSeries> {
        let entry = series
            .first()
            .ok_or(EvalError::InsufficientData {
                required: 1,
                actual: 0,
            })?
            .price;

        let priced = self.price_legs(entry, market)?;

        let values = series
            .points()
            .iter()
            .map(|point| Some(Self::pnl_at(&priced, point.price)))
            .collect();

        PnlSeries::new(series, values)
    }

    fn kind(&self) -> PnlKind {
        PnlKind::Absolute
    }

    fn name(&self) -> &str {
        match self {
            OptionStrategy::Single { .. } => "Single Leg",
            OptionStrategy::Straddle { .. } => "Straddle",
            OptionStrategy::Strangle { .. } => "Strangle",
            OptionStrategy::BullCallSpread { .. } => "Bull Call Spread",
        }
    }
}
