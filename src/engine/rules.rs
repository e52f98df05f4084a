use crate::error::{EvalError, EvalResult};
use crate::portfolio::PositionSide;
use serde::{Deserialize, Serialize};

//condition that opens a position when flat
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "level", rename_all = "snake_case")]
pub enum EntryCondition {
    //fires on every step the price is below the level
    PriceBelow(f64),
    //fires on every step the price is above the level
    PriceAbove(f64),
    //fires only on the step the price moves from >= level to < level
    CrossBelow(f64),
    //fires only on the step the price moves from <= level to > level
    CrossAbove(f64),
}

impl EntryCondition {
    pub fn level(&self) -> f64 {
        match *self {
            EntryCondition::PriceBelow(level)
            | EntryCondition::PriceAbove(level)
            | EntryCondition::CrossBelow(level)
            | EntryCondition::CrossAbove(level) => level,
        }
    }

    //evaluates the condition at `price`, `previous` is the prior step's price
    pub fn fires(&self, previous: Option<f64>, price: f64) -> bool {
        match *self {
            EntryCondition::PriceBelow(level) => price < level,
            EntryCondition::PriceAbove(level) => price > level,
            EntryCondition::CrossBelow(level) => {
                matches!(previous, Some(prev) if prev >= level) && price < level
            }
            EntryCondition::CrossAbove(level) => {
                matches!(previous, Some(prev) if prev <= level) && price > level
            }
        }
    }
}

//when and how to open a position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntryRule {
    pub condition: EntryCondition,
    pub side: PositionSide,
    pub qty: u32,
}

impl EntryRule {
    pub fn new(condition: EntryCondition, side: PositionSide, qty: u32) -> Self {
        EntryRule {
            condition,
            side,
            qty,
        }
    }

    pub fn validate(&self) -> EvalResult<()> {
        let level = self.condition.level();
        if !level.is_finite() || level <= 0.0 {
            return Err(EvalError::InvalidParameter {
                name: "entry_level",
                value: level,
                reason: "must be finite and strictly positive",
            });
        }
        if self.qty == 0 {
            return Err(EvalError::InvalidParameter {
                name: "qty",
                value: 0.0,
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

//exit thresholds as fractions of the entry (or best) price
//checked in order: hard stop-loss, trailing stop, take-profit
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExitRule {
    pub stop_loss_pct: Option<f64>,
    pub trailing_stop_pct: Option<f64>,
    pub take_profit_pct: Option<f64>,
}

impl ExitRule {
    pub fn stop_loss(pct: f64) -> Self {
        ExitRule {
            stop_loss_pct: Some(pct),
            ..Default::default()
        }
    }

    pub fn with_trailing_stop(mut self, pct: f64) -> Self {
        self.trailing_stop_pct = Some(pct);
        self
    }

    pub fn with_take_profit(mut self, pct: f64) -> Self {
        self.take_profit_pct = Some(pct);
        self
    }

    pub fn validate(&self) -> EvalResult<()> {
        check_fraction("stop_loss_pct", self.stop_loss_pct)?;
        check_fraction("trailing_stop_pct", self.trailing_stop_pct)?;
        if let Some(pct) = self.take_profit_pct {
            if !pct.is_finite() || pct <= 0.0 {
                return Err(EvalError::InvalidParameter {
                    name: "take_profit_pct",
                    value: pct,
                    reason: "must be finite and strictly positive",
                });
            }
        }
        Ok(())
    }
}

fn check_fraction(name: &'static str, pct: Option<f64>) -> EvalResult<()> {
    match pct {
        Some(pct) if !(pct > 0.0 && pct < 1.0) => Err(EvalError::InvalidParameter {
            name,
            value: pct,
            reason: "must lie strictly between 0 and 1",
        }),
        _ => Ok(()),
    }
}
