use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

//direction of a backtest position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    //converts to quantity sign (Long = +1, Short = -1)
    pub fn sign(&self) -> f64 {
        match self {
            PositionSide::Long => 1.0,
            PositionSide::Short => -1.0,
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSide::Long => write!(f, "long"),
            PositionSide::Short => write!(f, "short"),
        }
    }
}

//the single open position held by a backtest run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub side: PositionSide,
    pub qty: u32,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,

    //most favorable price seen since entry
    pub best_price: f64,

    //current trailing exit level, only ever tightens
    pub trailing_stop: Option<f64>,
}

impl OpenPosition {
    //opens a position, arming the trailing stop at entry if one is configured
    pub fn open(
        side: PositionSide,
        qty: u32,
        entry_time: DateTime<Utc>,
        entry_price: f64,
        trailing_pct: Option<f64>,
    ) -> Self {
        let mut position = OpenPosition {
            side,
            qty,
            entry_time,
            entry_price,
            best_price: entry_price,
            trailing_stop: None,
        };
        if let Some(pct) = trailing_pct {
            position.trailing_stop = Some(position.trail_level(entry_price, pct));
        }
        position
    }

    //hard stop level at `pct` adverse move from entry
    pub fn stop_loss_price(&self, pct: f64) -> f64 {
        match self.side {
            PositionSide::Long => self.entry_price * (1.0 - pct),
            PositionSide::Short => self.entry_price * (1.0 + pct),
        }
    }

    //profit target at `pct` favorable move from entry
    pub fn take_profit_price(&self, pct: f64) -> f64 {
        match self.side {
            PositionSide::Long => self.entry_price * (1.0 + pct),
            PositionSide::Short => self.entry_price * (1.0 - pct),
        }
    }

    //true when price is at or beyond `level` on the losing side
    pub fn is_breached(&self, price: f64, level: f64) -> bool {
        match self.side {
            PositionSide::Long => price <= level,
            PositionSide::Short => price >= level,
        }
    }

    //true when price is at or beyond `level` on the winning side
    pub fn is_reached(&self, price: f64, level: f64) -> bool {
        match self.side {
            PositionSide::Long => price >= level,
            PositionSide::Short => price <= level,
        }
    }

    //moves the trailing level with a favorable price, never loosens it
    pub fn ratchet(&mut self, price: f64, trailing_pct: f64) {
        let favorable = match self.side {
            PositionSide::Long => price > self.best_price,
            PositionSide::Short => price < self.best_price,
        };
        if favorable {
            self.best_price = price;
        }

        let candidate = self.trail_level(self.best_price, trailing_pct);
        self.trailing_stop = Some(match (self.side, self.trailing_stop) {
            (PositionSide::Long, Some(level)) => level.max(candidate),
            (PositionSide::Short, Some(level)) => level.min(candidate),
            (_, None) => candidate,
        });
    }

    //pnl of the position if closed at `price`
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.side.sign() * self.qty as f64
    }

    fn trail_level(&self, reference: f64, pct: f64) -> f64 {
        match self.side {
            PositionSide::Long => reference * (1.0 - pct),
            PositionSide::Short => reference * (1.0 + pct),
        }
    }
}
