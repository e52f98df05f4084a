use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum BarError {
    #[error("Invalid OHLC values: high ({high}) < low ({low})")]
    InvalidHighLow { high: f64, low: f64 },
    #[error("Invalid OHLC values: close ({close}) outside high-low range [{low}, {high}]")]
    InvalidClose { close: f64, high: f64, low: f64 },
    #[error("Invalid OHLC values: open ({open}) outside high-low range [{low}, {high}]")]
    InvalidOpen { open: f64, high: f64, low: f64 },
    #[error("Non-positive price: low ({0}) must be above zero")]
    NonPositivePrice(f64),
    #[error("Negative volume: {0}")]
    NegativeVolume(f64),
}

//which price of a bar feeds the price series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    #[default]
    Close,
    Mid,
    Typical,
}

//represents a single ohlcv bar (candlestick) of market data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub symbol: String,
}

impl Bar {
    //creates a new Bar with validation
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        symbol: String,
    ) -> Result<Self, BarError> {
        if low <= 0.0 || low.is_nan() {
            return Err(BarError::NonPositivePrice(low));
        }

        if high < low {
            return Err(BarError::InvalidHighLow { high, low });
        }

        if close < low || close > high {
            return Err(BarError::InvalidClose { close, high, low });
        }

        if open < low || open > high {
            return Err(BarError::InvalidOpen { open, high, low });
        }

        if volume < 0.0 {
            return Err(BarError::NegativeVolume(volume));
        }

        Ok(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            symbol,
        })
    }

    //returns the typical price (HLC/3)
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    //returns the mid price ((high + low) / 2)
    pub fn mid_price(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    //returns the price selected by field
    pub fn price(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Close => self.close,
            PriceField::Mid => self.mid_price(),
            PriceField::Typical => self.typical_price(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 3, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_bar_validation() {
        let err = Bar::new(ts(), 10.0, 9.0, 11.0, 10.0, 100.0, "SPY".into()).unwrap_err();
        assert_eq!(err, BarError::InvalidHighLow { high: 9.0, low: 11.0 });

        let err = Bar::new(ts(), 10.0, 12.0, 9.0, 13.0, 100.0, "SPY".into()).unwrap_err();
        assert!(matches!(err, BarError::InvalidClose { .. }));

        let err = Bar::new(ts(), 10.0, 12.0, 9.0, 11.0, -1.0, "SPY".into()).unwrap_err();
        assert_eq!(err, BarError::NegativeVolume(-1.0));

        let err = Bar::new(ts(), 1.0, 2.0, 0.0, 1.0, 100.0, "SPY".into()).unwrap_err();
        assert_eq!(err, BarError::NonPositivePrice(0.0));
    }

    #[test]
    fn test_price_fields() {
        let bar = Bar::new(ts(), 10.0, 12.0, 8.0, 11.0, 100.0, "SPY".into()).unwrap();
        assert_eq!(bar.price(PriceField::Close), 11.0);
        assert_eq!(bar.price(PriceField::Mid), 10.0);
        assert!((bar.price(PriceField::Typical) - 31.0 / 3.0).abs() < 1e-12);
    }
}
