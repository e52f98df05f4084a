use crate::data::{PnlSeries, PriceSeries};
use crate::error::{EvalError, EvalResult};
use crate::instrument::MarketParams;
use crate::strategy::{ensure_warmup, lagged_signal_pnl, rsi, PnlKind, Signal, Strategy};
use serde::{Deserialize, Serialize};

//rsi mean reversion strategy
//long when rsi drops below the oversold threshold
//short when rsi rises above the overbought threshold, flat otherwise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsiReversionStrategy {
    lookback: usize,
    oversold: f64,
    overbought: f64,
}

impl RsiReversionStrategy {
    pub fn new(lookback: usize, oversold: f64, overbought: f64) -> Self {
        RsiReversionStrategy {
            lookback,
            oversold,
            overbought,
        }
    }

    fn validate(&self) -> EvalResult<()> {
        if self.lookback == 0 {
            return Err(EvalError::InvalidParameter {
                name: "lookback",
                value: 0.0,
                reason: "must be at least 1",
            });
        }
        if !(0.0..=100.0).contains(&self.oversold) {
            return Err(EvalError::InvalidParameter {
                name: "oversold",
                value: self.oversold,
                reason: "must lie in [0, 100]",
            });
        }
        if !(0.0..=100.0).contains(&self.overbought) || self.overbought <= self.oversold {
            return Err(EvalError::InvalidParameter {
                name: "overbought",
                value: self.overbought,
                reason: "must lie in [0, 100] above the oversold level",
            });
        }
        Ok(())
    }

    //rsi for each index, None until lookback + 1 prices are available
    pub fn rsi_values(&self, series: &PriceSeries) -> EvalResult<Vec<Option<f64>>> {
        self.validate()?;
        let prices = series.prices();
        Ok((0..prices.len())
            .map(|i| rsi(&prices[..=i], self.lookback))
            .collect())
    }

    pub fn signals(&self, series: &PriceSeries) -> EvalResult<Vec<Option<Signal>>> {
        Ok(self
            .rsi_values(series)?
            .into_iter()
            .map(|value| {
                value.map(|v| {
                    if v < self.oversold {
                        Signal::Long
                    } else if v > self.overbought {
                        Signal::Short
                    } else {
                        Signal::Flat
                    }
                })
            })
            .collect())
    }
}

impl Default for RsiReversionStrategy {
    fn default() -> Self {
        Self::new(14, 30.0, 70.0)
    }
}

impl Strategy for RsiReversionStrategy {
    fn evaluate(&self, series: &PriceSeries, _market: &MarketParams) -> EvalResult<PnlSeries> {
        let signals = self.signals(series)?;
        ensure_warmup(series, self.lookback + 1)?;
        lagged_signal_pnl(series, &signals)
    }

    fn kind(&self) -> PnlKind {
        PnlKind::Returns
    }

    fn name(&self) -> &str {
        "RSI Reversion"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{DateTime, TimeZone, Utc};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_overbought_goes_short() {
        let series = PriceSeries::from_daily_prices(start(), &[100.0, 101.0, 102.0, 103.0, 100.0])
            .unwrap();
        let strategy = RsiReversionStrategy::new(2, 30.0, 70.0);
        let signals = strategy.signals(&series).unwrap();

        assert_eq!(signals[..2], [None, None]);
        assert_eq!(signals[2], Some(Signal::Short));
        assert_eq!(signals[3], Some(Signal::Short));

        let pnl = strategy.evaluate(&series, &MarketParams::default()).unwrap();
        assert_eq!(pnl.first_defined_index(), Some(3));
        assert_relative_eq!(pnl.get(4).unwrap(), -(100.0 / 103.0 - 1.0), epsilon = 1e-12);
    }

    #[test]
    fn test_flat_prices_stay_flat() {
        let series =
            PriceSeries::from_daily_prices(start(), &[100.0, 100.0, 100.0, 100.0]).unwrap();
        let signals = RsiReversionStrategy::new(2, 30.0, 70.0).signals(&series).unwrap();
        assert!(signals[2..].iter().all(|s| *s == Some(Signal::Flat)));
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let series = PriceSeries::from_daily_prices(start(), &[100.0, 101.0, 102.0]).unwrap();
        assert!(matches!(
            RsiReversionStrategy::new(2, 70.0, 30.0).signals(&series),
            Err(EvalError::InvalidParameter {
                name: "overbought",
                ..
            })
        ));
    }
}
