use crate::data::{PnlSeries, PriceSeries};
use crate::error::{EvalError, EvalResult};
use crate::instrument::MarketParams;
use crate::strategy::{ensure_warmup, lagged_signal_pnl, sma_series, PnlKind, Signal, Strategy};
use serde::{Deserialize, Serialize};

//sma mean reversion strategy
//buys when price sits more than `threshold` below its sma
//sells when price sits more than `threshold` above it, flat in between
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanReversionStrategy {
    window: usize,
    threshold: f64,
}

impl MeanReversionStrategy {
    pub fn new(window: usize, threshold: f64) -> Self {
        MeanReversionStrategy { window, threshold }
    }

    //relative distance of each price from its sma, None during warm-up
    pub fn deviations(&self, series: &PriceSeries) -> EvalResult<Vec<Option<f64>>> {
        let prices = series.prices();
        let smas = sma_series(&prices, self.window)?;

        prices
            .iter()
            .zip(smas)
            .map(|(&price, sma)| match sma {
                Some(sma) if sma == 0.0 => Err(EvalError::DivisionByZero("deviation from sma")),
                Some(sma) => Ok(Some((price - sma) / sma)),
                None => Ok(None),
            })
            .collect()
    }

    pub fn signals(&self, series: &PriceSeries) -> EvalResult<Vec<Option<Signal>>> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(EvalError::InvalidParameter {
                name: "threshold",
                value: self.threshold,
                reason: "must be finite and non-negative",
            });
        }

        Ok(self
            .deviations(series)?
            .into_iter()
            .map(|deviation| {
                deviation.map(|d| {
                    if d < -self.threshold {
                        Signal::Long
                    } else if d > self.threshold {
                        Signal::Short
                    } else {
                        Signal::Flat
                    }
                })
            })
            .collect())
    }
}

impl Default for MeanReversionStrategy {
    fn default() -> Self {
        Self::new(20, 0.02)
    }
}

impl Strategy for MeanReversionStrategy {
    fn evaluate(&self, series: &PriceSeries, _market: &MarketParams) -> EvalResult<PnlSeries> {
        let signals = self.signals(series)?;
        ensure_warmup(series, self.window)?;
        lagged_signal_pnl(series, &signals)
    }

    fn kind(&self) -> PnlKind {
        PnlKind::Returns
    }

    fn name(&self) -> &str {
        "Mean Reversion"
    }
}
