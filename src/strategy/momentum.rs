use crate::data::{PnlSeries, PriceSeries};
use crate::error::EvalResult;
use crate::instrument::MarketParams;
use crate::strategy::{ensure_warmup, lagged_signal_pnl, sma_series, PnlKind, Signal, Strategy};
use serde::{Deserialize, Serialize};

//sma momentum strategy
//long while price is above its trailing sma, short otherwise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumStrategy {
    window: usize,
}

impl MomentumStrategy {
    pub fn new(window: usize) -> Self {
        MomentumStrategy { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    //signal for each index, None during the sma warm-up
    pub fn signals(&self, series: &PriceSeries) -> EvalResult<Vec<Option<Signal>>> {
        let prices = series.prices();
        let smas = sma_series(&prices, self.window)?;

        Ok(prices
            .iter()
            .zip(smas)
            .map(|(&price, sma)| {
                sma.map(|sma| {
                    if price > sma {
                        Signal::Long
                    } else {
                        Signal::Short
                    }
                })
            })
            .collect())
    }
}

impl Default for MomentumStrategy {
    fn default() -> Self {
        Self::new(20)
    }
}

impl Strategy for MomentumStrategy {
    fn evaluate(&self, series: &PriceSeries, _market: &MarketParams) -> EvalResult<PnlSeries> {
        let signals = self.signals(series)?;
        ensure_warmup(series, self.window)?;
        lagged_signal_pnl(series, &signals)
    }

    fn kind(&self) -> PnlKind {
        PnlKind::Returns
    }

    fn name(&self) -> &str {
        "Momentum"
    }
}
