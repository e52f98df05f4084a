pub mod mean_reversion;
pub mod momentum;
pub mod options;
pub mod rsi_reversion;

use crate::data::{PnlSeries, PriceSeries};
use crate::error::{ensure_len, EvalError, EvalResult};
use crate::instrument::MarketParams;
use serde::{Deserialize, Serialize};

//what the values of a strategy's pnl series measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PnlKind {
    //cumulative profit/loss in price units at each timestamp
    Absolute,
    //per-period strategy return
    Returns,
}

//strategy interface that all strategies must implement
pub trait Strategy: Send + Sync {
    //maps a price series to a pnl series of the same length
    fn evaluate(&self, series: &PriceSeries, market: &MarketParams) -> EvalResult<PnlSeries>;

    fn kind(&self) -> PnlKind;

    //returns the strategy name
    fn name(&self) -> &str;
}

//position held over the next period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Long,
    Short,
    Flat,
}

impl Signal {
    pub fn exposure(&self) -> f64 {
        match self {
            Signal::Long => 1.0,
            Signal::Short => -1.0,
            Signal::Flat => 0.0,
        }
    }
}

//helper function to calculate simple moving average
pub fn sma(prices: &[f64]) -> Option<f64> {
    if prices.is_empty() {
        return None;
    }
    Some(prices.iter().sum::<f64>() / prices.len() as f64)
}

//trailing sma aligned with prices, None until `window` prices are available
pub fn sma_series(prices: &[f64], window: usize) -> EvalResult<Vec<Option<f64>>> {
    if window == 0 {
        return Err(EvalError::InvalidParameter {
            name: "window",
            value: 0.0,
            reason: "must be at least 1",
        });
    }

    Ok((0..prices.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                sma(&prices[i + 1 - window..=i])
            }
        })
        .collect())
}

//helper function to calculate relative strength index over the last `period` changes
//a window with no losses is 100, a window with no movement at all is neutral 50
pub fn rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    let window = &prices[prices.len() - period - 1..];
    let mut gains = 0.0;
    let mut losses = 0.0;

    for pair in window.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gains += change;
        } else {
            losses -= change;
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return Some(if avg_gain == 0.0 { 50.0 } else { 100.0 });
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}

//applies the previous period's signal to the current period's return
//pnl(t) = signal(t-1) * return(t); no signal at t-1 means no pnl at t
pub fn lagged_signal_pnl(series: &PriceSeries, signals: &[Option<Signal>]) -> EvalResult<PnlSeries> {
    let returns = series.daily_returns();

    let values = (0..series.len())
        .map(|i| {
            if i == 0 {
                return None;
            }
            match (signals.get(i - 1).copied().flatten(), returns[i]) {
                (Some(signal), Some(ret)) => Some(signal.exposure() * ret),
                _ => None,
            }
        })
        .collect();

    PnlSeries::new(series, values)
}

//series must be long enough to produce at least one pnl value
pub(crate) fn ensure_warmup(series: &PriceSeries, warmup: usize) -> EvalResult<()> {
    ensure_len(warmup + 1, series.len())
}
