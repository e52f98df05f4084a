use crate::error::{ensure_len, ensure_same_len, EvalError, EvalResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//a point in the equity curve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
    //fraction below the running peak, always <= 0
    pub drawdown: f64,
    pub returns: f64,
}

impl EquityPoint {
    pub fn new(timestamp: DateTime<Utc>, equity: f64, drawdown: f64, returns: f64) -> Self {
        EquityPoint {
            timestamp,
            equity,
            drawdown,
            returns,
        }
    }
}

//builds the equity curve of an account that starts at initial_balance and
//carries the given cumulative pnl at each timestamp
//the first return is measured against the initial balance
pub fn calculate_equity_curve(
    timestamps: &[DateTime<Utc>],
    cumulative_pnl: &[f64],
    initial_balance: f64,
) -> EvalResult<Vec<EquityPoint>> {
    if initial_balance <= 0.0 || !initial_balance.is_finite() {
        return Err(EvalError::InvalidParameter {
            name: "initial_balance",
            value: initial_balance,
            reason: "must be strictly positive",
        });
    }
    ensure_same_len(timestamps.len(), cumulative_pnl.len())?;

    let mut curve = Vec::with_capacity(timestamps.len());
    let mut peak = initial_balance;
    let mut prev_equity = initial_balance;

    for (&timestamp, &pnl) in timestamps.iter().zip(cumulative_pnl.iter()) {
        let equity = initial_balance + pnl;

        //equity must stay above zero
        if equity <= 0.0 {
            return Err(EvalError::DivisionByZero("equity curve (non-positive equity)"));
        }

        if equity > peak {
            peak = equity;
        }

        let returns = (equity - prev_equity) / prev_equity;
        let drawdown = (equity - peak) / peak;

        curve.push(EquityPoint::new(timestamp, equity, drawdown, returns));
        prev_equity = equity;
    }

    Ok(curve)
}

//compounds returns into a growth-of-one series, C(t) = prod(1 + r)
pub fn cumulative_growth(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0, |acc, r| {
            *acc *= 1.0 + r;
            Some(*acc)
        })
        .collect()
}

//drawdown of each point against its running maximum
pub fn drawdown_series(cumulative: &[f64]) -> EvalResult<Vec<f64>> {
    let mut drawdowns = Vec::with_capacity(cumulative.len());
    let mut running_max = f64::NEG_INFINITY;

    for &value in cumulative {
        running_max = running_max.max(value);
        if running_max <= 0.0 {
            return Err(EvalError::DivisionByZero("drawdown (non-positive running maximum)"));
        }
        drawdowns.push((value - running_max) / running_max);
    }

    Ok(drawdowns)
}

//maximum drawdown of a cumulative series, <= 0
pub fn max_drawdown(cumulative: &[f64]) -> EvalResult<f64> {
    ensure_len(2, cumulative.len())?;

    let drawdowns = drawdown_series(cumulative)?;
    Ok(drawdowns.into_iter().fold(0.0, f64::min))
}
