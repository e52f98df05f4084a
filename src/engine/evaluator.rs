use crate::data::{PnlSeries, PriceSeries};
use crate::error::{ensure_positive, EvalResult};
use crate::instrument::MarketParams;
use crate::metrics::{calculate_equity_curve, EquityPoint, PerformanceReport};
use crate::strategy::{PnlKind, Strategy};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

//account settings shared by every strategy run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    //stake that absolute pnl is measured against
    pub initial_balance: f64,
    //annual risk-free rate used by the sharpe ratio
    pub risk_free_rate: f64,
}

impl Default for RunSettings {
    fn default() -> Self {
        RunSettings {
            initial_balance: 100000.0,
            risk_free_rate: 0.01,
        }
    }
}

//result of evaluating one strategy over one series
#[derive(Debug, Clone)]
pub struct StrategyRun {
    pub name: String,
    pub kind: PnlKind,
    pub pnl: PnlSeries,
    //per-period returns the report was computed from
    pub returns: Vec<f64>,
    //only for absolute pnl strategies
    pub equity_curve: Option<Vec<EquityPoint>>,
    pub report: PerformanceReport,
}

//evaluates a strategy and scores its returns
//absolute pnl is turned into returns through an equity curve that starts at
//the initial balance; return-valued pnl is used as is, warm-up excluded
pub fn run_strategy(
    strategy: &dyn Strategy,
    series: &PriceSeries,
    market: &MarketParams,
    settings: &RunSettings,
) -> EvalResult<StrategyRun> {
    let pnl = strategy.evaluate(series, market)?;

    let (returns, equity_curve) = match strategy.kind() {
        PnlKind::Returns => (pnl.defined(), None),
        PnlKind::Absolute => {
            ensure_positive("initial_balance", settings.initial_balance)?;
            let (timestamps, values): (Vec<_>, Vec<_>) = pnl
                .timestamps()
                .iter()
                .zip(pnl.values())
                .filter_map(|(&ts, value)| value.map(|v| (ts, v)))
                .unzip();

            let curve = calculate_equity_curve(&timestamps, &values, settings.initial_balance)?;
            (curve.iter().map(|p| p.returns).collect(), Some(curve))
        }
    };

    let report = PerformanceReport::from_returns(&returns, settings.risk_free_rate)?;

    debug!(
        strategy = strategy.name(),
        periods = report.periods,
        sharpe = report.sharpe_ratio,
        max_drawdown = report.max_drawdown,
        "strategy evaluated"
    );

    Ok(StrategyRun {
        name: strategy.name().to_string(),
        kind: strategy.kind(),
        pnl,
        returns,
        equity_curve,
        report,
    })
}

//outcome of one combination in a sweep
#[derive(Debug, Clone)]
pub struct SweepOutcome<P, T> {
    pub params: P,
    pub result: EvalResult<T>,
}

impl<P, T> SweepOutcome<P, T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

//runs `eval` over every combination in parallel
//outcomes keep the input order, a failed combination never aborts the rest
pub fn sweep<P, T, F>(combinations: Vec<P>, eval: F) -> Vec<SweepOutcome<P, T>>
where
    P: Send + std::fmt::Debug,
    T: Send,
    F: Fn(&P) -> EvalResult<T> + Sync + Send,
{
    let total = combinations.len();
    info!(combinations = total, "starting sweep");

    let outcomes: Vec<SweepOutcome<P, T>> = combinations
        .into_par_iter()
        .map(|params| {
            let result = eval(&params);
            if let Err(ref err) = result {
                warn!(?params, error = %err, "combination failed");
            }
            SweepOutcome { params, result }
        })
        .collect();

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    info!(combinations = total, failed, "sweep finished");

    outcomes
}

//evaluates named strategies over the same series in parallel
pub fn sweep_strategies(
    strategies: Vec<(String, Box<dyn Strategy>)>,
    series: &PriceSeries,
    market: &MarketParams,
    settings: &RunSettings,
) -> Vec<(String, EvalResult<StrategyRun>)> {
    let (names, strategies): (Vec<_>, Vec<_>) = strategies.into_iter().unzip();
    let indexed: Vec<usize> = (0..strategies.len()).collect();

    sweep(indexed, |&i| {
        run_strategy(strategies[i].as_ref(), series, market, settings)
    })
    .into_iter()
    .zip(names)
    .map(|(outcome, name)| (name, outcome.result))
    .collect()
}
