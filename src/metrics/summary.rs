use crate::error::{ensure_finite, ensure_len, EvalError, EvalResult};
use crate::metrics::timeseries::{cumulative_growth, max_drawdown};
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

//periods per year used to annualize daily returns
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

//risk/return snapshot of a return series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub sharpe_ratio: f64,
    //fraction below the running peak, <= 0
    pub max_drawdown: f64,
    pub cumulative_return: f64,
    pub annualized_volatility: f64,
    pub periods: usize,
}

impl PerformanceReport {
    //calculates the report from per-period (daily) returns
    //the drawdown is measured on growth-of-one starting from 1.0 so a loss in
    //the first period counts against the initial stake
    pub fn from_returns(returns: &[f64], risk_free_rate: f64) -> EvalResult<Self> {
        let sharpe = sharpe_ratio(returns, risk_free_rate)?;

        let mut growth = Vec::with_capacity(returns.len() + 1);
        growth.push(1.0);
        growth.extend(cumulative_growth(returns));

        let max_dd = max_drawdown(&growth)?;

        Ok(PerformanceReport {
            sharpe_ratio: sharpe,
            max_drawdown: max_dd,
            cumulative_return: cumulative_return(returns)?,
            annualized_volatility: annualized_volatility(returns)?,
            periods: returns.len(),
        })
    }

    //prints metrics in a formatted table
    pub fn pretty_print_table(&self) {
        self.to_table().printstd();
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new();

        table.add_row(Row::new(vec![Cell::new("Metric"), Cell::new("Value")]));

        table.add_row(Row::new(vec![
            Cell::new("Periods"),
            Cell::new(&format!("{}", self.periods)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Cumulative Return"),
            Cell::new(&format!("{:.2}%", self.cumulative_return * 100.0)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Annualized Volatility"),
            Cell::new(&format!("{:.2}%", self.annualized_volatility * 100.0)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Sharpe Ratio"),
            Cell::new(&format!("{:.3}", self.sharpe_ratio)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Max Drawdown"),
            Cell::new(&format!("{:.2}%", self.max_drawdown * 100.0)),
        ]));

        table
    }
}

//annualized sharpe ratio of daily returns
//sharpe = (mean * 252 - rf) / (std * sqrt(252)), sample standard deviation
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> EvalResult<f64> {
    ensure_returns(returns)?;
    ensure_finite("risk_free_rate", risk_free_rate)?;

    let mean = returns.mean();
    let std_dev = returns.std_dev();

    if std_dev == 0.0 {
        return Err(EvalError::DivisionByZero(
            "sharpe ratio (zero standard deviation of returns)",
        ));
    }

    let excess = mean * TRADING_DAYS_PER_YEAR - risk_free_rate;
    Ok(excess / (std_dev * TRADING_DAYS_PER_YEAR.sqrt()))
}

//annualized standard deviation of daily returns
pub fn annualized_volatility(returns: &[f64]) -> EvalResult<f64> {
    ensure_returns(returns)?;
    Ok(returns.std_dev() * TRADING_DAYS_PER_YEAR.sqrt())
}

//compounded return of the whole series
pub fn cumulative_return(returns: &[f64]) -> EvalResult<f64> {
    ensure_returns(returns)?;
    Ok(returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0)
}

//every metric needs two or more finite returns
fn ensure_returns(returns: &[f64]) -> EvalResult<()> {
    ensure_len(2, returns.len())?;
    for &r in returns {
        ensure_finite("return", r)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const RETURNS: [f64; 6] = [0.01, -0.005, 0.02, 0.0, -0.01, 0.015];

    #[test]
    fn test_sharpe_matches_formula() {
        let mean = RETURNS.iter().sum::<f64>() / RETURNS.len() as f64;
        let var = RETURNS.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
            / (RETURNS.len() - 1) as f64;
        let expected = (mean * 252.0 - 0.01) / (var.sqrt() * 252.0_f64.sqrt());

        assert_relative_eq!(sharpe_ratio(&RETURNS, 0.01).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_sharpe_is_scale_invariant() {
        let scaled: Vec<f64> = RETURNS.iter().map(|r| r * 3.0).collect();
        assert_relative_eq!(
            sharpe_ratio(&RETURNS, 0.0).unwrap(),
            sharpe_ratio(&scaled, 0.0).unwrap(),
            epsilon = 1e-12
        );

        //with a non-zero risk-free rate the offset has to scale with the returns
        assert_relative_eq!(
            sharpe_ratio(&RETURNS, 0.02).unwrap(),
            sharpe_ratio(&scaled, 0.06).unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_sharpe_shift_can_flip_sign() {
        //shifting returns down moves the mean but not the std
        let shifted: Vec<f64> = RETURNS.iter().map(|r| r - 0.01).collect();
        assert!(sharpe_ratio(&RETURNS, 0.0).unwrap() > 0.0);
        assert!(sharpe_ratio(&shifted, 0.0).unwrap() < 0.0);
    }

    #[test]
    fn test_sharpe_zero_std_fails() {
        assert!(matches!(
            sharpe_ratio(&[0.01, 0.01, 0.01], 0.0),
            Err(EvalError::DivisionByZero(_))
        ));
    }

    #[test]
    fn test_metrics_need_two_points() {
        assert_eq!(
            sharpe_ratio(&[0.01], 0.0),
            Err(EvalError::InsufficientData {
                required: 2,
                actual: 1
            })
        );
        assert!(PerformanceReport::from_returns(&[], 0.0).is_err());
        assert!(cumulative_return(&[0.1]).is_err());
    }

    #[test]
    fn test_report_from_returns() {
        let report = PerformanceReport::from_returns(&[0.1, -0.5, 1.0], 0.0).unwrap();
        assert_eq!(report.periods, 3);
        assert_relative_eq!(report.cumulative_return, 0.1, epsilon = 1e-12);
        //peak 1.1 then 0.55
        assert_relative_eq!(report.max_drawdown, -0.5, epsilon = 1e-12);
        assert!(report.annualized_volatility > 0.0);
    }

    #[test]
    fn test_report_counts_first_period_loss() {
        let report = PerformanceReport::from_returns(&[-0.2, 0.1], 0.0).unwrap();
        assert_relative_eq!(report.max_drawdown, -0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_report_rejects_nan_returns() {
        assert!(PerformanceReport::from_returns(&[0.1, f64::NAN], 0.0).is_err());
    }

    #[test]
    fn test_metrics_reject_non_finite_returns() {
        assert!(matches!(
            sharpe_ratio(&[f64::INFINITY, 0.1, 0.2], 0.0),
            Err(EvalError::InvalidParameter { name: "return", .. })
        ));
        assert!(annualized_volatility(&[0.1, f64::NAN]).is_err());
        assert!(cumulative_return(&[0.1, f64::NEG_INFINITY]).is_err());
    }

    #[test]
    fn test_report_uses_compounded_return() {
        let returns = [0.05, -0.02, 0.03];
        let report = PerformanceReport::from_returns(&returns, 0.0).unwrap();
        assert_eq!(report.cumulative_return, cumulative_return(&returns).unwrap());
    }
}
