use crate::data::bar::{Bar, PriceField};
use crate::error::{ensure_positive, ensure_same_len, EvalError, EvalResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

//a single observation of the underlying
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

//ordered, validated price path of the underlying
//timestamps strictly increase and every price is finite and positive
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> EvalResult<Self> {
        for (i, point) in points.iter().enumerate() {
            ensure_positive("price", point.price)?;
            if i > 0 && point.timestamp <= points[i - 1].timestamp {
                return Err(EvalError::UnorderedTimestamps { index: i });
            }
        }

        Ok(PriceSeries { points })
    }

    //builds a series of consecutive daily observations starting at `start`
    pub fn from_daily_prices(start: DateTime<Utc>, prices: &[f64]) -> EvalResult<Self> {
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PricePoint {
                timestamp: start + Duration::days(i as i64),
                price,
            })
            .collect();
        Self::new(points)
    }

    //builds a series from bars already sorted by timestamp
    pub fn from_bars(bars: &[Bar], field: PriceField) -> EvalResult<Self> {
        let points = bars
            .iter()
            .map(|bar| PricePoint {
                timestamp: bar.timestamp,
                price: bar.price(field),
            })
            .collect();
        Self::new(points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    //simple period-over-period returns aligned with the series
    //index 0 has no prior price and is None
    pub fn daily_returns(&self) -> Vec<Option<f64>> {
        let mut returns = Vec::with_capacity(self.points.len());
        for i in 0..self.points.len() {
            if i == 0 {
                returns.push(None);
            } else {
                let prev = self.points[i - 1].price;
                returns.push(Some(self.points[i].price / prev - 1.0));
            }
        }
        returns
    }
}

//per-timestamp profit/loss aligned one-to-one with a price series
//undefined entries (indicator warm-up) stay None
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PnlSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<Option<f64>>,
}

impl PnlSeries {
    pub fn new(series: &PriceSeries, values: Vec<Option<f64>>) -> EvalResult<Self> {
        ensure_same_len(series.len(), values.len())?;

        Ok(PnlSeries {
            timestamps: series.timestamps(),
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    //defined entries in order, warm-up entries dropped
    pub fn defined(&self) -> Vec<f64> {
        self.values.iter().flatten().copied().collect()
    }

    //index of the first defined entry
    pub fn first_defined_index(&self) -> Option<usize> {
        self.values.iter().position(|v| v.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_rejects_unordered_timestamps() {
        let t0 = start();
        let points = vec![
            PricePoint { timestamp: t0, price: 100.0 },
            PricePoint { timestamp: t0, price: 101.0 },
        ];
        assert_eq!(
            PriceSeries::new(points),
            Err(EvalError::UnorderedTimestamps { index: 1 })
        );
    }

    #[test]
    fn test_rejects_non_positive_price() {
        let err = PriceSeries::from_daily_prices(start(), &[100.0, 0.0]).unwrap_err();
        assert!(matches!(err, EvalError::InvalidParameter { name: "price", .. }));
    }

    #[test]
    fn test_daily_returns_alignment() {
        let series = PriceSeries::from_daily_prices(start(), &[100.0, 110.0, 99.0]).unwrap();
        let returns = series.daily_returns();
        assert_eq!(returns.len(), 3);
        assert_eq!(returns[0], None);
        assert!((returns[1].unwrap() - 0.1).abs() < 1e-12);
        assert!((returns[2].unwrap() + 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_pnl_series_must_match_length() {
        let series = PriceSeries::from_daily_prices(start(), &[100.0, 101.0]).unwrap();
        assert_eq!(
            PnlSeries::new(&series, vec![Some(1.0)]),
            Err(EvalError::LengthMismatch {
                expected: 2,
                actual: 1
            })
        );
        //too many values is a mismatch, not missing data
        assert_eq!(
            PnlSeries::new(&series, vec![None, Some(1.0), Some(2.0)]),
            Err(EvalError::LengthMismatch {
                expected: 2,
                actual: 3
            })
        );

        let pnl = PnlSeries::new(&series, vec![None, Some(2.0)]).unwrap();
        assert_eq!(pnl.len(), 2);
        assert_eq!(pnl.defined(), vec![2.0]);
        assert_eq!(pnl.first_defined_index(), Some(1));
    }
}
