use crate::portfolio::position::PositionSide;
use chrono::{DateTime, Utc};
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use std::fmt;

//why a position was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TrailingStop,
    TakeProfit,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "stop loss"),
            ExitReason::TrailingStop => write!(f, "trailing stop"),
            ExitReason::TakeProfit => write!(f, "take profit"),
        }
    }
}

//a completed entry/exit pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundTrip {
    pub side: PositionSide,
    pub qty: u32,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
    pub pnl: f64,
}

//statistics over completed round trips
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    pub num_trades: usize,
    pub num_winning_trades: usize,
    pub num_losing_trades: usize,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    //none when there are no losing trades
    pub profit_factor: Option<f64>,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub total_pnl: f64,
}

impl TradeStats {
    pub fn from_round_trips(round_trips: &[RoundTrip]) -> Self {
        if round_trips.is_empty() {
            return TradeStats {
                num_trades: 0,
                num_winning_trades: 0,
                num_losing_trades: 0,
                win_rate: 0.0,
                avg_win: 0.0,
                avg_loss: 0.0,
                profit_factor: None,
                largest_win: 0.0,
                largest_loss: 0.0,
                total_pnl: 0.0,
            };
        }

        let winning_trades: Vec<f64> = round_trips
            .iter()
            .map(|t| t.pnl)
            .filter(|&pnl| pnl > 0.0)
            .collect();
        let losing_trades: Vec<f64> = round_trips
            .iter()
            .map(|t| t.pnl)
            .filter(|&pnl| pnl < 0.0)
            .collect();

        let num_winning = winning_trades.len();
        let num_losing = losing_trades.len();
        let total = round_trips.len();

        let avg_win = if num_winning > 0 {
            winning_trades.iter().sum::<f64>() / num_winning as f64
        } else {
            0.0
        };

        let avg_loss = if num_losing > 0 {
            losing_trades.iter().sum::<f64>() / num_losing as f64
        } else {
            0.0
        };

        let total_wins: f64 = winning_trades.iter().sum();
        let total_losses: f64 = losing_trades.iter().sum::<f64>().abs();

        let profit_factor = if total_losses > 0.0 {
            Some(total_wins / total_losses)
        } else {
            None
        };

        TradeStats {
            num_trades: total,
            num_winning_trades: num_winning,
            num_losing_trades: num_losing,
            win_rate: num_winning as f64 / total as f64,
            avg_win,
            avg_loss,
            profit_factor,
            largest_win: winning_trades.iter().fold(0.0f64, |a, &b| a.max(b)),
            largest_loss: losing_trades.iter().fold(0.0f64, |a, &b| a.min(b)),
            total_pnl: round_trips.iter().map(|t| t.pnl).sum(),
        }
    }

    //prints trade statistics in a formatted table
    pub fn pretty_print_table(&self) {
        let mut table = Table::new();

        table.add_row(Row::new(vec![Cell::new("Trade Metric"), Cell::new("Value")]));
        table.add_row(Row::new(vec![
            Cell::new("Number of Trades"),
            Cell::new(&format!("{}", self.num_trades)),
        ]));
        table.add_row(Row::new(vec![
            Cell::new("Win Rate"),
            Cell::new(&format!("{:.2}%", self.win_rate * 100.0)),
        ]));
        table.add_row(Row::new(vec![
            Cell::new("Total P&L"),
            Cell::new(&format!("{:.2}", self.total_pnl)),
        ]));
        table.add_row(Row::new(vec![
            Cell::new("Avg Win"),
            Cell::new(&format!("{:.2}", self.avg_win)),
        ]));
        table.add_row(Row::new(vec![
            Cell::new("Avg Loss"),
            Cell::new(&format!("{:.2}", self.avg_loss)),
        ]));
        table.add_row(Row::new(vec![
            Cell::new("Largest Win"),
            Cell::new(&format!("{:.2}", self.largest_win)),
        ]));
        table.add_row(Row::new(vec![
            Cell::new("Largest Loss"),
            Cell::new(&format!("{:.2}", self.largest_loss)),
        ]));
        table.add_row(Row::new(vec![
            Cell::new("Profit Factor"),
            Cell::new(
                &self
                    .profit_factor
                    .map(|pf| format!("{:.3}", pf))
                    .unwrap_or_else(|| "n/a".to_string()),
            ),
        ]));

        table.printstd();
    }
}
