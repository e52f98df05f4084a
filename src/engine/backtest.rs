use crate::data::{PricePoint, PriceSeries};
use crate::engine::rules::{EntryRule, ExitRule};
use crate::error::EvalResult;
use crate::portfolio::{ExitReason, OpenPosition, PositionSide, RoundTrip, TradeStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

//action recorded by the backtest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Entry,
    Exit,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Entry => write!(f, "ENTRY"),
            TradeAction::Exit => write!(f, "EXIT"),
        }
    }
}

//one entry or exit at a timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub timestamp: DateTime<Utc>,
    pub action: TradeAction,
    pub price: f64,
    pub side: PositionSide,
    pub reason: Option<ExitReason>,
}

//lifecycle of a backtest run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Idle,
    SignalGenerated,
    PositionOpen,
    PositionClosed,
    Reported,
}

//result of a backtest
#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub events: Vec<TradeEvent>,
    pub round_trips: Vec<RoundTrip>,
    pub stats: TradeStats,
    //position still open when the series ended
    pub open_position: Option<OpenPosition>,
    pub state: RunState,
    //every state entered, in order, starting from Idle
    pub transitions: Vec<RunState>,
}

//single-position entry/exit simulator
pub struct BacktestEngine {
    entry: EntryRule,
    exit: ExitRule,
    state: RunState,
    transitions: Vec<RunState>,
    position: Option<OpenPosition>,
    previous_price: Option<f64>,
    events: Vec<TradeEvent>,
    round_trips: Vec<RoundTrip>,
}

impl BacktestEngine {
    //creates a new backtest engine, rejecting invalid rules up front
    pub fn new(entry: EntryRule, exit: ExitRule) -> EvalResult<Self> {
        entry.validate()?;
        exit.validate()?;

        Ok(BacktestEngine {
            entry,
            exit,
            state: RunState::Idle,
            transitions: vec![RunState::Idle],
            position: None,
            previous_price: None,
            events: Vec::new(),
            round_trips: Vec::new(),
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn position(&self) -> Option<&OpenPosition> {
        self.position.as_ref()
    }

    pub fn transitions(&self) -> &[RunState] {
        &self.transitions
    }

    fn transition(&mut self, state: RunState) {
        self.state = state;
        self.transitions.push(state);
    }

    //advances the simulation by one observation
    //an exit on this step blocks any entry until the next step
    pub fn step(&mut self, point: &PricePoint) {
        let price = point.price;

        match self.position.take() {
            None => {
                if self.entry.condition.fires(self.previous_price, price) {
                    self.transition(RunState::SignalGenerated);
                    self.open(point);
                }
            }
            Some(mut position) => match self.exit_reason(&position, price) {
                Some(reason) => self.close(position, point, reason),
                None => {
                    if let Some(pct) = self.exit.trailing_stop_pct {
                        position.ratchet(price, pct);
                    }
                    self.position = Some(position);
                }
            },
        }

        self.previous_price = Some(price);
    }

    //runs the whole series and reports
    pub fn run(mut self, series: &PriceSeries) -> BacktestResult {
        for point in series.points() {
            self.step(point);
        }
        self.finish()
    }

    pub fn finish(mut self) -> BacktestResult {
        self.transition(RunState::Reported);
        let stats = TradeStats::from_round_trips(&self.round_trips);

        BacktestResult {
            events: self.events,
            round_trips: self.round_trips,
            stats,
            open_position: self.position,
            state: self.state,
            transitions: self.transitions,
        }
    }

    fn exit_reason(&self, position: &OpenPosition, price: f64) -> Option<ExitReason> {
        if let Some(pct) = self.exit.stop_loss_pct {
            if position.is_breached(price, position.stop_loss_price(pct)) {
                return Some(ExitReason::StopLoss);
            }
        }

        if let Some(level) = position.trailing_stop {
            if position.is_breached(price, level) {
                return Some(ExitReason::TrailingStop);
            }
        }

        if let Some(pct) = self.exit.take_profit_pct {
            if position.is_reached(price, position.take_profit_price(pct)) {
                return Some(ExitReason::TakeProfit);
            }
        }

        None
    }

    fn open(&mut self, point: &PricePoint) {
        let position = OpenPosition::open(
            self.entry.side,
            self.entry.qty,
            point.timestamp,
            point.price,
            self.exit.trailing_stop_pct,
        );

        debug!(
            timestamp = %point.timestamp,
            price = point.price,
            side = %position.side,
            "entry"
        );

        self.events.push(TradeEvent {
            timestamp: point.timestamp,
            action: TradeAction::Entry,
            price: point.price,
            side: position.side,
            reason: None,
        });
        self.position = Some(position);
        self.transition(RunState::PositionOpen);
    }

    fn close(&mut self, position: OpenPosition, point: &PricePoint, reason: ExitReason) {
        let pnl = position.unrealized_pnl(point.price);

        debug!(
            timestamp = %point.timestamp,
            price = point.price,
            pnl,
            %reason,
            "exit"
        );

        self.events.push(TradeEvent {
            timestamp: point.timestamp,
            action: TradeAction::Exit,
            price: point.price,
            side: position.side,
            reason: Some(reason),
        });
        self.round_trips.push(RoundTrip {
            side: position.side,
            qty: position.qty,
            entry_time: position.entry_time,
            entry_price: position.entry_price,
            exit_time: point.timestamp,
            exit_price: point.price,
            exit_reason: reason,
            pnl,
        });
        self.transition(RunState::PositionClosed);
    }
}

//runs the entry/exit simulation over a price series
pub fn run_backtest(
    series: &PriceSeries,
    entry: EntryRule,
    exit: ExitRule,
) -> EvalResult<BacktestResult> {
    let engine = BacktestEngine::new(entry, exit)?;
    let result = engine.run(series);

    debug!(
        events = result.events.len(),
        trades = result.stats.num_trades,
        "backtest finished"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rules::EntryCondition;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn series(prices: &[f64]) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
        PriceSeries::from_daily_prices(start, prices).unwrap()
    }

    fn actions(result: &BacktestResult) -> Vec<TradeAction> {
        result.events.iter().map(|e| e.action).collect()
    }

    #[test]
    fn test_single_entry_then_stop_loss() {
        let prices = series(&[95.0, 98.0, 101.0, 104.0, 95.0, 96.0, 97.0, 99.0]);
        let entry = EntryRule::new(EntryCondition::PriceAbove(100.0), PositionSide::Long, 1);

        let result = run_backtest(&prices, entry, ExitRule::stop_loss(0.05)).unwrap();

        assert_eq!(actions(&result), vec![TradeAction::Entry, TradeAction::Exit]);
        assert_eq!(result.events[0].price, 101.0);
        assert_eq!(result.events[1].price, 95.0);
        assert_eq!(result.events[1].reason, Some(ExitReason::StopLoss));
        assert_eq!(result.round_trips.len(), 1);
        assert_relative_eq!(result.round_trips[0].pnl, -6.0);
        assert!(result.open_position.is_none());
        assert_eq!(result.state, RunState::Reported);
    }

    #[test]
    fn test_quiet_run_goes_straight_to_reported() {
        let prices = series(&[95.0, 96.0, 97.0]);
        let entry = EntryRule::new(EntryCondition::PriceAbove(100.0), PositionSide::Long, 1);

        let result = run_backtest(&prices, entry, ExitRule::stop_loss(0.05)).unwrap();

        assert!(result.events.is_empty());
        assert_eq!(result.transitions, vec![RunState::Idle, RunState::Reported]);
    }

    #[test]
    fn test_never_two_consecutive_entries() {
        let prices = series(&[99.0, 98.0, 97.0, 96.0, 90.0, 89.0, 88.0, 70.0, 71.0]);
        let entry = EntryRule::new(EntryCondition::PriceBelow(100.0), PositionSide::Long, 1);

        let result = run_backtest(&prices, entry, ExitRule::stop_loss(0.1)).unwrap();

        for pair in result.events.windows(2) {
            assert_ne!(pair[0].action, pair[1].action);
        }
        assert_eq!(result.events[0].action, TradeAction::Entry);
    }

    #[test]
    fn test_no_reentry_on_exit_step() {
        //entry at 99, stop at 89.1 hit at 89, still below 100 on that step
        let prices = series(&[99.0, 95.0, 89.0, 92.0]);
        let entry = EntryRule::new(EntryCondition::PriceBelow(100.0), PositionSide::Long, 1);

        let result = run_backtest(&prices, entry, ExitRule::stop_loss(0.1)).unwrap();

        assert_eq!(
            actions(&result),
            vec![TradeAction::Entry, TradeAction::Exit, TradeAction::Entry]
        );
        assert_eq!(result.events[1].timestamp, prices.points()[2].timestamp);
        assert_eq!(result.events[2].timestamp, prices.points()[3].timestamp);
        assert!(result.open_position.is_some());
    }

    #[test]
    fn test_trailing_stop_exit() {
        let prices = series(&[100.0, 110.0, 120.0, 115.0, 107.0, 100.0]);
        let entry = EntryRule::new(EntryCondition::PriceAbove(99.0), PositionSide::Long, 2);
        let exit = ExitRule::stop_loss(0.2).with_trailing_stop(0.1);

        let result = run_backtest(&prices, entry, exit).unwrap();

        //trail ratchets to 108 after 120, 107 breaches it
        assert_eq!(result.events[1].reason, Some(ExitReason::TrailingStop));
        assert_eq!(result.events[1].price, 107.0);
        assert_relative_eq!(result.round_trips[0].pnl, 14.0);
    }

    #[test]
    fn test_stop_loss_checked_before_trailing() {
        let prices = series(&[100.0, 94.0]);
        let entry = EntryRule::new(EntryCondition::PriceAbove(99.0), PositionSide::Long, 1);
        let exit = ExitRule::stop_loss(0.05).with_trailing_stop(0.05);

        let result = run_backtest(&prices, entry, exit).unwrap();
        assert_eq!(result.events[1].reason, Some(ExitReason::StopLoss));
    }

    #[test]
    fn test_short_take_profit() {
        let prices = series(&[100.0, 98.0, 89.0, 95.0]);
        let entry = EntryRule::new(EntryCondition::PriceAbove(99.0), PositionSide::Short, 1);
        let exit = ExitRule::stop_loss(0.05).with_take_profit(0.1);

        let result = run_backtest(&prices, entry, exit).unwrap();

        assert_eq!(result.events[1].reason, Some(ExitReason::TakeProfit));
        assert_relative_eq!(result.round_trips[0].pnl, 11.0);
        assert_eq!(result.stats.num_winning_trades, 1);
    }

    #[test]
    fn test_engine_state_transitions() {
        let prices = series(&[101.0, 90.0]);
        let entry = EntryRule::new(EntryCondition::PriceAbove(100.0), PositionSide::Long, 1);
        let mut engine = BacktestEngine::new(entry, ExitRule::stop_loss(0.05)).unwrap();
        assert_eq!(engine.state(), RunState::Idle);

        engine.step(&prices.points()[0]);
        assert_eq!(engine.state(), RunState::PositionOpen);
        assert!(engine.position().is_some());
        assert_eq!(
            engine.transitions(),
            [RunState::Idle, RunState::SignalGenerated, RunState::PositionOpen]
        );

        engine.step(&prices.points()[1]);
        assert_eq!(engine.state(), RunState::PositionClosed);
        assert!(engine.position().is_none());

        let result = engine.finish();
        assert_eq!(result.state, RunState::Reported);
        assert_eq!(
            result.transitions,
            vec![
                RunState::Idle,
                RunState::SignalGenerated,
                RunState::PositionOpen,
                RunState::PositionClosed,
                RunState::Reported,
            ]
        );
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let entry = EntryRule::new(EntryCondition::PriceAbove(100.0), PositionSide::Long, 1);
        assert!(run_backtest(&series(&[100.0]), entry, ExitRule::stop_loss(2.0)).is_err());
    }
}
