//! Signals, the Flat/Long position track, and the round-trip trades derived
//! from it.

use chrono::NaiveDate;
use serde::Serialize;
use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Signal {
    /// +1 / -1 / 0
    pub fn value(self) -> i8 {
        match self {
            Signal::Buy => 1,
            Signal::Sell => -1,
            Signal::Hold => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Position {
    #[default]
    Flat,
    Long,
}

impl Position {
    pub fn is_long(self) -> bool {
        self == Position::Long
    }

    /// 1 when long, 0 when flat.
    pub fn value(self) -> u8 {
        match self {
            Position::Flat => 0,
            Position::Long => 1,
        }
    }

    /// Next state after `signal`. Sell while flat and Buy while long are no-ops.
    pub fn apply(self, signal: Signal) -> Position {
        match (self, signal) {
            (Position::Flat, Signal::Buy) => Position::Long,
            (Position::Long, Signal::Sell) => Position::Flat,
            (state, _) => state,
        }
    }
}

/// Folds signals into a position track, starting flat.
pub fn calculate_positions(signals: &[Signal]) -> Vec<Position> {
    signals
        .iter()
        .scan(Position::Flat, |state, &signal| {
            *state = state.apply(signal);
            Some(*state)
        })
        .collect()
}

/// A closed long round trip priced at bar closes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyTrade {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub trade_return: f64,
    pub holding_period: usize,
}

/// A long position still held at the last bar, marked to that bar's close.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenTrade {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub last_date: NaiveDate,
    pub last_price: f64,
    pub unrealized_return: f64,
    pub holding_period: usize,
}

fn entries_and_exits(positions: &[Position]) -> (Vec<(usize, usize)>, Option<usize>) {
    let mut closed = Vec::new();
    let mut entry: Option<usize> = None;
    for (i, pos) in positions.iter().enumerate() {
        match (pos, entry) {
            (Position::Long, None) => entry = Some(i),
            (Position::Flat, Some(start)) => {
                closed.push((start, i));
                entry = None;
            }
            _ => {}
        }
    }
    (closed, entry)
}

/// Closed round trips from Flat→Long / Long→Flat transitions.
pub fn identify_trades(bars: &[OhlcvBar], positions: &[Position]) -> Vec<StrategyTrade> {
    let n = bars.len().min(positions.len());
    let (closed, _) = entries_and_exits(&positions[..n]);
    closed
        .into_iter()
        .map(|(entry, exit)| {
            let entry_price = bars[entry].close;
            let exit_price = bars[exit].close;
            StrategyTrade {
                entry_date: bars[entry].date,
                entry_price,
                exit_date: bars[exit].date,
                exit_price,
                trade_return: (exit_price - entry_price) / entry_price,
                holding_period: exit - entry,
            }
        })
        .collect()
}

/// The position left open at the final bar, if any.
pub fn open_trade(bars: &[OhlcvBar], positions: &[Position]) -> Option<OpenTrade> {
    let n = bars.len().min(positions.len());
    let (_, dangling) = entries_and_exits(&positions[..n]);
    let entry = dangling?;
    let last = n - 1;
    let entry_price = bars[entry].close;
    let last_price = bars[last].close;
    Some(OpenTrade {
        entry_date: bars[entry].date,
        entry_price,
        last_date: bars[last].date,
        last_price,
        unrealized_return: (last_price - entry_price) / entry_price,
        holding_period: last - entry,
    })
}

/// Per-trade statistics over closed trades. Every field is zero when there
/// are no trades.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub average_return: f64,
    /// Sum of per-trade returns, not compounded.
    pub total_return: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    pub avg_winning_trade: f64,
    pub avg_losing_trade: f64,
    pub avg_holding_period: f64,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

pub fn summarize(trades: &[StrategyTrade]) -> SummaryStats {
    if trades.is_empty() {
        return SummaryStats::default();
    }
    let returns: Vec<f64> = trades.iter().map(|t| t.trade_return).collect();
    let winners: Vec<f64> = returns.iter().copied().filter(|r| *r > 0.0).collect();
    let losers: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    let holding: Vec<f64> = trades.iter().map(|t| t.holding_period as f64).collect();

    SummaryStats {
        total_trades: trades.len(),
        winning_trades: winners.len(),
        losing_trades: losers.len(),
        win_rate: winners.len() as f64 / trades.len() as f64,
        average_return: mean(&returns),
        total_return: returns.iter().sum(),
        best_trade: returns.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        worst_trade: returns.iter().copied().fold(f64::INFINITY, f64::min),
        avg_winning_trade: mean(&winners),
        avg_losing_trade: mean(&losers),
        avg_holding_period: mean(&holding),
    }
}
