//! Portfolio ledger: cash, share positions, trade history and equity curve.
//!
//! Fields are private so the ledger invariants hold after every call: cash
//! never goes negative through `buy`, share counts never go negative through
//! `sell`, and each equity point satisfies `cash + positions_value ==
//! total_value` exactly.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// One executed order. `amount` is the total cost of a buy (including
/// commission) or the net proceeds of a sell (after commission).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub symbol: String,
    pub side: Side,
    pub shares: u64,
    pub price: f64,
    pub commission: f64,
    pub amount: f64,
    pub cash_after: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub cash: f64,
    pub positions_value: f64,
    pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclineReason {
    InsufficientCash { required: f64, available: f64 },
    InsufficientShares { requested: u64, held: u64 },
    ZeroShares,
}

impl std::fmt::Display for DeclineReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeclineReason::InsufficientCash {
                required,
                available,
            } => write!(f, "insufficient cash: need {required:.2}, have {available:.2}"),
            DeclineReason::InsufficientShares { requested, held } => {
                write!(f, "insufficient shares: requested {requested}, hold {held}")
            }
            DeclineReason::ZeroShares => write!(f, "order for zero shares"),
        }
    }
}

/// Outcome of a buy or sell. A decline leaves the ledger untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderResult {
    Filled(TradeRecord),
    Declined(DeclineReason),
}

impl OrderResult {
    pub fn is_filled(&self) -> bool {
        matches!(self, OrderResult::Filled(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub total_return_pct: f64,
    pub total_trades: usize,
    pub final_cash: f64,
    pub active_positions: usize,
    pub max_value: f64,
    pub min_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    initial_capital: f64,
    cash: f64,
    positions: BTreeMap<String, u64>,
    trades_history: Vec<TradeRecord>,
    equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            initial_capital,
            cash: initial_capital,
            positions: BTreeMap::new(),
            trades_history: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn buy(
        &mut self,
        symbol: &str,
        shares: u64,
        price: f64,
        date: NaiveDate,
        commission: f64,
    ) -> OrderResult {
        if shares == 0 {
            return OrderResult::Declined(DeclineReason::ZeroShares);
        }
        let total_cost = shares as f64 * price + commission;
        if total_cost > self.cash {
            return OrderResult::Declined(DeclineReason::InsufficientCash {
                required: total_cost,
                available: self.cash,
            });
        }

        self.cash -= total_cost;
        *self.positions.entry(symbol.to_string()).or_insert(0) += shares;

        let record = TradeRecord {
            date,
            symbol: symbol.to_string(),
            side: Side::Buy,
            shares,
            price,
            commission,
            amount: total_cost,
            cash_after: self.cash,
        };
        self.trades_history.push(record.clone());
        OrderResult::Filled(record)
    }

    pub fn sell(
        &mut self,
        symbol: &str,
        shares: u64,
        price: f64,
        date: NaiveDate,
        commission: f64,
    ) -> OrderResult {
        if shares == 0 {
            return OrderResult::Declined(DeclineReason::ZeroShares);
        }
        let held = self.get_position(symbol);
        if shares > held {
            return OrderResult::Declined(DeclineReason::InsufficientShares {
                requested: shares,
                held,
            });
        }

        // Commission above the proceeds must not overdraw the account.
        let proceeds = shares as f64 * price - commission;
        if self.cash + proceeds < 0.0 {
            return OrderResult::Declined(DeclineReason::InsufficientCash {
                required: -proceeds,
                available: self.cash,
            });
        }
        self.cash += proceeds;
        if shares == held {
            self.positions.remove(symbol);
        } else if let Some(count) = self.positions.get_mut(symbol) {
            *count -= shares;
        }

        let record = TradeRecord {
            date,
            symbol: symbol.to_string(),
            side: Side::Sell,
            shares,
            price,
            commission,
            amount: proceeds,
            cash_after: self.cash,
        };
        self.trades_history.push(record.clone());
        OrderResult::Filled(record)
    }

    /// Shares held, zero when none.
    pub fn get_position(&self, symbol: &str) -> u64 {
        self.positions.get(symbol).copied().unwrap_or(0)
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.get_position(symbol) > 0
    }

    pub fn positions(&self) -> &BTreeMap<String, u64> {
        &self.positions
    }

    /// Market value of held shares; a symbol without a price contributes zero.
    pub fn positions_value(&self, prices: &HashMap<String, f64>) -> f64 {
        self.positions
            .iter()
            .filter_map(|(symbol, &shares)| prices.get(symbol).map(|p| shares as f64 * p))
            .sum()
    }

    pub fn portfolio_value(&self, prices: &HashMap<String, f64>) -> f64 {
        self.cash + self.positions_value(prices)
    }

    pub fn record_equity(&mut self, date: NaiveDate, prices: &HashMap<String, f64>) {
        let positions_value = self.positions_value(prices);
        self.equity_curve.push(EquityPoint {
            date,
            cash: self.cash,
            positions_value,
            total_value: self.cash + positions_value,
        });
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    pub fn trades_history(&self) -> &[TradeRecord] {
        &self.trades_history
    }

    /// `None` before any equity point has been recorded.
    pub fn get_summary(&self) -> Option<PortfolioSummary> {
        let last = self.equity_curve.last()?;
        let final_value = last.total_value;
        let total_return = (final_value - self.initial_capital) / self.initial_capital;
        let values = self.equity_curve.iter().map(|p| p.total_value);
        Some(PortfolioSummary {
            initial_capital: self.initial_capital,
            final_value,
            total_return,
            total_return_pct: total_return * 100.0,
            total_trades: self.trades_history.len(),
            final_cash: self.cash,
            active_positions: self.positions.len(),
            max_value: values.clone().fold(f64::NEG_INFINITY, f64::max),
            min_value: values.fold(f64::INFINITY, f64::min),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn prices(symbol: &str, price: f64) -> HashMap<String, f64> {
        HashMap::from([(symbol.to_string(), price)])
    }

    #[test]
    fn new_portfolio() {
        let portfolio = Portfolio::new(100000.0);
        assert!((portfolio.cash() - 100000.0).abs() < f64::EPSILON);
        assert!((portfolio.initial_capital() - 100000.0).abs() < f64::EPSILON);
        assert!(portfolio.positions().is_empty());
        assert!(portfolio.trades_history().is_empty());
        assert!(portfolio.equity_curve().is_empty());
        assert!(portfolio.get_summary().is_none());
    }

    #[test]
    fn buy_debits_cash_and_adds_shares() {
        let mut portfolio = Portfolio::new(10_000.0);
        let result = portfolio.buy("AAPL", 10, 100.0, day(2), 5.0);
        assert!(result.is_filled());
        assert!((portfolio.cash() - 8_995.0).abs() < 1e-9);
        assert_eq!(portfolio.get_position("AAPL"), 10);
        assert!(portfolio.has_position("AAPL"));

        let record = &portfolio.trades_history()[0];
        assert_eq!(record.side, Side::Buy);
        assert!((record.amount - 1_005.0).abs() < 1e-9);
        assert!((record.cash_after - 8_995.0).abs() < 1e-9);
    }

    #[test]
    fn insolvent_buy_is_declined() {
        let mut portfolio = Portfolio::new(100.0);
        let result = portfolio.buy("AAPL", 10, 20.0, day(2), 5.0);
        match result {
            OrderResult::Declined(DeclineReason::InsufficientCash {
                required,
                available,
            }) => {
                assert!((required - 205.0).abs() < 1e-9);
                assert!((available - 100.0).abs() < 1e-9);
            }
            other => panic!("expected decline, got {other:?}"),
        }
        assert!((portfolio.cash() - 100.0).abs() < f64::EPSILON);
        assert!(portfolio.trades_history().is_empty());
        assert!(!portfolio.has_position("AAPL"));
    }

    #[test]
    fn oversell_is_declined() {
        let mut portfolio = Portfolio::new(10_000.0);
        portfolio.buy("AAPL", 5, 100.0, day(2), 0.0);
        let result = portfolio.sell("AAPL", 6, 100.0, day(3), 0.0);
        assert_eq!(
            result,
            OrderResult::Declined(DeclineReason::InsufficientShares {
                requested: 6,
                held: 5
            })
        );
        assert_eq!(portfolio.get_position("AAPL"), 5);
        assert_eq!(portfolio.trades_history().len(), 1);
    }

    #[test]
    fn sell_with_commission_above_proceeds_is_declined() {
        let mut portfolio = Portfolio::new(10.0);
        assert!(portfolio.buy("X", 1, 10.0, day(2), 0.0).is_filled());
        let result = portfolio.sell("X", 1, 1.0, day(3), 5.0);
        match result {
            OrderResult::Declined(DeclineReason::InsufficientCash {
                required,
                available,
            }) => {
                assert!((required - 4.0).abs() < 1e-9);
                assert!(available.abs() < 1e-9);
            }
            other => panic!("expected decline, got {other:?}"),
        }
        assert!(portfolio.cash() >= 0.0);
        assert_eq!(portfolio.get_position("X"), 1);
        assert_eq!(portfolio.trades_history().len(), 1);
    }

    #[test]
    fn sell_commission_covered_by_cash_fills() {
        let mut portfolio = Portfolio::new(20.0);
        portfolio.buy("X", 1, 10.0, day(2), 0.0);
        assert!(portfolio.sell("X", 1, 1.0, day(3), 5.0).is_filled());
        assert!((portfolio.cash() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn zero_share_orders_are_declined() {
        let mut portfolio = Portfolio::new(1_000.0);
        assert_eq!(
            portfolio.buy("X", 0, 10.0, day(2), 0.0),
            OrderResult::Declined(DeclineReason::ZeroShares)
        );
        assert_eq!(
            portfolio.sell("X", 0, 10.0, day(2), 0.0),
            OrderResult::Declined(DeclineReason::ZeroShares)
        );
        assert!(portfolio.trades_history().is_empty());
        assert!((portfolio.cash() - 1_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sell_credits_proceeds_and_clears_position() {
        let mut portfolio = Portfolio::new(10_000.0);
        portfolio.buy("AAPL", 10, 100.0, day(2), 0.0);
        portfolio.sell("AAPL", 4, 110.0, day(3), 2.0);
        assert_eq!(portfolio.get_position("AAPL"), 6);
        portfolio.sell("AAPL", 6, 110.0, day(4), 0.0);
        assert!(!portfolio.has_position("AAPL"));
        assert!(portfolio.positions().is_empty());
        // 10000 - 1000 + 438 + 660
        assert!((portfolio.cash() - 10_098.0).abs() < 1e-9);
    }

    #[test]
    fn round_trip_without_costs_restores_cash() {
        let mut portfolio = Portfolio::new(10_000.0);
        portfolio.buy("AAPL", 10, 100.0, day(2), 0.0);
        portfolio.sell("AAPL", 10, 100.0, day(3), 0.0);
        assert!((portfolio.cash() - 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn record_equity_identity() {
        let mut portfolio = Portfolio::new(10_000.0);
        portfolio.buy("AAPL", 10, 100.0, day(2), 1.0);
        portfolio.record_equity(day(2), &prices("AAPL", 105.0));
        let point = &portfolio.equity_curve()[0];
        assert!((point.positions_value - 1_050.0).abs() < 1e-9);
        assert_eq!(point.total_value, point.cash + point.positions_value);
    }

    #[test]
    fn missing_price_contributes_zero() {
        let mut portfolio = Portfolio::new(10_000.0);
        portfolio.buy("AAPL", 10, 100.0, day(2), 0.0);
        portfolio.record_equity(day(2), &HashMap::new());
        let point = &portfolio.equity_curve()[0];
        assert!(point.positions_value.abs() < f64::EPSILON);
        assert!((point.total_value - 9_000.0).abs() < 1e-9);
    }

    #[test]
    fn summary_after_equity_points() {
        let mut portfolio = Portfolio::new(1_000.0);
        portfolio.record_equity(day(1), &HashMap::new());
        portfolio.buy("AAPL", 5, 100.0, day(2), 0.0);
        portfolio.record_equity(day(2), &prices("AAPL", 80.0));
        portfolio.record_equity(day(3), &prices("AAPL", 140.0));

        let summary = portfolio.get_summary().unwrap();
        assert!((summary.final_value - 1_200.0).abs() < 1e-9);
        assert!((summary.total_return - 0.2).abs() < 1e-12);
        assert!((summary.total_return_pct - 20.0).abs() < 1e-9);
        assert_eq!(summary.total_trades, 1);
        assert_eq!(summary.active_positions, 1);
        assert!((summary.final_cash - 500.0).abs() < 1e-9);
        assert!((summary.max_value - 1_200.0).abs() < 1e-9);
        assert!((summary.min_value - 900.0).abs() < 1e-9);
    }
}
