//! Order execution arithmetic: slippage, commission and position sizing.
//!
//! Rates are fractions (0.001 = 0.1%), not percentages.

use super::portfolio::Side;

/// Buy fills at price·(1 + slippage), sell at price·(1 - slippage).
pub fn apply_slippage(market_price: f64, side: Side, slippage_rate: f64) -> f64 {
    match side {
        Side::Buy => market_price * (1.0 + slippage_rate),
        Side::Sell => market_price * (1.0 - slippage_rate),
    }
}

/// Commission = shares · execution price · rate.
pub fn calculate_commission(shares: u64, execution_price: f64, commission_rate: f64) -> f64 {
    shares as f64 * execution_price * commission_rate
}

/// Whole shares affordable with `cash · position_fraction` at `execution_price`.
pub fn calculate_position_size(cash: f64, position_fraction: f64, execution_price: f64) -> u64 {
    if !(execution_price > 0.0) || cash <= 0.0 || position_fraction <= 0.0 {
        return 0;
    }
    let shares = (cash * position_fraction / execution_price).floor();
    if shares.is_finite() && shares > 0.0 {
        shares as u64
    } else {
        0
    }
}

/// A fully priced order ready for the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPlan {
    pub side: Side,
    pub shares: u64,
    pub execution_price: f64,
    pub commission: f64,
}

/// Prices an entry sized from available cash. `None` when not even one share
/// is affordable.
pub fn plan_entry(
    cash: f64,
    close: f64,
    position_fraction: f64,
    slippage_rate: f64,
    commission_rate: f64,
) -> Option<OrderPlan> {
    let execution_price = apply_slippage(close, Side::Buy, slippage_rate);
    let shares = calculate_position_size(cash, position_fraction, execution_price);
    if shares == 0 {
        return None;
    }
    Some(OrderPlan {
        side: Side::Buy,
        shares,
        execution_price,
        commission: calculate_commission(shares, execution_price, commission_rate),
    })
}

/// Prices a full exit of `shares`.
pub fn plan_exit(shares: u64, close: f64, slippage_rate: f64, commission_rate: f64) -> OrderPlan {
    let execution_price = apply_slippage(close, Side::Sell, slippage_rate);
    OrderPlan {
        side: Side::Sell,
        shares,
        execution_price,
        commission: calculate_commission(shares, execution_price, commission_rate),
    }
}
