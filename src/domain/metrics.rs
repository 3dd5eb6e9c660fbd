//! Performance metrics computed from a completed equity curve.

use super::portfolio::{EquityPoint, Portfolio};
use serde::Serialize;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub annual_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    /// Most negative (value - running peak) / running peak; 0 or below.
    pub max_drawdown: f64,
    pub max_drawdown_index: Option<usize>,
    /// Executed orders in the ledger, buys and sells counted separately.
    pub total_trades: usize,
    pub days_traded: usize,
    pub years: f64,
}

impl Metrics {
    pub fn compute(portfolio: &Portfolio, risk_free_rate: f64) -> Self {
        Self::from_curve(
            portfolio.equity_curve(),
            portfolio.initial_capital(),
            portfolio.trades_history().len(),
            risk_free_rate,
        )
    }

    pub fn from_curve(
        equity_curve: &[EquityPoint],
        initial_capital: f64,
        total_trades: usize,
        risk_free_rate: f64,
    ) -> Self {
        let values: Vec<f64> = equity_curve.iter().map(|p| p.total_value).collect();
        let final_value = values.last().copied().unwrap_or(initial_capital);

        let total_return = if initial_capital > 0.0 {
            (final_value - initial_capital) / initial_capital
        } else {
            0.0
        };

        let days_traded = values.len();
        let years = days_traded as f64 / TRADING_DAYS_PER_YEAR;
        let annual_return = if years > 0.0 && total_return > -1.0 {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else if years > 0.0 {
            -1.0
        } else {
            0.0
        };

        let volatility = annualized_volatility(&values);
        let sharpe_ratio = if volatility > 0.0 {
            (annual_return - risk_free_rate) / volatility
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_index) = compute_drawdown(&values);

        Metrics {
            initial_capital,
            final_value,
            total_return,
            annual_return,
            volatility,
            sharpe_ratio,
            max_drawdown,
            max_drawdown_index,
            total_trades,
            days_traded,
            years,
        }
    }

    /// Ordered key/value rows for display and export.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("initial_capital", format!("{:.2}", self.initial_capital)),
            ("final_value", format!("{:.2}", self.final_value)),
            ("total_return", format!("{:.6}", self.total_return)),
            ("annual_return", format!("{:.6}", self.annual_return)),
            ("volatility", format!("{:.6}", self.volatility)),
            ("sharpe_ratio", format!("{:.4}", self.sharpe_ratio)),
            ("max_drawdown", format!("{:.6}", self.max_drawdown)),
            (
                "max_drawdown_index",
                self.max_drawdown_index
                    .map_or_else(String::new, |i| i.to_string()),
            ),
            ("total_trades", self.total_trades.to_string()),
            ("days_traded", self.days_traded.to_string()),
            ("years", format!("{:.4}", self.years)),
        ]
    }
}

/// Percentage change between consecutive values; a non-positive base yields 0.
pub fn daily_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

/// Sample standard deviation of daily returns scaled by √252; 0 with fewer
/// than two returns.
pub fn annualized_volatility(values: &[f64]) -> f64 {
    let returns = daily_returns(values);
    if returns.len() < 2 {
        return 0.0;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt() * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Deepest drawdown against the running peak and the index where it occurs.
pub fn compute_drawdown(values: &[f64]) -> (f64, Option<usize>) {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    let mut worst_index = None;

    for (i, &v) in values.iter().enumerate() {
        if v > peak {
            peak = v;
        }
        if peak > 0.0 {
            let dd = (v - peak) / peak;
            if worst_index.is_none() || dd < worst {
                worst = dd;
                worst_index = Some(i);
            }
        }
    }

    (worst, worst_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn curve(values: &[f64]) -> Vec<EquityPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| EquityPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                cash: v,
                positions_value: 0.0,
                total_value: v,
            })
            .collect()
    }

    #[test]
    fn drawdown_example() {
        let (dd, idx) = compute_drawdown(&[100.0, 120.0, 90.0, 110.0]);
        assert!((dd + 0.25).abs() < 1e-12);
        assert_eq!(idx, Some(2));
    }

    #[test]
    fn drawdown_monotonic_rise_is_zero() {
        let (dd, idx) = compute_drawdown(&[100.0, 101.0, 102.0]);
        assert!(dd.abs() < f64::EPSILON);
        assert_eq!(idx, Some(0));
    }

    #[test]
    fn drawdown_empty() {
        assert_eq!(compute_drawdown(&[]), (0.0, None));
    }

    #[test]
    fn constant_curve_has_zero_sharpe() {
        let m = Metrics::from_curve(&curve(&[1000.0; 30]), 1000.0, 0, 0.02);
        assert!(m.volatility.abs() < f64::EPSILON);
        assert!(m.sharpe_ratio.abs() < f64::EPSILON);
        assert!(m.total_return.abs() < f64::EPSILON);
        assert!(m.annual_return.abs() < f64::EPSILON);
    }

    #[test]
    fn annual_return_compounds_over_years() {
        // 252 points = one year, so annual return equals total return
        let mut values = vec![100.0; 252];
        values[251] = 110.0;
        let m = Metrics::from_curve(&curve_long(&values), 100.0, 2, 0.02);
        assert!((m.years - 1.0).abs() < 1e-12);
        assert!((m.annual_return - 0.1).abs() < 1e-9);
        assert_eq!(m.days_traded, 252);
        assert_eq!(m.total_trades, 2);
    }

    fn curve_long(values: &[f64]) -> Vec<EquityPoint> {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| EquityPoint {
                date: start + chrono::Days::new(i as u64),
                cash: v,
                positions_value: 0.0,
                total_value: v,
            })
            .collect()
    }

    #[test]
    fn volatility_uses_sample_std() {
        // returns: +10%, -10%
        let vol = annualized_volatility(&[100.0, 110.0, 99.0]);
        let r = [0.1_f64, -0.1];
        let mean = (r[0] + r[1]) / 2.0;
        let var = ((r[0] - mean).powi(2) + (r[1] - mean).powi(2)) / 1.0;
        assert!((vol - var.sqrt() * 252.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn sharpe_sign_follows_excess_return() {
        let m = Metrics::from_curve(&curve(&[100.0, 90.0, 95.0, 85.0]), 100.0, 0, 0.02);
        assert!(m.volatility > 0.0);
        assert!(m.sharpe_ratio < 0.0);
        assert!((m.max_drawdown + 0.15).abs() < 1e-12);
        assert_eq!(m.max_drawdown_index, Some(3));
    }

    #[test]
    fn empty_curve_falls_back_to_initial_capital() {
        let m = Metrics::from_curve(&[], 5000.0, 0, 0.02);
        assert!((m.final_value - 5000.0).abs() < f64::EPSILON);
        assert!(m.annual_return.abs() < f64::EPSILON);
        assert_eq!(m.days_traded, 0);
        assert_eq!(m.max_drawdown_index, None);
    }

    #[test]
    fn to_pairs_order() {
        let m = Metrics::from_curve(&curve(&[100.0, 120.0, 90.0, 110.0]), 100.0, 0, 0.02);
        let keys: Vec<&str> = m.to_pairs().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys[0], "initial_capital");
        assert_eq!(keys[6], "max_drawdown");
        assert_eq!(keys.len(), 11);
    }
}
