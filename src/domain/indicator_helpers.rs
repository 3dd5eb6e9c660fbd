//! Shared helper functions for indicator calculations.
//!
//! Rolling helpers operate on raw `f64` columns: a window that is incomplete
//! or that contains a non-finite input yields NaN.

use std::collections::HashMap;

use crate::domain::indicator::{
    calculate_adx, calculate_atr, calculate_bollinger, calculate_ema, calculate_macd,
    calculate_obv, calculate_rsi, calculate_sma, calculate_stochastic, calculate_vwap,
    IndicatorSeries, IndicatorType,
};
use crate::domain::ohlcv::OhlcvBar;

/// Indicators computed by [`add_all_indicators`].
pub const STANDARD_INDICATORS: [IndicatorType; 13] = [
    IndicatorType::Sma(10),
    IndicatorType::Sma(20),
    IndicatorType::Sma(50),
    IndicatorType::Ema(12),
    IndicatorType::Ema(26),
    IndicatorType::Rsi(14),
    IndicatorType::Macd {
        fast: 12,
        slow: 26,
        signal: 9,
    },
    IndicatorType::bollinger(20, 2.0),
    IndicatorType::Atr(14),
    IndicatorType::Stochastic {
        k_period: 14,
        d_period: 3,
    },
    IndicatorType::Obv,
    IndicatorType::Vwap,
    IndicatorType::Adx(14),
];

pub fn closes(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

fn rolling<F>(values: &[f64], period: usize, stat: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 {
        return out;
    }
    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        if window.iter().all(|v| v.is_finite()) {
            out[i] = stat(window);
        }
    }
    out
}

/// Trailing arithmetic mean.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Trailing sample standard deviation (ddof = 1); NaN for a window of one.
pub fn rolling_std(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| {
        if w.len() < 2 {
            return f64::NAN;
        }
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let var = w.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (w.len() - 1) as f64;
        var.sqrt()
    })
}

pub fn rolling_min(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

pub fn rolling_max(values: &[f64], period: usize) -> Vec<f64> {
    rolling(values, period, |w| {
        w.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

/// Recursive EMA with α = 2/(period+1), seeded with the first finite input.
/// Entries before the seed are NaN; a later non-finite input carries the
/// previous value forward.
pub fn ema_values(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 {
        return out;
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev: Option<f64> = None;
    for (i, &x) in values.iter().enumerate() {
        prev = match (prev, x.is_finite()) {
            (None, true) => Some(x),
            (Some(p), true) => Some(alpha * x + (1.0 - alpha) * p),
            (p, false) => p,
        };
        if let Some(p) = prev {
            out[i] = p;
        }
    }
    out
}

/// Computes a single indicator over the bars.
pub fn compute_indicator(bars: &[OhlcvBar], indicator: &IndicatorType) -> IndicatorSeries {
    match indicator {
        IndicatorType::Sma(p) => calculate_sma(bars, *p),
        IndicatorType::Ema(p) => calculate_ema(bars, *p),
        IndicatorType::Rsi(p) => calculate_rsi(bars, *p),
        IndicatorType::Atr(p) => calculate_atr(bars, *p),
        IndicatorType::Adx(p) => calculate_adx(bars, *p),
        IndicatorType::Obv => calculate_obv(bars),
        IndicatorType::Vwap => calculate_vwap(bars),
        IndicatorType::Macd { fast, slow, signal } => calculate_macd(bars, *fast, *slow, *signal),
        IndicatorType::Stochastic { k_period, d_period } => {
            calculate_stochastic(bars, *k_period, *d_period)
        }
        IndicatorType::Bollinger {
            period,
            stddev_mult_bits,
        } => calculate_bollinger(bars, *period, f64::from_bits(*stddev_mult_bits)),
    }
}

/// Computes an arbitrary set of indicators, keyed by type.
pub fn compute_indicators(
    bars: &[OhlcvBar],
    indicators: &[IndicatorType],
) -> HashMap<IndicatorType, IndicatorSeries> {
    indicators
        .iter()
        .map(|ind| (ind.clone(), compute_indicator(bars, ind)))
        .collect()
}

/// Computes the standard indicator set.
pub fn add_all_indicators(bars: &[OhlcvBar]) -> HashMap<IndicatorType, IndicatorSeries> {
    compute_indicators(bars, &STANDARD_INDICATORS)
}
