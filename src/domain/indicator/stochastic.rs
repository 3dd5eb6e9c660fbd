//! Stochastic Oscillator indicator.
//!
//! %K = 100 × (C - LL(n)) / (HH(n) - LL(n))
//! %D = SMA(%K, d)
//!
//! A zero high-low range leaves %K undefined. Warmup: first (k-1) bars for %K
//! and (k+d-2) bars for %D.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::indicator_helpers::{rolling_max, rolling_mean, rolling_min};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_stochastic(bars: &[OhlcvBar], k_period: usize, d_period: usize) -> IndicatorSeries {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let hh = rolling_max(&highs, k_period);
    let ll = rolling_min(&lows, k_period);

    let k: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let range = hh[i] - ll[i];
            if range.is_finite() && range != 0.0 {
                100.0 * (bar.close - ll[i]) / range
            } else {
                f64::NAN
            }
        })
        .collect();
    let d = rolling_mean(&k, d_period);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| IndicatorPoint {
            date: bar.date,
            valid: k[i].is_finite(),
            value: IndicatorValue::Stochastic { k: k[i], d: d[i] },
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Stochastic { k_period, d_period },
        values,
    }
}
