//! Bollinger Bands indicator.
//!
//! - Middle: SMA over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! StdDev is the sample standard deviation (divides by N-1).
//! Default parameters: period=20, multiplier=2.0. Warmup: first (period-1) bars.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::indicator_helpers::{closes, rolling_mean, rolling_std};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_bollinger(bars: &[OhlcvBar], period: usize, mult: f64) -> IndicatorSeries {
    let close = closes(bars);
    let middle = rolling_mean(&close, period);
    let stddev = rolling_std(&close, period);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let valid = middle[i].is_finite() && stddev[i].is_finite();
            let (upper, mid, lower) = if valid {
                (
                    middle[i] + mult * stddev[i],
                    middle[i],
                    middle[i] - mult * stddev[i],
                )
            } else {
                (f64::NAN, f64::NAN, f64::NAN)
            };
            IndicatorPoint {
                date: bar.date,
                valid,
                value: IndicatorValue::Bollinger {
                    upper,
                    middle: mid,
                    lower,
                },
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::bollinger(period, mult),
        values,
    }
}
