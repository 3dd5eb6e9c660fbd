//! Average True Range indicator.
//!
//! TR[0] = high - low; TR[i] = max(high-low, |high-C[i-1]|, |low-C[i-1]|).
//! ATR = rolling mean of TR over n bars.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::rolling_mean;
use crate::domain::ohlcv::OhlcvBar;

pub fn true_ranges(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect()
}

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let raw = rolling_mean(&true_ranges(bars), period);
    IndicatorSeries::from_values(IndicatorType::Atr(period), bars, &raw)
}
