//! Volume-weighted average price, accumulated from the first bar.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

/// VWAP[i] = Σ(typical·volume) / Σvolume over bars 0..=i; undefined while the
/// cumulative volume is zero.
pub fn calculate_vwap(bars: &[OhlcvBar]) -> IndicatorSeries {
    let mut pv = 0.0;
    let mut vol = 0.0;
    let raw: Vec<f64> = bars
        .iter()
        .map(|bar| {
            pv += bar.typical_price() * bar.volume as f64;
            vol += bar.volume as f64;
            if vol > 0.0 { pv / vol } else { f64::NAN }
        })
        .collect();

    IndicatorSeries::from_values(IndicatorType::Vwap, bars, &raw)
}
