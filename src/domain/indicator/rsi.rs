//! RSI (Relative Strength Index) indicator.
//!
//! Average gain/loss are simple rolling means over the last n close-to-close
//! changes (not Wilder's smoothing):
//!
//! RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//!
//! Warmup: first n bars are invalid. When avg_loss == 0 the ratio is
//! undefined and so is the RSI.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::rolling_mean;
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let mut gains = vec![f64::NAN; bars.len()];
    let mut losses = vec![f64::NAN; bars.len()];
    for i in 1..bars.len() {
        let change = bars[i].close - bars[i - 1].close;
        gains[i] = change.max(0.0);
        losses[i] = (-change).max(0.0);
    }

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    let raw: Vec<f64> = avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(&g, &l)| {
            if l == 0.0 || !l.is_finite() || !g.is_finite() {
                f64::NAN
            } else {
                100.0 - 100.0 / (1.0 + g / l)
            }
        })
        .collect();

    IndicatorSeries::from_values(IndicatorType::Rsi(period), bars, &raw)
}
