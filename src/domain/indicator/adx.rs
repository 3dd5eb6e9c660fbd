//! Average Directional Index indicator.
//!
//! up = H[i]-H[i-1], down = L[i-1]-L[i]
//! +DM = up if up > down and up > 0, else 0
//! -DM = down if down > up and down > 0, else 0
//! +DI = 100·SMA(+DM)/ATR, -DI = 100·SMA(-DM)/ATR
//! DX = 100·|+DI - -DI| / (+DI + -DI)
//! ADX = SMA(DX)
//!
//! Bar 0 contributes zero directional movement. All smoothing is the simple
//! rolling mean over n bars.

use crate::domain::indicator::atr::true_ranges;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::rolling_mean;
use crate::domain::ohlcv::OhlcvBar;

/// (+DM, -DM) per bar.
pub fn directional_movement(bars: &[OhlcvBar]) -> (Vec<f64>, Vec<f64>) {
    let mut plus = vec![0.0; bars.len()];
    let mut minus = vec![0.0; bars.len()];
    for i in 1..bars.len() {
        let up = bars[i].high - bars[i - 1].high;
        let down = bars[i - 1].low - bars[i].low;
        if up > down && up > 0.0 {
            plus[i] = up;
        }
        if down > up && down > 0.0 {
            minus[i] = down;
        }
    }
    (plus, minus)
}

pub fn calculate_adx(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let atr = rolling_mean(&true_ranges(bars), period);
    let (plus_dm, minus_dm) = directional_movement(bars);
    let plus_sm = rolling_mean(&plus_dm, period);
    let minus_sm = rolling_mean(&minus_dm, period);

    let dx: Vec<f64> = (0..bars.len())
        .map(|i| {
            let plus_di = 100.0 * plus_sm[i] / atr[i];
            let minus_di = 100.0 * minus_sm[i] / atr[i];
            let sum = plus_di + minus_di;
            if sum.is_finite() && sum != 0.0 {
                100.0 * (plus_di - minus_di).abs() / sum
            } else {
                f64::NAN
            }
        })
        .collect();
    let raw = rolling_mean(&dx, period);

    IndicatorSeries::from_values(IndicatorType::Adx(period), bars, &raw)
}
