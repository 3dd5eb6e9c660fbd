//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as HashMap key)
//! - `IndicatorField`: Named scalar inside an `IndicatorValue`
//! - `IndicatorSeries`: A time series of indicator values, aligned 1:1 with the bars
//!
//! Undefined entries (warm-up, division by zero) carry `valid == false` and
//! NaN fields. Readers go through [`IndicatorSeries::field`], which yields NaN
//! for anything undefined so that every comparison against it is false.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod obv;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod vwap;

pub use adx::calculate_adx;
pub use atr::calculate_atr;
pub use bollinger::calculate_bollinger;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use obv::calculate_obv;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stochastic::calculate_stochastic;
pub use vwap::calculate_vwap;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

impl IndicatorPoint {
    /// Single-valued point; valid iff the value is finite.
    pub fn simple(date: NaiveDate, v: f64) -> Self {
        IndicatorPoint {
            date,
            valid: v.is_finite(),
            value: IndicatorValue::Simple(if v.is_finite() { v } else { f64::NAN }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Stochastic {
        k: f64,
        d: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorField {
    Value,
    MacdLine,
    MacdSignal,
    MacdHistogram,
    BollingerUpper,
    BollingerMiddle,
    BollingerLower,
    BollingerWidth,
    StochasticK,
    StochasticD,
}

impl IndicatorValue {
    /// Reads a named field; NaN when the field does not belong to this shape.
    pub fn get(&self, field: IndicatorField) -> f64 {
        match (self, field) {
            (IndicatorValue::Simple(v), IndicatorField::Value) => *v,
            (IndicatorValue::Macd { line, .. }, IndicatorField::MacdLine | IndicatorField::Value) => {
                *line
            }
            (IndicatorValue::Macd { signal, .. }, IndicatorField::MacdSignal) => *signal,
            (IndicatorValue::Macd { histogram, .. }, IndicatorField::MacdHistogram) => *histogram,
            (IndicatorValue::Bollinger { upper, .. }, IndicatorField::BollingerUpper) => *upper,
            (
                IndicatorValue::Bollinger { middle, .. },
                IndicatorField::BollingerMiddle | IndicatorField::Value,
            ) => *middle,
            (IndicatorValue::Bollinger { lower, .. }, IndicatorField::BollingerLower) => *lower,
            (IndicatorValue::Bollinger { upper, lower, .. }, IndicatorField::BollingerWidth) => {
                upper - lower
            }
            (IndicatorValue::Stochastic { k, .. }, IndicatorField::StochasticK | IndicatorField::Value) => {
                *k
            }
            (IndicatorValue::Stochastic { d, .. }, IndicatorField::StochasticD) => *d,
            _ => f64::NAN,
        }
    }
}

impl fmt::Display for IndicatorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorValue::Simple(v) => write!(f, "{:.4}", v),
            IndicatorValue::Macd {
                line,
                signal,
                histogram,
            } => write!(f, "line={:.4} signal={:.4} hist={:.4}", line, signal, histogram),
            IndicatorValue::Stochastic { k, d } => write!(f, "k={:.4} d={:.4}", k, d),
            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            } => write!(f, "upper={:.4} middle={:.4} lower={:.4}", upper, middle, lower),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Adx(usize),
    Obv,
    Vwap,
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Stochastic {
        k_period: usize,
        d_period: usize,
    },
    Bollinger {
        period: usize,
        /// `f64::to_bits` of the band multiplier, so the key stays hashable
        /// without rounding the multiplier.
        stddev_mult_bits: u64,
    },
}

impl IndicatorType {
    pub const fn bollinger(period: usize, std_mult: f64) -> Self {
        IndicatorType::Bollinger {
            period,
            stddev_mult_bits: std_mult.to_bits(),
        }
    }

    /// Band multiplier of a Bollinger key.
    pub fn stddev_mult(&self) -> Option<f64> {
        match self {
            IndicatorType::Bollinger {
                stddev_mult_bits, ..
            } => Some(f64::from_bits(*stddev_mult_bits)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Single-valued series from a raw column aligned with `bars`.
    pub fn from_values(
        indicator_type: IndicatorType,
        bars: &[crate::domain::ohlcv::OhlcvBar],
        raw: &[f64],
    ) -> Self {
        let values = bars
            .iter()
            .zip(raw)
            .map(|(bar, &v)| IndicatorPoint::simple(bar.date, v))
            .collect();
        IndicatorSeries {
            indicator_type,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Field at bar `i`; NaN when out of range or undefined.
    pub fn field(&self, i: usize, field: IndicatorField) -> f64 {
        match self.values.get(i) {
            Some(point) if point.valid => point.value.get(field),
            _ => f64::NAN,
        }
    }

    /// Shorthand for `field(i, IndicatorField::Value)`.
    pub fn value(&self, i: usize) -> f64 {
        self.field(i, IndicatorField::Value)
    }

    /// Last defined point, if any.
    pub fn last_valid(&self) -> Option<&IndicatorPoint> {
        self.values.iter().rev().find(|p| p.valid)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Adx(period) => write!(f, "ADX({})", period),
            IndicatorType::Obv => write!(f, "OBV"),
            IndicatorType::Vwap => write!(f, "VWAP"),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Stochastic { k_period, d_period } => {
                write!(f, "STOCHASTIC({},{})", k_period, d_period)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_bits,
            } => write!(f, "BOLLINGER({},{})", period, f64::from_bits(*stddev_mult_bits)),
        }
    }
}
