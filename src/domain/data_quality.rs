//! Price series cleaning and validation.
//!
//! `validate_bars` reports problems without changing anything;
//! `clean_bars` is the tolerance layer that repairs what it can.

use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Volume above mean + this many sample deviations counts as an outlier.
const VOLUME_OUTLIER_SIGMAS: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DataIssue {
    NotChronological { index: usize },
    DuplicateDates { count: usize },
    HighBelowLow { count: usize },
    CloseOutsideRange { count: usize },
    NonFiniteValues { count: usize },
}

impl DataIssue {
    /// Issues that make the series unusable as-is.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            DataIssue::CloseOutsideRange { .. } | DataIssue::NotChronological { .. }
        )
    }
}

impl fmt::Display for DataIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataIssue::NotChronological { index } => {
                write!(f, "dates are not in chronological order (first at row {index})")
            }
            DataIssue::DuplicateDates { count } => write!(f, "{count} duplicate dates"),
            DataIssue::HighBelowLow { count } => {
                write!(f, "{count} rows where high is less than low")
            }
            DataIssue::CloseOutsideRange { count } => {
                write!(f, "{count} rows where close is outside high-low range")
            }
            DataIssue::NonFiniteValues { count } => {
                write!(f, "{count} rows with missing or non-finite prices")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataQualityReport {
    pub is_valid: bool,
    pub rows: usize,
    pub issues: Vec<DataIssue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub output_rows: usize,
    pub duplicates_removed: usize,
    pub values_filled: usize,
    pub nonpositive_close_removed: usize,
    pub volume_outliers: usize,
}

/// Descriptive statistics of a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSummary {
    pub rows: usize,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub close_min: f64,
    pub close_max: f64,
    pub close_mean: f64,
    pub close_std: f64,
    pub volume_mean: f64,
    pub returns_mean: f64,
    pub returns_std: f64,
}

fn prices_finite(bar: &OhlcvBar) -> bool {
    [bar.open, bar.high, bar.low, bar.close]
        .iter()
        .all(|v| v.is_finite())
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, f64::NAN);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var.sqrt())
}

pub fn validate_bars(bars: &[OhlcvBar]) -> DataQualityReport {
    let mut issues = Vec::new();

    if let Some(i) = bars.windows(2).position(|w| w[1].date < w[0].date) {
        issues.push(DataIssue::NotChronological { index: i + 1 });
    }

    let mut dates: Vec<NaiveDate> = bars.iter().map(|b| b.date).collect();
    dates.sort_unstable();
    let duplicates = dates.windows(2).filter(|w| w[0] == w[1]).count();
    if duplicates > 0 {
        issues.push(DataIssue::DuplicateDates { count: duplicates });
    }

    let non_finite = bars.iter().filter(|b| !prices_finite(b)).count();
    if non_finite > 0 {
        issues.push(DataIssue::NonFiniteValues { count: non_finite });
    }

    let high_below_low = bars.iter().filter(|b| b.high < b.low).count();
    if high_below_low > 0 {
        issues.push(DataIssue::HighBelowLow {
            count: high_below_low,
        });
    }

    let outside = bars
        .iter()
        .filter(|b| b.close > b.high || b.close < b.low)
        .count();
    if outside > 0 {
        issues.push(DataIssue::CloseOutsideRange { count: outside });
    }

    for issue in &issues {
        tracing::warn!(rows = bars.len(), "data quality: {}", issue);
    }

    DataQualityReport {
        is_valid: !issues.iter().any(DataIssue::is_fatal),
        rows: bars.len(),
        issues,
    }
}

/// Drops duplicate dates (first occurrence kept), sorts ascending,
/// forward- then backward-fills non-finite prices, drops bars whose close is
/// not positive, and counts volume outliers (kept).
pub fn clean_bars(bars: &[OhlcvBar]) -> (Vec<OhlcvBar>, CleaningReport) {
    let mut report = CleaningReport {
        input_rows: bars.len(),
        ..Default::default()
    };

    let mut seen = std::collections::HashSet::new();
    let mut cleaned: Vec<OhlcvBar> = bars
        .iter()
        .filter(|b| seen.insert(b.date))
        .cloned()
        .collect();
    report.duplicates_removed = bars.len() - cleaned.len();

    cleaned.sort_by_key(|b| b.date);

    report.values_filled = fill_prices(&mut cleaned);

    let before = cleaned.len();
    cleaned.retain(|b| b.close > 0.0);
    report.nonpositive_close_removed = before - cleaned.len();

    let volumes: Vec<f64> = cleaned.iter().map(|b| b.volume as f64).collect();
    let (mean, std) = mean_std(&volumes);
    if std.is_finite() {
        let limit = mean + VOLUME_OUTLIER_SIGMAS * std;
        report.volume_outliers = volumes.iter().filter(|v| **v > limit).count();
    }

    report.output_rows = cleaned.len();
    tracing::debug!(?report, "cleaned price series");
    (cleaned, report)
}

/// Forward-fill then backward-fill each price column; returns the number of
/// values replaced.
fn fill_prices(bars: &mut [OhlcvBar]) -> usize {
    fn price_mut(bar: &mut OhlcvBar, column: usize) -> &mut f64 {
        match column {
            0 => &mut bar.open,
            1 => &mut bar.high,
            2 => &mut bar.low,
            _ => &mut bar.close,
        }
    }

    let mut filled = 0;
    for column in 0..4 {
        let mut last: Option<f64> = None;
        for bar in bars.iter_mut() {
            let v = price_mut(bar, column);
            if v.is_finite() {
                last = Some(*v);
            } else if let Some(prev) = last {
                *v = prev;
                filled += 1;
            }
        }
        let mut next: Option<f64> = None;
        for bar in bars.iter_mut().rev() {
            let v = price_mut(bar, column);
            if v.is_finite() {
                next = Some(*v);
            } else if let Some(after) = next {
                *v = after;
                filled += 1;
            }
        }
    }
    filled
}

pub fn summarize_bars(bars: &[OhlcvBar]) -> DataSummary {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();
    let returns = crate::domain::metrics::daily_returns(&closes);
    let (close_mean, close_std) = mean_std(&closes);
    let (volume_mean, _) = mean_std(&volumes);
    let (returns_mean, returns_std) = mean_std(&returns);

    DataSummary {
        rows: bars.len(),
        start: bars.first().map(|b| b.date),
        end: bars.last().map(|b| b.date),
        close_min: closes.iter().copied().fold(f64::NAN, f64::min),
        close_max: closes.iter().copied().fold(f64::NAN, f64::max),
        close_mean,
        close_std,
        volume_mean,
        returns_mean,
        returns_std,
    }
}
