#![allow(dead_code)]

use chrono::NaiveDate;
use signalbench::domain::backtest::BacktestConfig;
use signalbench::domain::error::SignalbenchError;
pub use signalbench::domain::ohlcv::OhlcvBar;
use signalbench::domain::price_frame::PriceFrame;
use signalbench::domain::strategy::Strategy;
use signalbench::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, SignalbenchError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SignalbenchError::Data {
                reason: reason.clone(),
            });
        }
        let bars = self.data.get(symbol).ok_or_else(|| SignalbenchError::NoData {
            symbol: symbol.to_string(),
        })?;
        Ok(bars
            .iter()
            .filter(|b| start_date.is_none_or(|s| b.date >= s))
            .filter(|b| end_date.is_none_or(|e| b.date <= e))
            .cloned()
            .collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, SignalbenchError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date_str: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        date: NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000,
    }
}

/// One bar per calendar day starting 2024-01-01, priced at `closes`.
pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            date: start + chrono::Days::new(i as u64),
            open: close,
            high: close + 0.5,
            low: (close - 0.5).max(0.01),
            close,
            volume: 1000 + (i as u64 % 7) * 100,
        })
        .collect()
}

/// Linear ramp of `count` bars.
pub fn generate_bars(start_date: &str, count: usize, start_price: f64) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| OhlcvBar {
            date: start + chrono::Duration::days(i as i64),
            open: start_price + i as f64,
            high: start_price + i as f64 + 1.0,
            low: start_price + i as f64 - 1.0,
            close: start_price + i as f64,
            volume: 1000,
        })
        .collect()
}

/// Deterministic oscillating series that produces several crossings.
pub fn wave_closes(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            100.0 + 10.0 * (t / 8.0).sin() + 3.0 * (t / 3.0).cos() + t * 0.05
        })
        .collect()
}

/// Frame with the standard set plus whatever `strategy` needs.
pub fn frame_for(symbol: &str, bars: Vec<OhlcvBar>, strategy: &Strategy) -> PriceFrame {
    let mut frame = PriceFrame::with_all_indicators(symbol, bars);
    frame.ensure_indicators(&strategy.required_indicators());
    frame
}

pub fn frictionless_config() -> BacktestConfig {
    BacktestConfig {
        initial_capital: 100_000.0,
        commission_rate: 0.0,
        slippage_rate: 0.0,
        position_fraction: 0.95,
        risk_free_rate: 0.02,
    }
}
