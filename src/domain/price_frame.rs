//! One symbol's bars plus the indicator series computed over them.

use crate::domain::error::SignalbenchError;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::{add_all_indicators, compute_indicator};
use crate::domain::ohlcv::{first_unordered_index, OhlcvBar};
use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct PriceFrame {
    pub symbol: String,
    pub bars: Vec<OhlcvBar>,
    pub indicators: HashMap<IndicatorType, IndicatorSeries>,
    pub date_index: HashMap<NaiveDate, usize>,
}

impl PriceFrame {
    pub fn new(symbol: impl Into<String>, bars: Vec<OhlcvBar>) -> Self {
        let date_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();
        Self {
            symbol: symbol.into(),
            bars,
            indicators: HashMap::new(),
            date_index,
        }
    }

    /// Frame with the standard indicator set attached.
    pub fn with_all_indicators(symbol: impl Into<String>, bars: Vec<OhlcvBar>) -> Self {
        let mut frame = Self::new(symbol, bars);
        frame.indicators = add_all_indicators(&frame.bars);
        frame
    }

    /// Computes any of `types` not already attached.
    pub fn ensure_indicators(&mut self, types: &[IndicatorType]) {
        for ind in types {
            if !self.indicators.contains_key(ind) {
                let series = compute_indicator(&self.bars, ind);
                self.indicators.insert(ind.clone(), series);
            }
        }
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get_bar(&self, date: NaiveDate) -> Option<&OhlcvBar> {
        self.date_index.get(&date).map(|&i| &self.bars[i])
    }

    pub fn close(&self, i: usize) -> f64 {
        self.bars.get(i).map_or(f64::NAN, |b| b.close)
    }

    pub fn indicator(&self, ind: &IndicatorType) -> Option<&IndicatorSeries> {
        self.indicators.get(ind)
    }

    /// Looks up a series a strategy depends on.
    pub fn require(
        &self,
        strategy: &str,
        ind: &IndicatorType,
    ) -> Result<&IndicatorSeries, SignalbenchError> {
        self.indicators
            .get(ind)
            .filter(|series| series.len() == self.bars.len())
            .ok_or_else(|| SignalbenchError::MissingIndicator {
                strategy: strategy.to_string(),
                indicator: ind.to_string(),
            })
    }

    /// Rejects an empty series or dates that are not strictly ascending.
    pub fn validate_for_simulation(&self) -> Result<(), SignalbenchError> {
        if self.bars.is_empty() {
            return Err(SignalbenchError::EmptySeries {
                symbol: self.symbol.clone(),
            });
        }
        if let Some(index) = first_unordered_index(&self.bars) {
            return Err(SignalbenchError::UnorderedDates {
                symbol: self.symbol.clone(),
                index,
                date: self.bars[index].date,
            });
        }
        Ok(())
    }
}
