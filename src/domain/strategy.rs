//! Signal strategies.
//!
//! [`Strategy`] is a closed set of variants, each carrying its parameters.
//! Every variant maps a [`PriceFrame`] to a per-bar [`Signal`] series; the
//! Flat/Long position track, trade extraction and statistics are shared.
//!
//! Signals are edge-triggered: a Buy or Sell fires only on the bar where its
//! condition goes from false to true. NaN inputs never satisfy a comparison,
//! so warm-up bars never produce a crossing. When both fire on the same bar,
//! Sell wins.

use crate::domain::error::SignalbenchError;
use crate::domain::indicator::{IndicatorField, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::position::{
    calculate_positions, identify_trades, open_trade, summarize, OpenTrade, Position, Signal,
    StrategyTrade, SummaryStats,
};
use crate::domain::price_frame::PriceFrame;

const COMBINED_RSI: IndicatorType = IndicatorType::Rsi(14);
const COMBINED_MACD: IndicatorType = IndicatorType::Macd {
    fast: 12,
    slow: 26,
    signal: 9,
};
const COMBINED_BOLLINGER: IndicatorType = IndicatorType::bollinger(20, 2.0);

#[derive(Debug, Clone, PartialEq)]
pub struct MaCrossoverParams {
    pub short_window: usize,
    pub long_window: usize,
}

impl Default for MaCrossoverParams {
    fn default() -> Self {
        Self {
            short_window: 50,
            long_window: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RsiParams {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self {
            period: 14,
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RsiEnhancedParams {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
    pub trend_ma: usize,
}

impl Default for RsiEnhancedParams {
    fn default() -> Self {
        Self {
            period: 14,
            oversold: 30.0,
            overbought: 70.0,
            trend_ma: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerParams {
    pub period: usize,
    pub std_mult: f64,
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            period: 20,
            std_mult: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakoutParams {
    pub period: usize,
    pub std_mult: f64,
    pub squeeze_threshold: f64,
}

impl Default for BreakoutParams {
    fn default() -> Self {
        Self {
            period: 20,
            std_mult: 2.0,
            squeeze_threshold: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CombinedParams {
    pub oversold: f64,
    pub overbought: f64,
    pub min_signals: usize,
}

impl Default for CombinedParams {
    fn default() -> Self {
        Self {
            oversold: 30.0,
            overbought: 70.0,
            min_signals: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightedParams {
    pub rsi_weight: f64,
    pub macd_weight: f64,
    pub bb_weight: f64,
    pub threshold: f64,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for WeightedParams {
    fn default() -> Self {
        Self {
            rsi_weight: 1.0,
            macd_weight: 1.5,
            bb_weight: 1.0,
            threshold: 2.0,
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    MovingAverageCrossover(MaCrossoverParams),
    Rsi(RsiParams),
    RsiEnhanced(RsiEnhancedParams),
    BollingerBands(BollingerParams),
    BollingerBreakout(BreakoutParams),
    Combined(CombinedParams),
    WeightedCombined(WeightedParams),
}

/// Output of one strategy pass over a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyRun {
    pub signals: Vec<Signal>,
    pub positions: Vec<Position>,
    pub trades: Vec<StrategyTrade>,
    pub open_trade: Option<OpenTrade>,
}

impl StrategyRun {
    pub fn summary_stats(&self) -> SummaryStats {
        summarize(&self.trades)
    }
}

/// `a` moves strictly above `b`.
fn crosses_above(a: f64, b: f64, a_prev: f64, b_prev: f64) -> bool {
    a > b && a_prev <= b_prev
}

/// `a` moves strictly below `b`.
fn crosses_below(a: f64, b: f64, a_prev: f64, b_prev: f64) -> bool {
    a < b && a_prev >= b_prev
}

/// Combines per-bar buy/sell flags into signals; Sell wins a tie.
fn signals_from_flags(buy: &[bool], sell: &[bool]) -> Vec<Signal> {
    buy.iter()
        .zip(sell)
        .map(|(&b, &s)| match (b, s) {
            (_, true) => Signal::Sell,
            (true, false) => Signal::Buy,
            _ => Signal::Hold,
        })
        .collect()
}

/// True only where `cond` turns from false to true.
fn rising_edges(cond: &[bool]) -> Vec<bool> {
    cond.iter()
        .enumerate()
        .map(|(i, &c)| i > 0 && c && !cond[i - 1])
        .collect()
}

fn invalid(strategy: &Strategy, reason: impl Into<String>) -> SignalbenchError {
    SignalbenchError::InvalidParameter {
        strategy: strategy.name(),
        reason: reason.into(),
    }
}

impl Strategy {
    pub fn name(&self) -> String {
        match self {
            Strategy::MovingAverageCrossover(p) => {
                format!("MA Crossover ({}/{})", p.short_window, p.long_window)
            }
            Strategy::Rsi(p) => format!("RSI Strategy (Period={})", p.period),
            Strategy::RsiEnhanced(p) => {
                format!("Enhanced RSI Strategy (RSI={}, MA={})", p.period, p.trend_ma)
            }
            Strategy::BollingerBands(p) => {
                format!("Bollinger Bands Strategy (Period={}, Std={:?})", p.period, p.std_mult)
            }
            Strategy::BollingerBreakout(p) => format!("BB Breakout Strategy (Period={})", p.period),
            Strategy::Combined(p) => format!("Combined Strategy (Min Signals={})", p.min_signals),
            Strategy::WeightedCombined(_) => "Weighted Combined Strategy".to_string(),
        }
    }

    /// Parameter checks, run before any simulation.
    pub fn validate(&self) -> Result<(), SignalbenchError> {
        let check_levels = |oversold: f64, overbought: f64| {
            if !(0.0..=100.0).contains(&oversold) || !(0.0..=100.0).contains(&overbought) {
                return Err(invalid(self, "RSI levels must lie within [0, 100]"));
            }
            if oversold >= overbought {
                return Err(invalid(self, "oversold must be below overbought"));
            }
            Ok(())
        };
        let check_mult = |mult: f64| {
            if !mult.is_finite() || mult <= 0.0 {
                return Err(invalid(self, "std_mult must be positive"));
            }
            Ok(())
        };

        match self {
            Strategy::MovingAverageCrossover(p) => {
                if p.short_window == 0 || p.long_window == 0 {
                    return Err(invalid(self, "moving average windows must be positive"));
                }
                if p.short_window >= p.long_window {
                    return Err(invalid(self, "short_window must be below long_window"));
                }
            }
            Strategy::Rsi(p) => {
                if p.period == 0 {
                    return Err(invalid(self, "period must be positive"));
                }
                check_levels(p.oversold, p.overbought)?;
            }
            Strategy::RsiEnhanced(p) => {
                if p.period == 0 || p.trend_ma == 0 {
                    return Err(invalid(self, "period and trend_ma must be positive"));
                }
                check_levels(p.oversold, p.overbought)?;
            }
            Strategy::BollingerBands(p) => {
                if p.period < 2 {
                    return Err(invalid(self, "period must be at least 2"));
                }
                check_mult(p.std_mult)?;
            }
            Strategy::BollingerBreakout(p) => {
                if p.period < 2 {
                    return Err(invalid(self, "period must be at least 2"));
                }
                check_mult(p.std_mult)?;
                if !p.squeeze_threshold.is_finite() || p.squeeze_threshold <= 0.0 {
                    return Err(invalid(self, "squeeze_threshold must be positive"));
                }
            }
            Strategy::Combined(p) => {
                if !(1..=3).contains(&p.min_signals) {
                    return Err(invalid(self, "min_signals must be between 1 and 3"));
                }
                check_levels(p.oversold, p.overbought)?;
            }
            Strategy::WeightedCombined(p) => {
                let weights = [p.rsi_weight, p.macd_weight, p.bb_weight];
                if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                    return Err(invalid(self, "weights must be non-negative"));
                }
                if !p.threshold.is_finite() || p.threshold <= 0.0 {
                    return Err(invalid(self, "threshold must be positive"));
                }
                check_levels(p.oversold, p.overbought)?;
            }
        }
        Ok(())
    }

    /// Indicator series this variant reads from the frame.
    pub fn required_indicators(&self) -> Vec<IndicatorType> {
        match self {
            Strategy::MovingAverageCrossover(p) => vec![
                IndicatorType::Sma(p.short_window),
                IndicatorType::Sma(p.long_window),
            ],
            Strategy::Rsi(p) => vec![IndicatorType::Rsi(p.period)],
            Strategy::RsiEnhanced(p) => vec![
                IndicatorType::Rsi(p.period),
                IndicatorType::Sma(p.trend_ma),
            ],
            Strategy::BollingerBands(p) => vec![IndicatorType::bollinger(p.period, p.std_mult)],
            Strategy::BollingerBreakout(p) => {
                vec![IndicatorType::bollinger(p.period, p.std_mult)]
            }
            Strategy::Combined(_) | Strategy::WeightedCombined(_) => {
                vec![COMBINED_RSI, COMBINED_MACD, COMBINED_BOLLINGER]
            }
        }
    }

    fn series<'a>(
        &self,
        frame: &'a PriceFrame,
        ind: &IndicatorType,
    ) -> Result<&'a IndicatorSeries, SignalbenchError> {
        frame.require(&self.name(), ind)
    }

    pub fn generate_signals(&self, frame: &PriceFrame) -> Result<Vec<Signal>, SignalbenchError> {
        let n = frame.bar_count();
        let close = |i: usize| frame.close(i);

        let signals = match self {
            Strategy::MovingAverageCrossover(p) => {
                let short = self.series(frame, &IndicatorType::Sma(p.short_window))?;
                let long = self.series(frame, &IndicatorType::Sma(p.long_window))?;
                let (mut buy, mut sell) = (vec![false; n], vec![false; n]);
                for i in 1..n {
                    let (s, l) = (short.value(i), long.value(i));
                    let (sp, lp) = (short.value(i - 1), long.value(i - 1));
                    buy[i] = crosses_above(s, l, sp, lp);
                    sell[i] = crosses_below(s, l, sp, lp);
                }
                signals_from_flags(&buy, &sell)
            }
            Strategy::Rsi(p) => {
                let rsi = self.series(frame, &IndicatorType::Rsi(p.period))?;
                rsi_signals(rsi, p.oversold, p.overbought, |_| true)
            }
            Strategy::RsiEnhanced(p) => {
                let rsi = self.series(frame, &IndicatorType::Rsi(p.period))?;
                let trend = self.series(frame, &IndicatorType::Sma(p.trend_ma))?;
                rsi_signals(rsi, p.oversold, p.overbought, |i| close(i) > trend.value(i))
            }
            Strategy::BollingerBands(p) => {
                let bb = self.series(frame, &IndicatorType::bollinger(p.period, p.std_mult))?;
                let (mut buy, mut sell) = (vec![false; n], vec![false; n]);
                for i in 1..n {
                    let lower = bb.field(i, IndicatorField::BollingerLower);
                    let lower_prev = bb.field(i - 1, IndicatorField::BollingerLower);
                    let upper = bb.field(i, IndicatorField::BollingerUpper);
                    let upper_prev = bb.field(i - 1, IndicatorField::BollingerUpper);
                    buy[i] = close(i) <= lower && close(i - 1) > lower_prev;
                    sell[i] = close(i) >= upper && close(i - 1) < upper_prev;
                }
                signals_from_flags(&buy, &sell)
            }
            Strategy::BollingerBreakout(p) => {
                let bb = self.series(frame, &IndicatorType::bollinger(p.period, p.std_mult))?;
                let squeeze = |i: usize| {
                    bb.field(i, IndicatorField::BollingerWidth) / close(i) < p.squeeze_threshold
                };
                let (mut buy, mut sell) = (vec![false; n], vec![false; n]);
                for i in 1..n {
                    let upper = bb.field(i, IndicatorField::BollingerUpper);
                    let upper_prev = bb.field(i - 1, IndicatorField::BollingerUpper);
                    let middle = bb.field(i, IndicatorField::BollingerMiddle);
                    let middle_prev = bb.field(i - 1, IndicatorField::BollingerMiddle);
                    buy[i] = crosses_above(close(i), upper, close(i - 1), upper_prev)
                        && squeeze(i - 1);
                    sell[i] = crosses_below(close(i), middle, close(i - 1), middle_prev);
                }
                signals_from_flags(&buy, &sell)
            }
            Strategy::Combined(p) => {
                let votes = self.sub_signals(frame, p.oversold, p.overbought)?;
                let buy_cond: Vec<bool> = votes
                    .iter()
                    .map(|v| v.iter().filter(|s| **s > 0).count() >= p.min_signals)
                    .collect();
                let sell_cond: Vec<bool> = votes
                    .iter()
                    .map(|v| v.iter().filter(|s| **s < 0).count() >= p.min_signals)
                    .collect();
                signals_from_flags(&rising_edges(&buy_cond), &rising_edges(&sell_cond))
            }
            Strategy::WeightedCombined(p) => {
                let votes = self.sub_signals(frame, p.oversold, p.overbought)?;
                let scores: Vec<f64> = votes
                    .iter()
                    .map(|[rsi, macd, bb]| {
                        *rsi as f64 * p.rsi_weight
                            + *macd as f64 * p.macd_weight
                            + *bb as f64 * p.bb_weight
                    })
                    .collect();
                let buy_cond: Vec<bool> = scores.iter().map(|s| *s >= p.threshold).collect();
                let sell_cond: Vec<bool> = scores.iter().map(|s| *s <= -p.threshold).collect();
                signals_from_flags(&rising_edges(&buy_cond), &rising_edges(&sell_cond))
            }
        };
        Ok(signals)
    }

    /// Per-bar [RSI extreme, MACD crossover, band touch] votes in {-1, 0, +1}.
    fn sub_signals(
        &self,
        frame: &PriceFrame,
        oversold: f64,
        overbought: f64,
    ) -> Result<Vec<[i8; 3]>, SignalbenchError> {
        let rsi = self.series(frame, &COMBINED_RSI)?;
        let macd = self.series(frame, &COMBINED_MACD)?;
        let bb = self.series(frame, &COMBINED_BOLLINGER)?;

        let votes = (0..frame.bar_count())
            .map(|i| {
                let r = rsi.value(i);
                let rsi_vote = if r < oversold {
                    1
                } else if r > overbought {
                    -1
                } else {
                    0
                };

                let macd_vote = if i == 0 {
                    0
                } else {
                    let line = macd.field(i, IndicatorField::MacdLine);
                    let sig = macd.field(i, IndicatorField::MacdSignal);
                    let line_prev = macd.field(i - 1, IndicatorField::MacdLine);
                    let sig_prev = macd.field(i - 1, IndicatorField::MacdSignal);
                    if crosses_above(line, sig, line_prev, sig_prev) {
                        1
                    } else if crosses_below(line, sig, line_prev, sig_prev) {
                        -1
                    } else {
                        0
                    }
                };

                let c = frame.close(i);
                let bb_vote = if c <= bb.field(i, IndicatorField::BollingerLower) {
                    1
                } else if c >= bb.field(i, IndicatorField::BollingerUpper) {
                    -1
                } else {
                    0
                };

                [rsi_vote, macd_vote, bb_vote]
            })
            .collect();
        Ok(votes)
    }

    pub fn calculate_positions(&self, signals: &[Signal]) -> Vec<Position> {
        calculate_positions(signals)
    }

    pub fn identify_trades(&self, bars: &[OhlcvBar], positions: &[Position]) -> Vec<StrategyTrade> {
        identify_trades(bars, positions)
    }

    pub fn open_trade(&self, bars: &[OhlcvBar], positions: &[Position]) -> Option<OpenTrade> {
        open_trade(bars, positions)
    }

    /// Signals → positions → trades.
    pub fn run(&self, frame: &PriceFrame) -> Result<StrategyRun, SignalbenchError> {
        self.validate()?;
        let signals = self.generate_signals(frame)?;
        let positions = self.calculate_positions(&signals);
        let trades = self.identify_trades(&frame.bars, &positions);
        let open_trade = self.open_trade(&frame.bars, &positions);
        tracing::debug!(
            strategy = %self.name(),
            symbol = %frame.symbol,
            trades = trades.len(),
            open = open_trade.is_some(),
            "strategy run complete"
        );
        Ok(StrategyRun {
            signals,
            positions,
            trades,
            open_trade,
        })
    }
}

fn rsi_signals<F>(rsi: &IndicatorSeries, oversold: f64, overbought: f64, buy_filter: F) -> Vec<Signal>
where
    F: Fn(usize) -> bool,
{
    let n = rsi.len();
    let (mut buy, mut sell) = (vec![false; n], vec![false; n]);
    for i in 1..n {
        let (r, rp) = (rsi.value(i), rsi.value(i - 1));
        buy[i] = crosses_below(r, oversold, rp, oversold) && buy_filter(i);
        sell[i] = crosses_above(r, overbought, rp, overbought);
    }
    signals_from_flags(&buy, &sell)
}
