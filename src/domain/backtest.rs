//! Backtest engine and event loop.
//!
//! [`BacktestEngine::run`] replays one strategy's signals bar by bar against
//! a fresh [`Portfolio`]; [`BacktestEngine::run_batch`] runs several
//! strategies over the same frame in parallel, each isolated from the
//! others' failures.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, info};

use super::error::SignalbenchError;
use super::execution::{plan_entry, plan_exit};
use super::metrics::Metrics;
use super::portfolio::{OrderResult, Portfolio};
use super::position::Signal;
use super::price_frame::PriceFrame;
use super::strategy::{Strategy, StrategyRun};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Fraction of trade value charged per order.
    pub commission_rate: f64,
    /// Fractional adverse price adjustment per order.
    pub slippage_rate: f64,
    /// Fraction of available cash committed to each entry.
    pub position_fraction: f64,
    pub risk_free_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 100_000.0,
            commission_rate: 0.001,
            slippage_rate: 0.0005,
            position_fraction: 0.95,
            risk_free_rate: 0.02,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), SignalbenchError> {
        let invalid = |key: &str, reason: &str| SignalbenchError::ConfigInvalid {
            section: "backtest".to_string(),
            key: key.to_string(),
            reason: reason.to_string(),
        };
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(invalid("initial_capital", "initial_capital must be positive"));
        }
        if !(0.0..1.0).contains(&self.commission_rate) {
            return Err(invalid("commission_rate", "commission_rate must be in [0, 1)"));
        }
        if !(0.0..1.0).contains(&self.slippage_rate) {
            return Err(invalid("slippage_rate", "slippage_rate must be in [0, 1)"));
        }
        if !(self.position_fraction > 0.0 && self.position_fraction <= 1.0) {
            return Err(invalid("position_fraction", "position_fraction must be in (0, 1]"));
        }
        if !(0.0..1.0).contains(&self.risk_free_rate) {
            return Err(invalid("risk_free_rate", "risk_free_rate must be between 0 and 1"));
        }
        Ok(())
    }
}

/// Immutable output of one run.
#[derive(Debug, Clone)]
pub struct BacktestResults {
    pub symbol: String,
    pub strategy: Strategy,
    pub strategy_name: String,
    pub run: StrategyRun,
    pub portfolio: Portfolio,
    pub metrics: Metrics,
}

impl BacktestResults {
    pub fn equity_curve(&self) -> &[super::portfolio::EquityPoint] {
        self.portfolio.equity_curve()
    }

    pub fn trades_history(&self) -> &[super::portfolio::TradeRecord] {
        self.portfolio.trades_history()
    }

    pub fn summary(&self) -> Vec<(&'static str, String)> {
        self.metrics.to_pairs()
    }
}

/// One entry of a batch run, in input order.
#[derive(Debug)]
pub struct StrategyOutcome {
    pub name: String,
    pub result: Result<BacktestResults, SignalbenchError>,
}

#[derive(Debug, Clone, Default)]
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Self {
        BacktestEngine { config }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn run(
        &self,
        frame: &PriceFrame,
        strategy: &Strategy,
    ) -> Result<BacktestResults, SignalbenchError> {
        self.config.validate()?;
        frame.validate_for_simulation()?;
        strategy.validate()?;

        let name = strategy.name();
        info!(
            strategy = %name,
            symbol = %frame.symbol,
            bars = frame.bar_count(),
            "starting backtest"
        );

        let run = strategy.run(frame)?;
        let mut portfolio = Portfolio::new(self.config.initial_capital);
        let symbol = frame.symbol.as_str();

        for (i, bar) in frame.bars.iter().enumerate() {
            match run.signals[i] {
                Signal::Buy if !portfolio.has_position(symbol) => {
                    match plan_entry(
                        portfolio.cash(),
                        bar.close,
                        self.config.position_fraction,
                        self.config.slippage_rate,
                        self.config.commission_rate,
                    ) {
                        Some(plan) => {
                            let result = portfolio.buy(
                                symbol,
                                plan.shares,
                                plan.execution_price,
                                bar.date,
                                plan.commission,
                            );
                            log_order(&result, bar.date);
                        }
                        None => debug!(date = %bar.date, "buy skipped: position size is zero"),
                    }
                }
                Signal::Sell if portfolio.has_position(symbol) => {
                    let plan = plan_exit(
                        portfolio.get_position(symbol),
                        bar.close,
                        self.config.slippage_rate,
                        self.config.commission_rate,
                    );
                    let result = portfolio.sell(
                        symbol,
                        plan.shares,
                        plan.execution_price,
                        bar.date,
                        plan.commission,
                    );
                    log_order(&result, bar.date);
                }
                _ => {}
            }

            let prices = HashMap::from([(frame.symbol.clone(), bar.close)]);
            portfolio.record_equity(bar.date, &prices);
        }

        let metrics = Metrics::compute(&portfolio, self.config.risk_free_rate);
        info!(
            strategy = %name,
            final_value = metrics.final_value,
            total_return = metrics.total_return,
            orders = metrics.total_trades,
            "backtest complete"
        );

        Ok(BacktestResults {
            symbol: frame.symbol.clone(),
            strategy: strategy.clone(),
            strategy_name: name,
            run,
            portfolio,
            metrics,
        })
    }

    /// Runs every strategy independently over the same frame.
    pub fn run_batch(&self, frame: &PriceFrame, strategies: &[Strategy]) -> Vec<StrategyOutcome> {
        strategies
            .par_iter()
            .map(|strategy| StrategyOutcome {
                name: strategy.name(),
                result: self.run(frame, strategy),
            })
            .collect()
    }
}

fn log_order(result: &OrderResult, date: chrono::NaiveDate) {
    match result {
        OrderResult::Filled(record) => debug!(
            %date,
            side = %record.side,
            shares = record.shares,
            price = record.price,
            commission = record.commission,
            "order filled"
        ),
        OrderResult::Declined(reason) => debug!(%date, %reason, "order declined"),
    }
}
