//! CSV report adapter implementing ReportPort.
//!
//! A single run writes `equity_curve.csv`, `trades.csv`, `round_trips.csv`
//! and `summary.csv`; a batch writes `comparison.csv`.

use crate::domain::backtest::{BacktestResults, StrategyOutcome};
use crate::domain::error::SignalbenchError;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

pub const EQUITY_CURVE_FILE: &str = "equity_curve.csv";
pub const TRADES_FILE: &str = "trades.csv";
pub const ROUND_TRIPS_FILE: &str = "round_trips.csv";
pub const SUMMARY_FILE: &str = "summary.csv";
pub const COMPARISON_FILE: &str = "comparison.csv";

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvReportAdapter;

#[derive(Serialize)]
struct SummaryRow<'a> {
    metric: &'a str,
    value: String,
}

#[derive(Serialize)]
struct ComparisonRow<'a> {
    strategy: &'a str,
    status: &'static str,
    final_value: Option<f64>,
    total_return: Option<f64>,
    annual_return: Option<f64>,
    volatility: Option<f64>,
    sharpe_ratio: Option<f64>,
    max_drawdown: Option<f64>,
    total_trades: Option<usize>,
    error: Option<String>,
}

impl<'a> ComparisonRow<'a> {
    fn from_outcome(outcome: &'a StrategyOutcome) -> Self {
        match &outcome.result {
            Ok(results) => {
                let m = &results.metrics;
                ComparisonRow {
                    strategy: &outcome.name,
                    status: "ok",
                    final_value: Some(m.final_value),
                    total_return: Some(m.total_return),
                    annual_return: Some(m.annual_return),
                    volatility: Some(m.volatility),
                    sharpe_ratio: Some(m.sharpe_ratio),
                    max_drawdown: Some(m.max_drawdown),
                    total_trades: Some(m.total_trades),
                    error: None,
                }
            }
            Err(e) => ComparisonRow {
                strategy: &outcome.name,
                status: "failed",
                final_value: None,
                total_return: None,
                annual_return: None,
                volatility: None,
                sharpe_ratio: None,
                max_drawdown: None,
                total_trades: None,
                error: Some(e.to_string()),
            },
        }
    }
}

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<(), SignalbenchError> {
    let report_err = |e: csv::Error| SignalbenchError::Report {
        reason: format!("failed to write {}: {}", path.display(), e),
    };
    let mut wtr = csv::Writer::from_path(path).map_err(report_err)?;
    for row in rows {
        wtr.serialize(row).map_err(report_err)?;
    }
    wtr.flush()?;
    Ok(())
}

fn ensure_dir(dir: &Path) -> Result<(), SignalbenchError> {
    fs::create_dir_all(dir).map_err(|e| SignalbenchError::Report {
        reason: format!("failed to create {}: {}", dir.display(), e),
    })
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, results: &BacktestResults, output_dir: &Path) -> Result<(), SignalbenchError> {
        ensure_dir(output_dir)?;

        write_rows(&output_dir.join(EQUITY_CURVE_FILE), results.equity_curve())?;
        write_rows(&output_dir.join(TRADES_FILE), results.trades_history())?;
        write_rows(&output_dir.join(ROUND_TRIPS_FILE), &results.run.trades)?;

        let mut summary = vec![
            SummaryRow {
                metric: "symbol",
                value: results.symbol.clone(),
            },
            SummaryRow {
                metric: "strategy",
                value: results.strategy_name.clone(),
            },
        ];
        summary.extend(
            results
                .summary()
                .into_iter()
                .map(|(metric, value)| SummaryRow { metric, value }),
        );
        write_rows(&output_dir.join(SUMMARY_FILE), summary)?;

        info!(dir = %output_dir.display(), strategy = %results.strategy_name, "reports written");
        Ok(())
    }

    fn write_comparison(
        &self,
        outcomes: &[StrategyOutcome],
        output_dir: &Path,
    ) -> Result<(), SignalbenchError> {
        ensure_dir(output_dir)?;
        write_rows(
            &output_dir.join(COMPARISON_FILE),
            outcomes.iter().map(ComparisonRow::from_outcome),
        )?;
        info!(dir = %output_dir.display(), rows = outcomes.len(), "comparison written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::{BacktestConfig, BacktestEngine};
    use crate::domain::ohlcv::OhlcvBar;
    use crate::domain::price_frame::PriceFrame;
    use crate::domain::strategy::{MaCrossoverParams, Strategy};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn frame() -> PriceFrame {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let closes = [10.0, 9.0, 8.0, 9.0, 11.0, 12.0, 11.0, 9.0, 8.0, 7.0];
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| OhlcvBar {
                date: start + chrono::Days::new(i as u64),
                open: c,
                high: c + 0.5,
                low: c - 0.5,
                close: c,
                volume: 1_000,
            })
            .collect();
        PriceFrame::with_all_indicators("TEST", bars)
    }

    fn strategy() -> Strategy {
        Strategy::MovingAverageCrossover(MaCrossoverParams {
            short_window: 2,
            long_window: 3,
        })
    }

    #[test]
    fn write_creates_all_files() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested").join("run");
        let mut f = frame();
        f.ensure_indicators(&strategy().required_indicators());
        let results = BacktestEngine::new(BacktestConfig::default())
            .run(&f, &strategy())
            .unwrap();

        CsvReportAdapter.write(&results, &out).unwrap();

        for name in [EQUITY_CURVE_FILE, TRADES_FILE, ROUND_TRIPS_FILE, SUMMARY_FILE] {
            assert!(out.join(name).exists(), "{name} missing");
        }

        let equity = fs::read_to_string(out.join(EQUITY_CURVE_FILE)).unwrap();
        let mut lines = equity.lines();
        assert_eq!(lines.next(), Some("date,cash,positions_value,total_value"));
        assert_eq!(lines.count(), 10);

        let trades = fs::read_to_string(out.join(TRADES_FILE)).unwrap();
        assert!(trades.starts_with("date,symbol,side,shares,price,commission,amount,cash_after"));
        assert!(trades.contains(",BUY,"));

        let summary = fs::read_to_string(out.join(SUMMARY_FILE)).unwrap();
        assert!(summary.starts_with("metric,value"));
        assert!(summary.contains("strategy,MA Crossover (2/3)"));
        assert!(summary.contains("max_drawdown,"));
    }

    #[test]
    fn comparison_includes_failures() {
        let dir = TempDir::new().unwrap();
        let mut f = frame();
        f.ensure_indicators(&strategy().required_indicators());
        let ok = BacktestEngine::new(BacktestConfig::default())
            .run(&f, &strategy())
            .unwrap();
        let outcomes = vec![
            StrategyOutcome {
                name: ok.strategy_name.clone(),
                result: Ok(ok),
            },
            StrategyOutcome {
                name: "broken".to_string(),
                result: Err(SignalbenchError::InvalidParameter {
                    strategy: "broken".to_string(),
                    reason: "period must be positive".to_string(),
                }),
            },
        ];

        CsvReportAdapter
            .write_comparison(&outcomes, dir.path())
            .unwrap();

        let content = fs::read_to_string(dir.path().join(COMPARISON_FILE)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("strategy,status,final_value"));
        assert!(lines[1].contains(",ok,"));
        assert!(lines[2].starts_with("broken,failed,,"));
        assert!(lines[2].contains("period must be positive"));
    }
}
