//! Report generation port trait.

use crate::domain::backtest::{BacktestResults, StrategyOutcome};
use crate::domain::error::SignalbenchError;
use std::path::Path;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(&self, results: &BacktestResults, output_dir: &Path) -> Result<(), SignalbenchError>;

    /// One row per batch entry; failed entries carry their error.
    fn write_comparison(
        &self,
        outcomes: &[StrategyOutcome],
        output_dir: &Path,
    ) -> Result<(), SignalbenchError>;
}
