//! CSV file data adapter.
//!
//! One file per symbol, `<base_path>/<SYMBOL>.csv`, with the header
//! `date,open,high,low,close,volume`. Empty price cells load as NaN so the
//! data-quality layer can see and repair them.

use crate::domain::error::SignalbenchError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<f64>,
}

impl CsvAdapter {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn to_bar(row: CsvRow, line: usize) -> Result<OhlcvBar, SignalbenchError> {
        let volume = match row.volume {
            None => 0,
            Some(v) if v.is_finite() && v >= 0.0 => v.round() as u64,
            Some(v) => {
                return Err(SignalbenchError::Data {
                    reason: format!("invalid volume value {} on line {}", v, line),
                });
            }
        };
        Ok(OhlcvBar {
            date: row.date,
            open: row.open.unwrap_or(f64::NAN),
            high: row.high.unwrap_or(f64::NAN),
            low: row.low.unwrap_or(f64::NAN),
            close: row.close.unwrap_or(f64::NAN),
            volume,
        })
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, SignalbenchError> {
        let path = self.csv_path(symbol);
        if !path.exists() {
            return Err(SignalbenchError::NoData {
                symbol: symbol.to_string(),
            });
        }
        let content = fs::read_to_string(&path).map_err(|e| SignalbenchError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (i, result) in rdr.deserialize::<CsvRow>().enumerate() {
            // header is line 1
            let line = i + 2;
            let row = result.map_err(|e| SignalbenchError::Data {
                reason: format!("{}: CSV parse error on line {}: {}", path.display(), line, e),
            })?;

            if start_date.is_some_and(|s| row.date < s) || end_date.is_some_and(|e| row.date > e) {
                continue;
            }
            bars.push(Self::to_bar(row, line)?);
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SignalbenchError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SignalbenchError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n";

        fs::write(path.join("BHP.csv"), csv_content).unwrap();
        fs::write(path.join("CBA.csv"), "date,open,high,low,close,volume\n").unwrap();
        fs::write(path.join("notes.txt"), "not a price file").unwrap();

        (dir, path)
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn fetch_ohlcv_returns_sorted_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_ohlcv("BHP", None, None).unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, d(15));
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[0].volume, 50000);
        assert_eq!(bars[2].date, d(17));
    }

    #[test]
    fn fetch_ohlcv_filters_date_range() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_ohlcv("BHP", Some(d(16)), Some(d(16))).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 110.0);

        let bars = adapter.fetch_ohlcv("BHP", Some(d(16)), None).unwrap();
        assert_eq!(bars.len(), 2);
    }

    #[test]
    fn fetch_ohlcv_empty_file() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert!(adapter.fetch_ohlcv("CBA", None, None).unwrap().is_empty());
    }

    #[test]
    fn fetch_ohlcv_missing_file_is_no_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        let err = adapter.fetch_ohlcv("XYZ", None, None).unwrap_err();
        assert!(matches!(err, SignalbenchError::NoData { symbol } if symbol == "XYZ"));
    }

    #[test]
    fn empty_price_cells_load_as_nan() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("GAP.csv"),
            "date,open,high,low,close,volume\n2024-01-15,1.0,2.0,0.5,,\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path());
        let bars = adapter.fetch_ohlcv("GAP", None, None).unwrap();
        assert!(bars[0].close.is_nan());
        assert_eq!(bars[0].volume, 0);
    }

    #[test]
    fn malformed_row_is_data_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("BAD.csv"),
            "date,open,high,low,close,volume\n15/01/2024,1,2,0.5,1.5,100\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path());
        let err = adapter.fetch_ohlcv("BAD", None, None).unwrap_err();
        assert!(matches!(err, SignalbenchError::Data { .. }));
    }

    #[test]
    fn list_symbols_returns_sorted_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert_eq!(adapter.list_symbols().unwrap(), vec!["BHP", "CBA"]);
    }

    #[test]
    fn list_symbols_missing_directory_fails() {
        let adapter = CsvAdapter::new("/nonexistent/signalbench/data");
        assert!(adapter.list_symbols().is_err());
    }
}
