//! CLI integration tests against real files on disk.
//!
//! Tests cover:
//! - Each subcommand end to end through `cli::run`
//! - Exit codes for configuration, strategy and missing-data failures
//! - Report files produced by `backtest` and `compare`

mod common;

use clap::Parser;
use common::*;
use signalbench::cli::{self, Cli};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tempfile::TempDir;

fn same_code(actual: ExitCode, expected: ExitCode) -> bool {
    format!("{actual:?}") == format!("{expected:?}")
}

fn write_prices(dir: &Path, symbol: &str, closes: &[f64]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for bar in bars_from_closes(closes) {
        writeln!(
            content,
            "{},{},{},{},{},{}",
            bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume
        )
        .unwrap();
    }
    fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("data")).unwrap();
        write_prices(&dir.path().join("data"), "WAVE", &wave_closes(300));
        write_prices(&dir.path().join("data"), "RAMP", &(1..=300).map(f64::from).collect::<Vec<_>>());
        Self { dir }
    }

    fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    fn out_dir(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn config(&self, body: &str) -> PathBuf {
        let path = self.dir.path().join("config.ini");
        let content = format!(
            "[data]\ndata_dir = {}\nsymbol = WAVE\n\n{}",
            self.data_dir().display(),
            body
        );
        fs::write(&path, content).unwrap();
        path
    }

    fn run(&self, args: &[&str]) -> ExitCode {
        let mut argv = vec!["signalbench"];
        argv.extend_from_slice(args);
        cli::run(Cli::parse_from(argv))
    }
}

const STRATEGIES: &str = r#"
[backtest]
initial_capital = 25000
strategies = fast, rsi

[strategy.fast]
type = ma_crossover
short_window = 5
long_window = 20

[strategy.rsi]
type = rsi
period = 14
"#;

mod backtest_command {
    use super::*;

    #[test]
    fn writes_reports_to_output_dir() {
        let ws = Workspace::new();
        let config = ws.config(STRATEGIES);
        let out = ws.out_dir();

        let code = ws.run(&[
            "backtest",
            "-c",
            config.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
        ]);

        assert!(same_code(code, ExitCode::SUCCESS));
        for file in ["equity_curve.csv", "trades.csv", "round_trips.csv", "summary.csv"] {
            assert!(out.join(file).exists(), "{file} missing");
        }
        let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
        assert!(summary.contains("strategy,MA Crossover (5/20)"));
        assert!(summary.contains("initial_capital,25000.00"));
    }

    #[test]
    fn report_dir_from_config() {
        let ws = Workspace::new();
        let out = ws.out_dir();
        let config = ws.config(&format!(
            "{STRATEGIES}\n[report]\noutput_dir = {}\n",
            out.display()
        ));

        let code = ws.run(&["backtest", "-c", config.to_str().unwrap(), "-s", "rsi"]);

        assert!(same_code(code, ExitCode::SUCCESS));
        let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
        assert!(summary.contains("RSI Strategy (Period=14)"));
    }

    #[test]
    fn symbol_override_reads_other_file() {
        let ws = Workspace::new();
        let config = ws.config(STRATEGIES);
        let out = ws.out_dir();

        let code = ws.run(&[
            "backtest",
            "-c",
            config.to_str().unwrap(),
            "--symbol",
            "ramp",
            "-o",
            out.to_str().unwrap(),
        ]);

        assert!(same_code(code, ExitCode::SUCCESS));
        let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
        assert!(summary.contains("symbol,RAMP"));
    }

    #[test]
    fn missing_symbol_file_exits_no_data() {
        let ws = Workspace::new();
        let config = ws.config(STRATEGIES);

        let code = ws.run(&["backtest", "-c", config.to_str().unwrap(), "--symbol", "NONE"]);

        assert!(same_code(code, ExitCode::from(5)));
    }

    #[test]
    fn invalid_strategy_exits_with_strategy_code() {
        let ws = Workspace::new();
        let config = ws.config(
            "[backtest]\nstrategies = bad\n\n[strategy.bad]\ntype = ma_crossover\nshort_window = 30\nlong_window = 10\n",
        );

        let code = ws.run(&["backtest", "-c", config.to_str().unwrap()]);

        assert!(same_code(code, ExitCode::from(4)));
    }

    #[test]
    fn missing_config_file_exits_config_code() {
        let ws = Workspace::new();
        let missing = ws.dir.path().join("absent.ini");

        let code = ws.run(&["backtest", "-c", missing.to_str().unwrap()]);

        assert!(same_code(code, ExitCode::from(2)));
    }
}

mod compare_command {
    use super::*;

    #[test]
    fn writes_comparison_with_failed_rows() {
        let ws = Workspace::new();
        let config = ws.config(&format!(
            "{}\n[strategy.bad]\ntype = rsi\noversold = 90\noverbought = 10\n",
            STRATEGIES.replace("strategies = fast, rsi", "strategies = fast, rsi, bad")
        ));
        let out = ws.out_dir();

        let code = ws.run(&[
            "compare",
            "-c",
            config.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
        ]);

        assert!(same_code(code, ExitCode::SUCCESS));
        let content = fs::read_to_string(out.join("comparison.csv")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("MA Crossover (5/20),ok,"));
        assert!(lines[2].starts_with("RSI Strategy (Period=14),ok,"));
        assert!(lines[3].contains(",failed,"));
    }

    #[test]
    fn all_failures_exit_nonzero() {
        let ws = Workspace::new();
        let config = ws.config(
            "[backtest]\nstrategies = bad\n\n[strategy.bad]\ntype = bollinger\nperiod = 1\n",
        );

        let code = ws.run(&["compare", "-c", config.to_str().unwrap()]);

        assert!(same_code(code, ExitCode::from(4)));
    }
}

mod other_commands {
    use super::*;

    #[test]
    fn validate_accepts_good_config() {
        let ws = Workspace::new();
        let config = ws.config(STRATEGIES);
        let code = ws.run(&["validate", "-c", config.to_str().unwrap()]);
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[test]
    fn validate_rejects_bad_backtest_value() {
        let ws = Workspace::new();
        let config = ws.config(&STRATEGIES.replace("initial_capital = 25000", "initial_capital = -5"));
        let code = ws.run(&["validate", "-c", config.to_str().unwrap()]);
        assert!(same_code(code, ExitCode::from(2)));
    }

    #[test]
    fn validate_rejects_unknown_strategy_type() {
        let ws = Workspace::new();
        let config = ws.config("[backtest]\nstrategies = x\n\n[strategy.x]\ntype = tarot\n");
        let code = ws.run(&["validate", "-c", config.to_str().unwrap()]);
        assert!(same_code(code, ExitCode::from(2)));
    }

    #[test]
    fn indicators_runs_on_configured_symbol() {
        let ws = Workspace::new();
        let config = ws.config(STRATEGIES);
        let code = ws.run(&["indicators", "-c", config.to_str().unwrap()]);
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[test]
    fn list_symbols_succeeds() {
        let ws = Workspace::new();
        let config = ws.config(STRATEGIES);
        let code = ws.run(&["list-symbols", "-c", config.to_str().unwrap()]);
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[test]
    fn list_symbols_needs_data_dir() {
        let ws = Workspace::new();
        let path = ws.dir.path().join("bare.ini");
        fs::write(&path, "[backtest]\nstrategies = a\n").unwrap();
        let code = ws.run(&["list-symbols", "-c", path.to_str().unwrap()]);
        assert!(same_code(code, ExitCode::from(2)));
    }
}
