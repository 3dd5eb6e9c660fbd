//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{BacktestEngine, BacktestResults, StrategyOutcome};
use crate::domain::config_validation::{
    backtest_config_from, configured_strategies, data_dir_from, data_settings_from,
    report_output_dir, validate_backtest_config, DataSettings, NamedStrategy,
};
use crate::domain::data_quality::{clean_bars, summarize_bars, validate_bars};
use crate::domain::error::SignalbenchError;
use crate::domain::indicator_helpers::STANDARD_INDICATORS;
use crate::domain::price_frame::PriceFrame;
use crate::domain::strategy::Strategy;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "signalbench", about = "Indicator signal strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one configured strategy
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        /// Strategy key from `[backtest] strategies`; defaults to the first
        #[arg(short, long)]
        strategy: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run every configured strategy and compare them
    Compare {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data quality and latest indicator values for a symbol
    Indicators {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            symbol,
            strategy,
            output,
        } => run_backtest(&config, symbol.as_deref(), strategy.as_deref(), output.as_deref()),
        Command::Compare {
            config,
            symbol,
            output,
        } => run_compare(&config, symbol.as_deref(), output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Indicators { config, symbol } => run_indicators(&config, symbol.as_deref()),
        Command::ListSymbols { config } => run_list_symbols(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| fail(&err))
}

fn fail(err: &SignalbenchError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

/// Symbol override wins over `[data] symbol`; symbols are upper-cased.
pub fn resolve_symbol(symbol_override: Option<&str>, settings: &DataSettings) -> String {
    symbol_override
        .unwrap_or(&settings.symbol)
        .trim()
        .to_uppercase()
}

/// Picks the strategy named by `key`, or the first configured one.
pub fn select_strategy<'a>(
    strategies: &'a [NamedStrategy],
    key: Option<&str>,
) -> Result<&'a NamedStrategy, SignalbenchError> {
    match key {
        None => strategies.first().ok_or_else(|| SignalbenchError::ConfigMissing {
            section: "backtest".to_string(),
            key: "strategies".to_string(),
        }),
        Some(key) => strategies
            .iter()
            .find(|s| s.key.eq_ignore_ascii_case(key))
            .ok_or_else(|| SignalbenchError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "strategies".to_string(),
                reason: format!("strategy '{}' is not configured", key),
            }),
    }
}

/// Fetches, checks and cleans one symbol's bars and attaches the standard
/// indicators.
pub fn load_frame(
    data_port: &dyn DataPort,
    settings: &DataSettings,
    symbol: &str,
) -> Result<PriceFrame, SignalbenchError> {
    let raw = data_port.fetch_ohlcv(symbol, settings.start_date, settings.end_date)?;
    if raw.is_empty() {
        return Err(SignalbenchError::NoData {
            symbol: symbol.to_string(),
        });
    }

    let quality = validate_bars(&raw);
    if !quality.is_valid {
        eprintln!("warning: {} has data quality issues, cleaning", symbol);
    }

    let (bars, cleaning) = clean_bars(&raw);
    if cleaning.output_rows != cleaning.input_rows || cleaning.values_filled > 0 {
        eprintln!(
            "  Cleaned {}: {} -> {} bars ({} duplicates, {} filled, {} non-positive closes)",
            symbol,
            cleaning.input_rows,
            cleaning.output_rows,
            cleaning.duplicates_removed,
            cleaning.values_filled,
            cleaning.nonpositive_close_removed,
        );
    }
    if bars.is_empty() {
        return Err(SignalbenchError::NoData {
            symbol: symbol.to_string(),
        });
    }

    Ok(PriceFrame::with_all_indicators(symbol, bars))
}

fn run_backtest(
    config_path: &Path,
    symbol_override: Option<&str>,
    strategy_key: Option<&str>,
    output_override: Option<&Path>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_backtest_config(&config) {
        return fail(&e);
    }

    let data_port = match data_settings_from(&config) {
        Ok(settings) => CsvAdapter::new(settings.data_dir),
        Err(e) => return fail(&e),
    };
    let output_dir = resolve_output_dir(output_override, &config);

    match run_backtest_pipeline(
        &data_port,
        &CsvReportAdapter,
        &config,
        symbol_override,
        strategy_key,
        output_dir.as_deref(),
    ) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn resolve_output_dir(output_override: Option<&Path>, config: &dyn ConfigPort) -> Option<PathBuf> {
    output_override
        .map(Path::to_path_buf)
        .or_else(|| report_output_dir(config).map(PathBuf::from))
}

/// Runs a single strategy end to end and writes reports when `output_dir`
/// is given.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    config: &dyn ConfigPort,
    symbol_override: Option<&str>,
    strategy_key: Option<&str>,
    output_dir: Option<&Path>,
) -> Result<BacktestResults, SignalbenchError> {
    let bt_config = backtest_config_from(config)?;
    let settings = data_settings_from(config)?;
    let strategies = configured_strategies(config)?;
    let selected = select_strategy(&strategies, strategy_key)?;
    let symbol = resolve_symbol(symbol_override, &settings);

    eprintln!("Loading {} from {}", symbol, settings.data_dir);
    let mut frame = load_frame(data_port, &settings, &symbol)?;
    frame.ensure_indicators(&selected.strategy.required_indicators());

    eprintln!(
        "Running {} on {} ({} bars)",
        selected.strategy.name(),
        symbol,
        frame.bar_count()
    );
    let results = BacktestEngine::new(bt_config).run(&frame, &selected.strategy)?;

    print_summary(&results);

    if let Some(dir) = output_dir {
        report_port.write(&results, dir)?;
        eprintln!("\nReports written to: {}", dir.display());
    }
    Ok(results)
}

fn print_summary(results: &BacktestResults) {
    let m = &results.metrics;
    eprintln!("\n=== {} on {} ===", results.strategy_name, results.symbol);
    eprintln!("Initial Capital:  {:.2}", m.initial_capital);
    eprintln!("Final Value:      {:.2}", m.final_value);
    eprintln!("Total Return:     {:.2}%", m.total_return * 100.0);
    eprintln!("Annualized:       {:.2}%", m.annual_return * 100.0);
    eprintln!("Volatility:       {:.2}%", m.volatility * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", m.sharpe_ratio);
    eprintln!("Max Drawdown:     {:.1}%", m.max_drawdown * 100.0);
    eprintln!("Orders:           {}", m.total_trades);

    let stats = results.run.summary_stats();
    eprintln!("Round Trips:      {}", stats.total_trades);
    if stats.total_trades > 0 {
        eprintln!("Win Rate:         {:.1}%", stats.win_rate * 100.0);
    }
    if let Some(open) = &results.run.open_trade {
        eprintln!(
            "Open Position:    since {} at {:.2}, unrealized {:+.2}%",
            open.entry_date,
            open.entry_price,
            open.unrealized_return * 100.0
        );
    }
}

fn run_compare(
    config_path: &Path,
    symbol_override: Option<&str>,
    output_override: Option<&Path>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let data_port = match data_settings_from(&config) {
        Ok(settings) => CsvAdapter::new(settings.data_dir),
        Err(e) => return fail(&e),
    };
    let output_dir = resolve_output_dir(output_override, &config);

    let outcomes = match run_compare_pipeline(
        &data_port,
        &CsvReportAdapter,
        &config,
        symbol_override,
        output_dir.as_deref(),
    ) {
        Ok(o) => o,
        Err(e) => return fail(&e),
    };

    match outcomes.iter().find_map(|o| o.result.as_ref().err()) {
        Some(e) if outcomes.iter().all(|o| o.result.is_err()) => ExitCode::from(e),
        _ => ExitCode::SUCCESS,
    }
}

/// Runs every configured strategy over the same frame in parallel. A strategy
/// that fails is reported in its outcome without stopping the others.
pub fn run_compare_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    config: &dyn ConfigPort,
    symbol_override: Option<&str>,
    output_dir: Option<&Path>,
) -> Result<Vec<StrategyOutcome>, SignalbenchError> {
    let bt_config = backtest_config_from(config)?;
    let settings = data_settings_from(config)?;
    let strategies: Vec<Strategy> = configured_strategies(config)?
        .into_iter()
        .map(|named| named.strategy)
        .collect();
    let symbol = resolve_symbol(symbol_override, &settings);

    let mut frame = load_frame(data_port, &settings, &symbol)?;
    for strategy in strategies.iter().filter(|s| s.validate().is_ok()) {
        frame.ensure_indicators(&strategy.required_indicators());
    }

    eprintln!(
        "Comparing {} strategies on {} ({} bars)",
        strategies.len(),
        symbol,
        frame.bar_count()
    );
    let outcomes = BacktestEngine::new(bt_config).run_batch(&frame, &strategies);

    print_comparison(&outcomes);

    if let Some(dir) = output_dir {
        report_port.write_comparison(&outcomes, dir)?;
        eprintln!("\nComparison written to: {}", dir.display());
    }
    Ok(outcomes)
}

fn print_comparison(outcomes: &[StrategyOutcome]) {
    eprintln!(
        "\n{:<45} {:>10} {:>10} {:>8} {:>10} {:>7}",
        "Strategy", "Return", "Annual", "Sharpe", "Drawdown", "Orders"
    );
    for outcome in outcomes {
        match &outcome.result {
            Ok(r) => {
                let m = &r.metrics;
                eprintln!(
                    "{:<45} {:>9.2}% {:>9.2}% {:>8.2} {:>9.1}% {:>7}",
                    outcome.name,
                    m.total_return * 100.0,
                    m.annual_return * 100.0,
                    m.sharpe_ratio,
                    m.max_drawdown * 100.0,
                    m.total_trades
                );
            }
            Err(e) => eprintln!("{:<45} failed: {}", outcome.name, e),
        }
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&config) {
        return fail(&e);
    }

    let strategies = match configured_strategies(&config) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    eprintln!("\nStrategies:");
    for named in &strategies {
        let indicators: Vec<String> = named
            .strategy
            .required_indicators()
            .iter()
            .map(|i| i.to_string())
            .collect();
        eprintln!("  {}: {}", named.key, named.strategy.name());
        eprintln!("    indicators: {}", indicators.join(", "));
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_indicators(config_path: &Path, symbol_override: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let settings = match data_settings_from(&config) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    let data_port = CsvAdapter::new(settings.data_dir.clone());
    let symbol = resolve_symbol(symbol_override, &settings);

    let raw = match data_port.fetch_ohlcv(&symbol, settings.start_date, settings.end_date) {
        Ok(bars) => bars,
        Err(e) => return fail(&e),
    };

    let quality = validate_bars(&raw);
    println!("{}: {} bars", symbol, quality.rows);
    if quality.issues.is_empty() {
        println!("  data quality: ok");
    } else {
        for issue in &quality.issues {
            let level = if issue.is_fatal() { "error" } else { "warning" };
            println!("  {}: {}", level, issue);
        }
    }

    let frame = match load_frame(&data_port, &settings, &symbol) {
        Ok(f) => f,
        Err(e) => return fail(&e),
    };

    let summary = summarize_bars(&frame.bars);
    if let (Some(start), Some(end)) = (summary.start, summary.end) {
        println!("  range: {} to {}", start, end);
    }
    println!(
        "  close: min {:.2} max {:.2} mean {:.2}",
        summary.close_min, summary.close_max, summary.close_mean
    );

    println!("\nLatest indicator values:");
    for ind in &STANDARD_INDICATORS {
        match frame.indicator(ind).and_then(|s| s.last_valid()) {
            Some(point) => println!("  {:<18} {}  {}", ind.to_string(), point.date, point.value),
            None => println!("  {:<18} undefined", ind.to_string()),
        }
    }
    ExitCode::SUCCESS
}

fn run_list_symbols(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let data_dir = match data_dir_from(&config) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };

    let symbols = match CsvAdapter::new(&data_dir).list_symbols() {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    if symbols.is_empty() {
        eprintln!("No symbols found in {}", data_dir);
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}
