//! Configuration loading and validation.
//!
//! Reads the INI layout through [`ConfigPort`] and turns it into typed
//! settings. Everything is checked before any backtest runs.
//!
//! ```ini
//! [backtest]
//! initial_capital = 100000
//! commission_rate = 0.001
//! slippage_rate = 0.0005
//! position_fraction = 0.95
//! risk_free_rate = 0.02
//! strategies = golden, rsi
//!
//! [data]
//! data_dir = data
//! symbol = AAPL
//! start_date = 2020-01-01
//! end_date = 2024-01-01
//!
//! [strategy.golden]
//! type = ma_crossover
//! short_window = 50
//! long_window = 200
//!
//! [report]
//! output_dir = reports
//! ```

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::SignalbenchError;
use crate::domain::strategy::{
    BollingerParams, BreakoutParams, CombinedParams, MaCrossoverParams, RsiEnhancedParams,
    RsiParams, Strategy, WeightedParams,
};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

/// Where price data comes from and which slice of it to use.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub data_dir: String,
    pub symbol: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// A strategy section resolved to its variant.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedStrategy {
    pub key: String,
    pub strategy: Strategy,
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SignalbenchError> {
    backtest_config_from(config)?.validate()?;
    data_settings_from(config)?;
    let strategies = configured_strategies(config)?;
    for named in &strategies {
        named.strategy.validate()?;
    }
    Ok(())
}

pub fn backtest_config_from(config: &dyn ConfigPort) -> Result<BacktestConfig, SignalbenchError> {
    let defaults = BacktestConfig::default();
    let cfg = BacktestConfig {
        initial_capital: read_f64(config, "backtest", "initial_capital", defaults.initial_capital)?,
        commission_rate: read_f64(config, "backtest", "commission_rate", defaults.commission_rate)?,
        slippage_rate: read_f64(config, "backtest", "slippage_rate", defaults.slippage_rate)?,
        position_fraction: read_f64(
            config,
            "backtest",
            "position_fraction",
            defaults.position_fraction,
        )?,
        risk_free_rate: read_f64(config, "backtest", "risk_free_rate", defaults.risk_free_rate)?,
    };
    cfg.validate()?;
    Ok(cfg)
}

pub fn data_dir_from(config: &dyn ConfigPort) -> Result<String, SignalbenchError> {
    require_string(config, "data", "data_dir")
}

pub fn data_settings_from(config: &dyn ConfigPort) -> Result<DataSettings, SignalbenchError> {
    let data_dir = data_dir_from(config)?;
    let symbol = require_string(config, "data", "symbol")?;
    let start_date = read_date(config, "data", "start_date")?;
    let end_date = read_date(config, "data", "end_date")?;

    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start >= end {
            return Err(SignalbenchError::ConfigInvalid {
                section: "data".to_string(),
                key: "start_date".to_string(),
                reason: "start_date must be before end_date".to_string(),
            });
        }
    }

    Ok(DataSettings {
        data_dir,
        symbol,
        start_date,
        end_date,
    })
}

/// Report directory, if configured.
pub fn report_output_dir(config: &dyn ConfigPort) -> Option<String> {
    config
        .get_string("report", "output_dir")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Strategy keys listed in `[backtest] strategies`, in order.
pub fn strategy_keys(config: &dyn ConfigPort) -> Result<Vec<String>, SignalbenchError> {
    let raw = require_string(config, "backtest", "strategies")?;
    let keys: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if keys.is_empty() {
        return Err(SignalbenchError::ConfigMissing {
            section: "backtest".to_string(),
            key: "strategies".to_string(),
        });
    }
    Ok(keys)
}

pub fn configured_strategies(
    config: &dyn ConfigPort,
) -> Result<Vec<NamedStrategy>, SignalbenchError> {
    strategy_keys(config)?
        .into_iter()
        .map(|key| {
            let strategy = strategy_from_section(config, &key)?;
            Ok(NamedStrategy { key, strategy })
        })
        .collect()
}

/// Builds the strategy described by `[strategy.<key>]`. Unset parameters
/// take the variant's defaults.
pub fn strategy_from_section(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Strategy, SignalbenchError> {
    let section = format!("strategy.{}", key);
    let s = section.as_str();
    let kind = require_string(config, s, "type")?;

    let strategy = match kind.trim().to_lowercase().as_str() {
        "ma_crossover" => {
            let d = MaCrossoverParams::default();
            Strategy::MovingAverageCrossover(MaCrossoverParams {
                short_window: read_usize(config, s, "short_window", d.short_window)?,
                long_window: read_usize(config, s, "long_window", d.long_window)?,
            })
        }
        "rsi" => {
            let d = RsiParams::default();
            Strategy::Rsi(RsiParams {
                period: read_usize(config, s, "period", d.period)?,
                oversold: read_f64(config, s, "oversold", d.oversold)?,
                overbought: read_f64(config, s, "overbought", d.overbought)?,
            })
        }
        "rsi_enhanced" => {
            let d = RsiEnhancedParams::default();
            Strategy::RsiEnhanced(RsiEnhancedParams {
                period: read_usize(config, s, "period", d.period)?,
                oversold: read_f64(config, s, "oversold", d.oversold)?,
                overbought: read_f64(config, s, "overbought", d.overbought)?,
                trend_ma: read_usize(config, s, "trend_ma", d.trend_ma)?,
            })
        }
        "bollinger" => {
            let d = BollingerParams::default();
            Strategy::BollingerBands(BollingerParams {
                period: read_usize(config, s, "period", d.period)?,
                std_mult: read_f64(config, s, "std_mult", d.std_mult)?,
            })
        }
        "bollinger_breakout" => {
            let d = BreakoutParams::default();
            Strategy::BollingerBreakout(BreakoutParams {
                period: read_usize(config, s, "period", d.period)?,
                std_mult: read_f64(config, s, "std_mult", d.std_mult)?,
                squeeze_threshold: read_f64(config, s, "squeeze_threshold", d.squeeze_threshold)?,
            })
        }
        "combined" => {
            let d = CombinedParams::default();
            Strategy::Combined(CombinedParams {
                oversold: read_f64(config, s, "oversold", d.oversold)?,
                overbought: read_f64(config, s, "overbought", d.overbought)?,
                min_signals: read_usize(config, s, "min_signals", d.min_signals)?,
            })
        }
        "weighted_combined" => {
            let d = WeightedParams::default();
            Strategy::WeightedCombined(WeightedParams {
                rsi_weight: read_f64(config, s, "rsi_weight", d.rsi_weight)?,
                macd_weight: read_f64(config, s, "macd_weight", d.macd_weight)?,
                bb_weight: read_f64(config, s, "bb_weight", d.bb_weight)?,
                threshold: read_f64(config, s, "threshold", d.threshold)?,
                oversold: read_f64(config, s, "oversold", d.oversold)?,
                overbought: read_f64(config, s, "overbought", d.overbought)?,
            })
        }
        other => {
            return Err(SignalbenchError::ConfigInvalid {
                section,
                key: "type".to_string(),
                reason: format!("unknown strategy type '{}'", other),
            })
        }
    };
    Ok(strategy)
}

fn require_string(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, SignalbenchError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(SignalbenchError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn read_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, SignalbenchError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| SignalbenchError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("'{}' is not a number", raw.trim()),
            }),
    }
}

fn read_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, SignalbenchError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map_err(|_| SignalbenchError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("'{}' is not a non-negative integer", raw.trim()),
            }),
    }
}

fn read_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, SignalbenchError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| SignalbenchError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", key),
            }),
    }
}
