//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for signalbench.
#[derive(Debug, thiserror::Error)]
pub enum SignalbenchError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid parameter for {strategy}: {reason}")]
    InvalidParameter { strategy: String, reason: String },

    #[error("{strategy} requires indicator {indicator}, which is missing from the input")]
    MissingIndicator { strategy: String, indicator: String },

    #[error("empty price series for {symbol}")]
    EmptySeries { symbol: String },

    #[error("dates for {symbol} are not strictly ascending at bar {index} ({date})")]
    UnorderedDates {
        symbol: String,
        index: usize,
        date: NaiveDate,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SignalbenchError {
    /// Errors raised before any simulation starts because the inputs or
    /// parameters are unusable.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            SignalbenchError::ConfigParse { .. }
                | SignalbenchError::ConfigMissing { .. }
                | SignalbenchError::ConfigInvalid { .. }
                | SignalbenchError::InvalidParameter { .. }
                | SignalbenchError::MissingIndicator { .. }
                | SignalbenchError::EmptySeries { .. }
                | SignalbenchError::UnorderedDates { .. }
        )
    }
}

impl From<&SignalbenchError> for std::process::ExitCode {
    fn from(err: &SignalbenchError) -> Self {
        let code: u8 = match err {
            SignalbenchError::Io(_) | SignalbenchError::Report { .. } => 1,
            SignalbenchError::ConfigParse { .. }
            | SignalbenchError::ConfigMissing { .. }
            | SignalbenchError::ConfigInvalid { .. } => 2,
            SignalbenchError::Data { .. }
            | SignalbenchError::EmptySeries { .. }
            | SignalbenchError::UnorderedDates { .. } => 3,
            SignalbenchError::InvalidParameter { .. }
            | SignalbenchError::MissingIndicator { .. } => 4,
            SignalbenchError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
