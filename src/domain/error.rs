//! Domain error types.

use crate::domain::indicator::IndicatorError;

/// Top-level error type for the screener.
#[derive(Debug, thiserror::Error)]
pub enum ScreenerError {
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

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("invalid series for {ticker}: {reason}")]
    InvalidSeries { ticker: String, reason: String },

    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error("no data to analyze")]
    NoData,

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for ScreenerError {
    fn from(err: csv::Error) -> Self {
        ScreenerError::Report {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ScreenerError {
    fn from(err: serde_json::Error) -> Self {
        ScreenerError::Report {
            reason: err.to_string(),
        }
    }
}

impl From<&ScreenerError> for std::process::ExitCode {
    fn from(err: &ScreenerError) -> Self {
        let code: u8 = match err {
            ScreenerError::Io(_) => 1,
            ScreenerError::ConfigParse { .. }
            | ScreenerError::ConfigMissing { .. }
            | ScreenerError::ConfigInvalid { .. } => 2,
            ScreenerError::DataSource { .. } => 3,
            ScreenerError::InvalidSeries { .. } | ScreenerError::Indicator(_) => 4,
            ScreenerError::NoData => 5,
            ScreenerError::Report { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
