//! Technical indicator library.
//!
//! Moving averages, MACD, RSI, ATR and the rolling maximum run on the `ta`
//! crate's streaming indicators. CMF and the engulfing pattern have no `ta`
//! counterpart and are computed here.
//!
//! Every indicator produces one `Option<f64>` per input bar. `None` marks a
//! warm-up bar or a value a numeric guard refused to compute (zero volume
//! window, flat range). Callers decide what a missing value means.

pub mod atr;
pub mod candlestick;
pub mod cmf;
pub mod macd;
pub mod rolling;
pub mod rsi;
pub mod sma;

use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::fmt;
use ta::errors::TaError;
use ta::{Close, High, Low};

pub use atr::calculate_atr;
pub use candlestick::{detect_engulfing, Engulfing};
pub use cmf::calculate_cmf;
pub use macd::{calculate_macd, MacdSeries};
pub use rolling::rolling_max;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

/// One value per bar, `None` where the indicator is undefined.
pub type Series = Vec<Option<f64>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Rsi(usize),
    Atr(usize),
    Cmf(usize),
    RollingMax(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Engulfing,
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Cmf(period) => write!(f, "CMF({})", period),
            IndicatorType::RollingMax(period) => write!(f, "MAX({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Engulfing => write!(f, "ENGULFING"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndicatorError {
    #[error("{indicator}: period must be positive")]
    ZeroPeriod { indicator: IndicatorType },

    #[error("{indicator}: fast period {fast} must be shorter than slow period {slow}")]
    InvalidPeriods {
        indicator: IndicatorType,
        fast: usize,
        slow: usize,
    },

    #[error("{indicator}: {reason}")]
    Library {
        indicator: IndicatorType,
        reason: String,
    },

    #[error("malformed bar on {date}: {reason}")]
    MalformedBar { date: NaiveDate, reason: String },
}

impl IndicatorError {
    pub(crate) fn library(indicator: IndicatorType) -> impl FnOnce(TaError) -> IndicatorError {
        move |err| IndicatorError::Library {
            indicator,
            reason: format!("{:?}", err),
        }
    }
}

impl High for OhlcvBar {
    fn high(&self) -> f64 {
        self.high
    }
}

impl Low for OhlcvBar {
    fn low(&self) -> f64 {
        self.low
    }
}

impl Close for OhlcvBar {
    fn close(&self) -> f64 {
        self.close
    }
}

/// Wilder smoothing (alpha = 1/n) expressed as the period of a standard
/// EMA (alpha = 2/(p+1)).
pub(crate) fn wilder_period(period: usize) -> usize {
    2 * period - 1
}

/// Drive a streaming indicator over `inputs`, masking the first
/// `warmup` outputs and any non-finite value.
pub(crate) fn stream<I, T>(inputs: I, warmup: usize, mut step: impl FnMut(T) -> f64) -> Series
where
    I: IntoIterator<Item = T>,
{
    inputs
        .into_iter()
        .enumerate()
        .map(|(i, input)| {
            let value = step(input);
            (i >= warmup && value.is_finite()).then_some(value)
        })
        .collect()
}

/// Reject bars the indicator math cannot digest.
pub fn validate_bars(bars: &[OhlcvBar]) -> Result<(), IndicatorError> {
    for bar in bars {
        let prices = [bar.open, bar.high, bar.low, bar.close];
        if prices.iter().any(|p| !p.is_finite()) || !bar.volume.is_finite() {
            return Err(IndicatorError::MalformedBar {
                date: bar.date,
                reason: "non-finite value".into(),
            });
        }
        if bar.close <= 0.0 {
            return Err(IndicatorError::MalformedBar {
                date: bar.date,
                reason: format!("non-positive close {}", bar.close),
            });
        }
        if bar.volume < 0.0 {
            return Err(IndicatorError::MalformedBar {
                date: bar.date,
                reason: format!("negative volume {}", bar.volume),
            });
        }
    }
    Ok(())
}

pub fn closes(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

pub fn volumes(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter().map(|b| b.volume).collect()
}
