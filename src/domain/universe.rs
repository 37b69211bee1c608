//! Instrument universe: ticker lists, loading, and exclusion bookkeeping.

use crate::domain::error::ScreenerError;
use crate::domain::instrument::InstrumentSeries;
use crate::ports::data_port::DataPort;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
}

impl From<UniverseError> for ScreenerError {
    fn from(err: UniverseError) -> Self {
        ScreenerError::ConfigInvalid {
            section: "universe".into(),
            key: "tickers".into(),
            reason: err.to_string(),
        }
    }
}

pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let ticker = trimmed.to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}

/// Why an instrument produced no signals. None of these abort a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    NoData,
    InsufficientHistory { bars: usize, minimum: usize },
    Illiquid { avg_traded_value: Option<f64>, minimum: f64 },
    IndicatorFailure { detail: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoData => write!(f, "no data"),
            SkipReason::InsufficientHistory { bars, minimum } => {
                write!(f, "only {} bars, minimum {} required", bars, minimum)
            }
            SkipReason::Illiquid {
                avg_traded_value: Some(avg),
                minimum,
            } => write!(f, "average traded value {:.0} below {:.0}", avg, minimum),
            SkipReason::Illiquid {
                avg_traded_value: None,
                ..
            } => write!(f, "not enough bars for a traded value average"),
            SkipReason::IndicatorFailure { detail } => write!(f, "indicator failure: {}", detail),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedInstrument {
    pub ticker: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

pub struct LoadedUniverse {
    pub series: Vec<InstrumentSeries>,
    pub skipped: Vec<SkippedInstrument>,
}

/// Fetch every ticker; unreadable or empty instruments are skipped.
/// Fails with [`ScreenerError::NoData`] only when nothing loads.
pub fn load_universe(
    data_port: &dyn DataPort,
    tickers: &[String],
) -> Result<LoadedUniverse, ScreenerError> {
    let mut series = Vec::with_capacity(tickers.len());
    let mut skipped = Vec::new();

    for ticker in tickers {
        let bars = match data_port.fetch_ohlcv(ticker) {
            Ok(bars) => bars,
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "skipping instrument");
                skipped.push(SkippedInstrument {
                    ticker: ticker.clone(),
                    reason: SkipReason::NoData,
                });
                continue;
            }
        };

        if bars.is_empty() {
            warn!(ticker = %ticker, "skipping instrument with no bars");
            skipped.push(SkippedInstrument {
                ticker: ticker.clone(),
                reason: SkipReason::NoData,
            });
            continue;
        }

        match InstrumentSeries::new(ticker.clone(), bars) {
            Ok(s) => {
                debug!(ticker = %ticker, bars = s.len(), "loaded");
                series.push(s);
            }
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "skipping malformed series");
                skipped.push(SkippedInstrument {
                    ticker: ticker.clone(),
                    reason: SkipReason::NoData,
                });
            }
        }
    }

    if series.is_empty() {
        return Err(ScreenerError::NoData);
    }

    info!(
        loaded = series.len(),
        requested = tickers.len(),
        "universe loaded"
    );
    Ok(LoadedUniverse { series, skipped })
}
