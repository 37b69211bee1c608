//! Screening pipeline: gate, derive features, score, rank.
//!
//! Instruments are independent, so they fan out across the rayon pool and
//! the results are merged in (date, ticker) order afterwards.

use crate::domain::error::ScreenerError;
use crate::domain::features::compute_features;
use crate::domain::instrument::InstrumentSeries;
use crate::domain::ranking::{rank, SignalResult};
use crate::domain::scoring::score_day;
use crate::domain::strategy::ScreenerConfig;
use crate::domain::universe::{SkipReason, SkippedInstrument};
use rayon::prelude::*;
use std::ops::Range;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Only the most recent bar of each instrument.
    LatestDay,
    /// Every day from `min_history` onward, for backtesting.
    FullHistory,
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisOutcome {
    pub signals: Vec<SignalResult>,
    pub skipped: Vec<SkippedInstrument>,
}

pub fn run_analysis(
    universe: &[InstrumentSeries],
    config: &ScreenerConfig,
    mode: ScanMode,
) -> Result<AnalysisOutcome, ScreenerError> {
    if universe.iter().all(InstrumentSeries::is_empty) {
        return Err(ScreenerError::NoData);
    }

    info!(instruments = universe.len(), ?mode, "running analysis");

    let results: Vec<(String, Result<Vec<SignalResult>, SkipReason>)> = universe
        .par_iter()
        .map(|series| (series.ticker.clone(), analyze_instrument(series, config, mode)))
        .collect();

    let mut outcome = AnalysisOutcome::default();
    for (ticker, result) in results {
        match result {
            Ok(signals) => outcome.signals.extend(signals),
            Err(reason) => {
                match &reason {
                    SkipReason::IndicatorFailure { .. } => {
                        warn!(ticker = %ticker, %reason, "instrument skipped")
                    }
                    _ => debug!(ticker = %ticker, %reason, "instrument skipped"),
                }
                outcome.skipped.push(SkippedInstrument { ticker, reason });
            }
        }
    }

    outcome
        .signals
        .sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.ticker.cmp(&b.ticker)));
    outcome.skipped.sort_by(|a, b| a.ticker.cmp(&b.ticker));

    info!(
        signals = outcome.signals.len(),
        skipped = outcome.skipped.len(),
        "analysis complete"
    );
    Ok(outcome)
}

/// Screen one instrument. Gate failures come back as a [`SkipReason`].
pub fn analyze_instrument(
    series: &InstrumentSeries,
    config: &ScreenerConfig,
    mode: ScanMode,
) -> Result<Vec<SignalResult>, SkipReason> {
    if series.is_empty() {
        return Err(SkipReason::NoData);
    }
    if series.len() < config.min_history {
        return Err(SkipReason::InsufficientHistory {
            bars: series.len(),
            minimum: config.min_history,
        });
    }

    let avg =
        series.trailing_avg_traded_value(config.liquidity_window, config.traded_value_multiplier);
    match avg {
        Some(v) if v >= config.min_avg_traded_value => {}
        _ => {
            return Err(SkipReason::Illiquid {
                avg_traded_value: avg,
                minimum: config.min_avg_traded_value,
            })
        }
    }

    let table = compute_features(series.bars()).map_err(|e| SkipReason::IndicatorFailure {
        detail: e.to_string(),
    })?;
    let closes = table.closes();

    let mut signals = Vec::new();
    for i in evaluation_range(series.len(), config.min_history, mode) {
        let Some((row, card)) = score_day(&table, &closes, i, config) else {
            debug!(ticker = %series.ticker, index = i, "incomplete feature row");
            continue;
        };
        if let Some(signal) = rank(&series.ticker, &row, &card, config) {
            signals.push(signal);
        }
    }
    Ok(signals)
}

fn evaluation_range(len: usize, min_history: usize, mode: ScanMode) -> Range<usize> {
    match mode {
        ScanMode::LatestDay => len.saturating_sub(1)..len,
        ScanMode::FullHistory => min_history.max(1)..len,
    }
}
