//! Per-day feature derivation.
//!
//! [`compute_features`] runs the indicator library once over an instrument's
//! bars and keeps each indicator as a column. [`FeatureTable::row`] assembles
//! the scorer's per-day view and refuses days where any column is still
//! warming up.

use crate::domain::indicator::{
    calculate_atr, calculate_cmf, calculate_macd, calculate_rsi, calculate_sma, closes,
    detect_engulfing, rolling_max, validate_bars, volumes, Engulfing, IndicatorError, Series,
};
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub const SMA_SHORT: usize = 20;
pub const SMA_MEDIUM: usize = 50;
pub const SMA_LONG: usize = 150;
pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const VOLUME_SMA_PERIOD: usize = 50;
pub const HIGH_52W_PERIOD: usize = 252;
pub const CMF_PERIOD: usize = 20;
pub const ATR_PERIOD: usize = 14;

/// A fully populated day: every indicator the scorer reads is defined.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub sma20: f64,
    pub sma50: f64,
    pub sma150: f64,
    pub rsi14: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub volume_sma50: f64,
    pub relative_volume: f64,
    pub high_52w: f64,
    pub cmf20: f64,
    pub atr14: f64,
    pub engulfing: Engulfing,
}

#[derive(Debug, Clone)]
pub struct FeatureTable {
    bars: Vec<OhlcvBar>,
    pub sma20: Series,
    pub sma50: Series,
    pub sma150: Series,
    pub rsi14: Series,
    pub macd: Series,
    pub macd_signal: Series,
    pub volume_sma50: Series,
    pub relative_volume: Series,
    pub high_52w: Series,
    pub cmf20: Series,
    pub atr14: Series,
    pub engulfing: Vec<Option<Engulfing>>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn closes(&self) -> Vec<f64> {
        closes(&self.bars)
    }

    pub fn row(&self, i: usize) -> Option<FeatureRow> {
        let bar = self.bars.get(i)?;
        Some(FeatureRow {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            sma20: self.sma20[i]?,
            sma50: self.sma50[i]?,
            sma150: self.sma150[i]?,
            rsi14: self.rsi14[i]?,
            macd: self.macd[i]?,
            macd_signal: self.macd_signal[i]?,
            volume_sma50: self.volume_sma50[i]?,
            relative_volume: self.relative_volume[i]?,
            high_52w: self.high_52w[i]?,
            cmf20: self.cmf20[i]?,
            atr14: self.atr14[i]?,
            engulfing: self.engulfing[i]?,
        })
    }
}

pub fn compute_features(bars: &[OhlcvBar]) -> Result<FeatureTable, IndicatorError> {
    validate_bars(bars)?;

    let close = closes(bars);
    let volume = volumes(bars);
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();

    let macd = calculate_macd(&close, MACD_FAST, MACD_SLOW, MACD_SIGNAL)?;
    let volume_sma50 = calculate_sma(&volume, VOLUME_SMA_PERIOD)?;
    let relative_volume = volume
        .iter()
        .zip(&volume_sma50)
        .map(|(v, avg)| match avg {
            Some(avg) if *avg > 0.0 => Some(v / avg),
            _ => None,
        })
        .collect();

    Ok(FeatureTable {
        bars: bars.to_vec(),
        sma20: calculate_sma(&close, SMA_SHORT)?,
        sma50: calculate_sma(&close, SMA_MEDIUM)?,
        sma150: calculate_sma(&close, SMA_LONG)?,
        rsi14: calculate_rsi(&close, RSI_PERIOD)?,
        macd: macd.line,
        macd_signal: macd.signal,
        volume_sma50,
        relative_volume,
        high_52w: rolling_max(&highs, HIGH_52W_PERIOD)?,
        cmf20: calculate_cmf(bars, CMF_PERIOD)?,
        atr14: calculate_atr(bars, ATR_PERIOD)?,
        engulfing: detect_engulfing(bars),
    })
}
