//! Per-instrument bar series and the unified trading-day timeline.

use crate::domain::error::ScreenerError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

/// Ordered daily bars for one instrument. Dates are strictly increasing.
#[derive(Debug, Clone)]
pub struct InstrumentSeries {
    pub ticker: String,
    bars: Vec<OhlcvBar>,
    date_index: HashMap<NaiveDate, usize>,
}

impl InstrumentSeries {
    /// Build a series, rejecting duplicate or out-of-order dates.
    pub fn new(ticker: impl Into<String>, bars: Vec<OhlcvBar>) -> Result<Self, ScreenerError> {
        let ticker = ticker.into();
        if let Some(pair) = bars.windows(2).find(|w| w[1].date <= w[0].date) {
            let reason = if pair[1].date == pair[0].date {
                format!("duplicate date {}", pair[1].date)
            } else {
                format!("date {} follows {}", pair[1].date, pair[0].date)
            };
            return Err(ScreenerError::InvalidSeries { ticker, reason });
        }

        let date_index = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();
        Ok(Self {
            ticker,
            bars,
            date_index,
        })
    }

    /// Sort bars by date first, then build. Duplicates still fail.
    pub fn from_unsorted(
        ticker: impl Into<String>,
        mut bars: Vec<OhlcvBar>,
    ) -> Result<Self, ScreenerError> {
        bars.sort_by_key(|b| b.date);
        Self::new(ticker, bars)
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get_bar(&self, date: NaiveDate) -> Option<&OhlcvBar> {
        self.date_index.get(&date).map(|&i| &self.bars[i])
    }

    pub fn get_bar_index(&self, date: NaiveDate) -> Option<usize> {
        self.date_index.get(&date).copied()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Rolling mean of traded value over the last `window` bars.
    /// `None` when fewer than `window` bars exist.
    pub fn trailing_avg_traded_value(&self, window: usize, multiplier: f64) -> Option<f64> {
        if window == 0 || self.bars.len() < window {
            return None;
        }
        let tail = &self.bars[self.bars.len() - window..];
        let sum: f64 = tail.iter().map(|b| b.traded_value(multiplier)).sum();
        let avg = sum / window as f64;
        avg.is_finite().then_some(avg)
    }
}

/// Sorted union of every instrument's bar dates.
pub fn build_unified_timeline(series: &[InstrumentSeries]) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = series
        .iter()
        .flat_map(|s| s.bars.iter().map(|bar| bar.date))
        .collect();
    unique_dates.into_iter().collect()
}
