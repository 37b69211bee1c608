#![allow(dead_code)]

use chrono::NaiveDate;
use screener::domain::error::ScreenerError;
use screener::domain::instrument::InstrumentSeries;
pub use screener::domain::ohlcv::OhlcvBar;
use screener::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(&self, ticker: &str) -> Result<Vec<OhlcvBar>, ScreenerError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(ScreenerError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(ticker).cloned().unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, ScreenerError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ScreenerError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(ScreenerError::DataSource {
                reason: reason.clone(),
            });
        }
        match self.data.get(ticker) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

/// Daily volume that clears the default liquidity gate for prices above ~10.
pub const LIQUID_VOLUME: f64 = 100_000.0;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: NaiveDate, close: f64) -> OhlcvBar {
    OhlcvBar {
        date,
        open: close - 0.1,
        high: close + 0.05,
        low: close - 0.3,
        close,
        volume: LIQUID_VOLUME,
    }
}

/// Linear uptrend on consecutive calendar days.
pub fn generate_bars(start: NaiveDate, count: usize, start_price: f64) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| make_bar(start + chrono::Duration::days(i as i64), start_price + i as f64 * 0.2))
        .collect()
}

/// First bar of [`breakout_bars`].
pub fn breakout_start() -> NaiveDate {
    date(2020, 1, 1)
}

/// Steady climb, a long flat stretch that lets MACD sag under its signal
/// line, then a sharp rally. MACD crosses back above its signal on bar 255,
/// which is the first bar scoring above the default threshold. Bars 255 and
/// 256 qualify; later bars drop out.
pub fn breakout_bars(count: usize) -> Vec<OhlcvBar> {
    let mut close = 50.0;
    (0..count)
        .map(|i| {
            close += if i < 216 {
                0.20
            } else if i < 254 {
                0.02
            } else {
                0.6
            };
            make_bar(breakout_start() + chrono::Duration::days(i as i64), close)
        })
        .collect()
}

pub fn breakout_series(ticker: &str, count: usize) -> InstrumentSeries {
    InstrumentSeries::new(ticker, breakout_bars(count)).unwrap()
}

pub fn tickers(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}
