//! Daily OHLCV bar representation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    /// Traded value in currency units; `multiplier` corrects quotes given in thousands.
    pub fn traded_value(&self, multiplier: f64) -> f64 {
        self.close * multiplier * self.volume
    }

    pub fn is_white(&self) -> bool {
        self.close > self.open
    }

    pub fn is_black(&self) -> bool {
        self.close < self.open
    }

    /// Close location value: ((close - low) - (high - close)) / (high - low).
    /// Zero for a bar with no range.
    pub fn money_flow_multiplier(&self) -> f64 {
        let range = self.high - self.low;
        if range == 0.0 {
            return 0.0;
        }
        ((self.close - self.low) - (self.high - self.close)) / range
    }
}
