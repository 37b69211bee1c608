//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: line from slow - 1, signal from slow - 1 + signal - 1.

use crate::domain::indicator::{IndicatorError, IndicatorType, Series};
use ta::indicators::MovingAverageConvergenceDivergence;
use ta::Next;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: Series,
    pub signal: Series,
}

pub fn calculate_macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Result<MacdSeries, IndicatorError> {
    let indicator = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };
    if fast == 0 || slow == 0 || signal_period == 0 {
        return Err(IndicatorError::ZeroPeriod { indicator });
    }
    if fast >= slow {
        return Err(IndicatorError::InvalidPeriods {
            indicator,
            fast,
            slow,
        });
    }

    let mut macd = MovingAverageConvergenceDivergence::new(fast, slow, signal_period)
        .map_err(IndicatorError::library(indicator))?;
    let line_from = slow - 1;
    let signal_from = line_from + signal_period - 1;

    let mut line = Vec::with_capacity(closes.len());
    let mut signal = Vec::with_capacity(closes.len());
    for (i, &close) in closes.iter().enumerate() {
        let out = macd.next(close);
        line.push((i >= line_from).then_some(out.macd));
        signal.push((i >= signal_from).then_some(out.signal));
    }

    Ok(MacdSeries { line, signal })
}

pub fn calculate_macd_default(closes: &[f64]) -> Result<MacdSeries, IndicatorError> {
    calculate_macd(closes, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}
