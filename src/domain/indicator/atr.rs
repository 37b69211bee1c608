//! Average True Range with Wilder smoothing.
//!
//! TR[0] = high - low, TR[i] = true range against the previous close.
//! Smoothed with alpha = 1/n through `ta`'s ATR at period 2n-1.

use crate::domain::indicator::{stream, wilder_period, IndicatorError, IndicatorType, Series};
use crate::domain::ohlcv::OhlcvBar;
use ta::indicators::AverageTrueRange;
use ta::Next;

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> Result<Series, IndicatorError> {
    let indicator = IndicatorType::Atr(period);
    if period == 0 {
        return Err(IndicatorError::ZeroPeriod { indicator });
    }

    let mut atr = AverageTrueRange::new(wilder_period(period))
        .map_err(IndicatorError::library(indicator))?;
    Ok(stream(bars, period - 1, |bar| atr.next(bar)))
}
