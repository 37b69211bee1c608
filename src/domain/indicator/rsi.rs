//! RSI (Relative Strength Index) with Wilder's smoothing.
//!
//! Gains and losses are smoothed with alpha = 1/n, run through `ta`'s
//! EMA-based RSI at period 2n-1.
//! Warmup: first n values are `None` (n price changes are needed).

use crate::domain::indicator::{stream, wilder_period, IndicatorError, IndicatorType, Series};
use ta::indicators::RelativeStrengthIndex;
use ta::Next;

pub fn calculate_rsi(closes: &[f64], period: usize) -> Result<Series, IndicatorError> {
    let indicator = IndicatorType::Rsi(period);
    if period == 0 {
        return Err(IndicatorError::ZeroPeriod { indicator });
    }

    let mut rsi = RelativeStrengthIndex::new(wilder_period(period))
        .map_err(IndicatorError::library(indicator))?;
    Ok(stream(closes.iter().copied(), period, |c| rsi.next(c)))
}
