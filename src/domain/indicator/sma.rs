//! Simple Moving Average over an arbitrary f64 series.
//!
//! Warmup: first (n-1) values are `None`.

use crate::domain::indicator::{stream, IndicatorError, IndicatorType, Series};
use ta::indicators::SimpleMovingAverage;
use ta::Next;

pub fn calculate_sma(values: &[f64], period: usize) -> Result<Series, IndicatorError> {
    let indicator = IndicatorType::Sma(period);
    if period == 0 {
        return Err(IndicatorError::ZeroPeriod { indicator });
    }

    let mut sma = SimpleMovingAverage::new(period).map_err(IndicatorError::library(indicator))?;
    Ok(stream(values.iter().copied(), period - 1, |v| sma.next(v)))
}
