//! Rolling-window extremes.

use crate::domain::indicator::{stream, IndicatorError, IndicatorType, Series};
use ta::indicators::Maximum;
use ta::Next;

/// Maximum of the trailing `period` values.
pub fn rolling_max(values: &[f64], period: usize) -> Result<Series, IndicatorError> {
    let indicator = IndicatorType::RollingMax(period);
    if period == 0 {
        return Err(IndicatorError::ZeroPeriod { indicator });
    }

    let mut max = Maximum::new(period).map_err(IndicatorError::library(indicator))?;
    Ok(stream(values.iter().copied(), period - 1, |v: f64| max.next(v)))
}
