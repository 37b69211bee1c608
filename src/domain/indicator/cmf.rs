//! Chaikin Money Flow.
//!
//! CMF = Σ(MFM × volume) / Σ volume over the trailing n bars, where MFM is the
//! bar's money flow multiplier. Windows with zero total volume are `None`.

use crate::domain::indicator::{IndicatorError, IndicatorType, Series};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_cmf(bars: &[OhlcvBar], period: usize) -> Result<Series, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::ZeroPeriod {
            indicator: IndicatorType::Cmf(period),
        });
    }

    let flow: Vec<f64> = bars
        .iter()
        .map(|b| b.money_flow_multiplier() * b.volume)
        .collect();

    let mut out = Vec::with_capacity(bars.len());
    let mut flow_sum = 0.0;
    let mut volume_sum = 0.0;
    for i in 0..bars.len() {
        flow_sum += flow[i];
        volume_sum += bars[i].volume;
        if i >= period {
            flow_sum -= flow[i - period];
            volume_sum -= bars[i - period].volume;
        }

        if i + 1 < period || volume_sum <= 0.0 {
            out.push(None);
        } else {
            out.push(Some(flow_sum / volume_sum));
        }
    }
    Ok(out)
}
