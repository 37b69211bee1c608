//! Bearish price/oscillator divergence.
//!
//! Within the trailing window, price makes a higher high while the
//! oscillator makes a lower high. Peaks are strict local maxima against
//! `order` neighbours on each side; equal values never form or beat a peak.

pub const DEFAULT_LOOKBACK: usize = 20;
pub const DEFAULT_ORDER: usize = 3;

/// `closes` and `oscillator` are aligned and end at the evaluated day.
pub fn detect_bearish_divergence(
    closes: &[f64],
    oscillator: &[Option<f64>],
    lookback: usize,
    order: usize,
) -> bool {
    if lookback == 0 || closes.len() < lookback || oscillator.len() < lookback {
        return false;
    }

    let price: Vec<Option<f64>> = closes[closes.len() - lookback..]
        .iter()
        .copied()
        .map(Some)
        .collect();
    let osc = &oscillator[oscillator.len() - lookback..];

    let price_peaks = local_maxima(&price, order);
    let osc_peaks = local_maxima(osc, order);
    if price_peaks.len() < 2 || osc_peaks.len() < 2 {
        return false;
    }

    let (p_prev, p_last) = last_two(&price_peaks, &price);
    let (o_prev, o_last) = last_two(&osc_peaks, osc);
    p_last > p_prev && o_last < o_prev
}

/// Indices strictly greater than the `order` values on either side.
/// Neighbour positions past either end clamp to the end value, so bars near
/// the window edges can still peak while the end bars themselves cannot.
/// Undefined values are never peaks and never lose to a peak.
pub fn local_maxima(values: &[Option<f64>], order: usize) -> Vec<usize> {
    if order == 0 || values.is_empty() {
        return Vec::new();
    }
    let last = values.len() - 1;
    (0..values.len())
        .filter(|&i| {
            let Some(centre) = values[i] else {
                return false;
            };
            (1..=order).all(|k| {
                matches!(values[i.saturating_sub(k)], Some(v) if centre > v)
                    && matches!(values[(i + k).min(last)], Some(v) if centre > v)
            })
        })
        .collect()
}

fn last_two(peaks: &[usize], values: &[Option<f64>]) -> (f64, f64) {
    let prev = values[peaks[peaks.len() - 2]].unwrap_or(f64::NAN);
    let last = values[peaks[peaks.len() - 1]].unwrap_or(f64::NAN);
    (prev, last)
}
