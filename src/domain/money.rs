//! Float to fixed-point conversion for monetary values.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Monetary precision for prices, targets and stops.
pub const PRICE_DP: u32 = 2;

/// Decimal built from the float's shortest round-trip text, so `0.1`
/// becomes exactly `0.1` rather than its binary expansion.
pub fn to_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&value.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(value))
}

/// Round half to even at `dp` places.
pub fn round_money(value: Decimal, dp: u32) -> Decimal {
    value.round_dp(dp)
}

pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}
