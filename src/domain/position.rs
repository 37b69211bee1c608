//! Open holdings and closed round trips.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TargetReached,
    MaxHolding,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub ticker: String,
    pub shares: i64,
    pub buy_price: Decimal,
    pub entry_date: NaiveDate,
    pub stop_loss: Decimal,
    pub target_price: Decimal,
}

impl Holding {
    pub fn market_value(&self, price: Decimal) -> Decimal {
        Decimal::from(self.shares) * price
    }

    /// Calendar days since entry.
    pub fn days_held(&self, today: NaiveDate) -> i64 {
        (today - self.entry_date).num_days()
    }

    /// Exit check at today's close. `close` is `None` when the instrument has
    /// no bar today; only the age limit can fire then.
    pub fn exit_reason(
        &self,
        close: Option<Decimal>,
        today: NaiveDate,
        max_age_days: f64,
    ) -> Option<ExitReason> {
        if let Some(close) = close {
            if close < self.stop_loss {
                return Some(ExitReason::StopLoss);
            }
            if close > self.target_price {
                return Some(ExitReason::TargetReached);
            }
        }
        if self.days_held(today) as f64 > max_age_days {
            return Some(ExitReason::MaxHolding);
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosedTrade {
    pub ticker: String,
    pub shares: i64,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub reason: ExitReason,
    pub pnl: Decimal,
}

impl ClosedTrade {
    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}
