//! Order fills against the portfolio.
//!
//! Entries buy whole shares at the day's open with a fixed allocation.
//! Exits fill at a caller-supplied price (the next session's open) and book
//! the round trip.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::portfolio::Portfolio;
use super::position::{ClosedTrade, ExitReason, Holding};

/// Stop and target carried over from the signal that opened a holding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryLevels {
    pub stop_loss: Decimal,
    pub target_price: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered { shares: i64, cost: Decimal },
    AlreadyHeld,
    InvalidPrice,
    InsufficientCash,
    ZeroShares,
}

/// Buy `floor(allocation / open)` shares of `ticker`.
///
/// Requires `cash >= allocation` up front; the cost actually debited is
/// `shares × open`, which never exceeds the allocation.
pub fn enter(
    portfolio: &mut Portfolio,
    ticker: &str,
    open: Decimal,
    date: NaiveDate,
    allocation: Decimal,
    levels: EntryLevels,
) -> EntryResult {
    if portfolio.is_held(ticker) {
        return EntryResult::AlreadyHeld;
    }
    if open <= Decimal::ZERO {
        return EntryResult::InvalidPrice;
    }
    if portfolio.cash < allocation {
        return EntryResult::InsufficientCash;
    }

    let Some(ratio) = allocation.checked_div(open) else {
        return EntryResult::InvalidPrice;
    };
    let shares = match ratio.floor().to_i64() {
        Some(s) if s > 0 => s,
        _ => return EntryResult::ZeroShares,
    };

    let cost = Decimal::from(shares) * open;
    portfolio.cash -= cost;
    portfolio.add_holding(Holding {
        ticker: ticker.to_string(),
        shares,
        buy_price: open,
        entry_date: date,
        stop_loss: levels.stop_loss,
        target_price: levels.target_price,
    });

    EntryResult::Entered { shares, cost }
}

/// Sell the whole holding at `price`, credit cash, and record the trade.
/// Returns `None` when nothing is held.
pub fn exit(
    portfolio: &mut Portfolio,
    ticker: &str,
    price: Decimal,
    exit_date: NaiveDate,
    reason: ExitReason,
) -> Option<ClosedTrade> {
    let holding = portfolio.remove_holding(ticker)?;
    let shares = Decimal::from(holding.shares);
    let proceeds = shares * price;
    portfolio.cash += proceeds;

    let trade = ClosedTrade {
        ticker: holding.ticker,
        shares: holding.shares,
        entry_price: holding.buy_price,
        exit_price: price,
        entry_date: holding.entry_date,
        exit_date,
        reason,
        pnl: proceeds - shares * holding.buy_price,
    };
    portfolio.record_trade(trade.clone());
    Some(trade)
}
