//! Portfolio simulator over historical signals.
//!
//! One pass per trading day, in this order:
//! 1. value the book at today's closes;
//! 2. check exits, filling at the next trading day's open;
//! 3. enter from the latest signal date strictly before today, at today's open;
//! 4. record net worth at today's closes.
//!
//! Days are strictly sequential; each depends on the previous day's state.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::domain::error::ScreenerError;
use crate::domain::execution::{self, EntryLevels, EntryResult};
use crate::domain::instrument::{build_unified_timeline, InstrumentSeries};
use crate::domain::money::to_decimal;
use crate::domain::portfolio::Portfolio;
use crate::domain::ranking::SignalResult;

pub const DEFAULT_INITIAL_CAPITAL: Decimal = dec!(100000000);
pub const DEFAULT_MAX_HOLDING_DAYS: u32 = 60;
pub const DEFAULT_HOLDING_TOLERANCE: f64 = 1.4;
pub const DEFAULT_POSITION_SIZE: Decimal = dec!(0.10);
pub const DEFAULT_START_YEAR: i32 = 2021;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: Decimal,
    pub max_holding_days: u32,
    /// Holdings close once their calendar age exceeds
    /// `max_holding_days × holding_tolerance`.
    pub holding_tolerance: f64,
    /// Fraction of total portfolio value allocated per entry.
    pub position_size: Decimal,
    pub start_year: i32,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            max_holding_days: DEFAULT_MAX_HOLDING_DAYS,
            holding_tolerance: DEFAULT_HOLDING_TOLERANCE,
            position_size: DEFAULT_POSITION_SIZE,
            start_year: DEFAULT_START_YEAR,
        }
    }
}

impl BacktestConfig {
    pub fn max_age_days(&self) -> f64 {
        self.max_holding_days as f64 * self.holding_tolerance
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub portfolio: Portfolio,
    pub trading_days: Vec<NaiveDate>,
}

pub fn run_simulation(
    universe: &[InstrumentSeries],
    signals: &[SignalResult],
    config: &BacktestConfig,
) -> Result<BacktestResult, ScreenerError> {
    let trading_days: Vec<NaiveDate> = build_unified_timeline(universe)
        .into_iter()
        .filter(|d| d.year() >= config.start_year)
        .collect();
    if trading_days.is_empty() {
        return Err(ScreenerError::NoData);
    }

    let by_ticker: HashMap<&str, &InstrumentSeries> =
        universe.iter().map(|s| (s.ticker.as_str(), s)).collect();

    let mut by_date: BTreeMap<NaiveDate, Vec<&SignalResult>> = BTreeMap::new();
    for signal in signals {
        by_date.entry(signal.date).or_default().push(signal);
    }
    for day_signals in by_date.values_mut() {
        day_signals.sort_by(|a, b| a.ticker.cmp(&b.ticker));
    }

    info!(
        days = trading_days.len(),
        start = %trading_days[0],
        end = %trading_days[trading_days.len() - 1],
        signals = signals.len(),
        "running simulation"
    );

    let max_age = config.max_age_days();
    let mut portfolio = Portfolio::new(config.initial_capital);

    for (i, &today) in trading_days.iter().enumerate() {
        let closes = closes_on(universe, today);
        let total_value = portfolio.total_value(&closes);

        let exits: Vec<_> = portfolio
            .holdings
            .values()
            .filter_map(|h| {
                let close = closes.get(h.ticker.as_str()).copied();
                h.exit_reason(close, today, max_age)
                    .map(|reason| (h.ticker.clone(), reason))
            })
            .collect();
        if let Some(&next_day) = trading_days.get(i + 1) {
            for (ticker, reason) in exits {
                let next_open = by_ticker
                    .get(ticker.as_str())
                    .and_then(|s| s.get_bar(next_day))
                    .and_then(|b| to_decimal(b.open))
                    .filter(|p| *p > Decimal::ZERO);
                match next_open {
                    Some(price) => {
                        if let Some(trade) =
                            execution::exit(&mut portfolio, &ticker, price, next_day, reason)
                        {
                            debug!(
                                date = %today,
                                ticker = %ticker,
                                ?reason,
                                price = %price,
                                pnl = %trade.pnl,
                                "exit"
                            );
                        }
                    }
                    None => debug!(date = %today, ticker = %ticker, "exit deferred, no next open"),
                }
            }
        }

        if let Some((_, day_signals)) = by_date.range(..today).next_back() {
            let allocation = total_value * config.position_size;
            for signal in day_signals {
                if portfolio.is_held(&signal.ticker) {
                    continue;
                }
                let Some(open) = by_ticker
                    .get(signal.ticker.as_str())
                    .and_then(|s| entry_open(s, today))
                else {
                    continue;
                };
                let levels = EntryLevels {
                    stop_loss: signal.stop_loss,
                    target_price: signal.target_price,
                };
                if let EntryResult::Entered { shares, cost } = execution::enter(
                    &mut portfolio,
                    &signal.ticker,
                    open,
                    today,
                    allocation,
                    levels,
                ) {
                    debug!(
                        date = %today,
                        ticker = %signal.ticker,
                        shares,
                        price = %open,
                        cost = %cost,
                        "entry"
                    );
                }
            }
        }

        let net_worth = portfolio.total_value(&closes);
        portfolio.record_net_worth(today, net_worth);
    }

    info!(
        trades = portfolio.closed_trades.len(),
        open_holdings = portfolio.holding_count(),
        "simulation complete"
    );
    Ok(BacktestResult {
        portfolio,
        trading_days,
    })
}

fn closes_on(universe: &[InstrumentSeries], date: NaiveDate) -> HashMap<&str, Decimal> {
    universe
        .iter()
        .filter_map(|s| {
            let bar = s.get_bar(date)?;
            Some((s.ticker.as_str(), to_decimal(bar.close)?))
        })
        .collect()
}

/// Today's open, if the instrument trades today, has traded before, and
/// the open is positive.
fn entry_open(series: &InstrumentSeries, date: NaiveDate) -> Option<Decimal> {
    let idx = series.get_bar_index(date)?;
    if idx == 0 {
        return None;
    }
    to_decimal(series.bars()[idx].open).filter(|p| *p > Decimal::ZERO)
}
