//! Portfolio state and the daily net-worth record.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::position::{ClosedTrade, Holding};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetWorthPoint {
    pub date: NaiveDate,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: Decimal,
    pub initial_capital: Decimal,
    /// Keyed by ticker; iteration order is ticker order.
    pub holdings: BTreeMap<String, Holding>,
    pub closed_trades: Vec<ClosedTrade>,
    pub net_worth: Vec<NetWorthPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: Decimal) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            holdings: BTreeMap::new(),
            closed_trades: Vec::new(),
            net_worth: Vec::new(),
        }
    }

    pub fn add_holding(&mut self, holding: Holding) {
        self.holdings.insert(holding.ticker.clone(), holding);
    }

    pub fn get_holding(&self, ticker: &str) -> Option<&Holding> {
        self.holdings.get(ticker)
    }

    pub fn is_held(&self, ticker: &str) -> bool {
        self.holdings.contains_key(ticker)
    }

    pub fn remove_holding(&mut self, ticker: &str) -> Option<Holding> {
        self.holdings.remove(ticker)
    }

    pub fn holding_count(&self) -> usize {
        self.holdings.len()
    }

    pub fn record_trade(&mut self, trade: ClosedTrade) {
        self.closed_trades.push(trade);
    }

    pub fn record_net_worth(&mut self, date: NaiveDate, value: Decimal) {
        self.net_worth.push(NetWorthPoint { date, value });
    }

    /// Cash plus holdings valued at `closes`. Holdings without a price are
    /// left out of the sum.
    pub fn total_value(&self, closes: &HashMap<&str, Decimal>) -> Decimal {
        let holdings_value: Decimal = self
            .holdings
            .values()
            .filter_map(|h| closes.get(h.ticker.as_str()).map(|&p| h.market_value(p)))
            .sum();
        self.cash + holdings_value
    }
}
