//! Performance summary over the daily net-worth series.
//!
//! All `_pct` fields are percentages (×100). Ratios fall back to 0 when
//! their denominator is 0.

use super::money::to_f64;
use super::portfolio::{NetWorthPoint, Portfolio};
use super::position::ClosedTrade;
use rust_decimal::Decimal;
use serde::Serialize;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_return_pct: f64,
    pub annualized_return_pct: f64,
    pub annualized_volatility_pct: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown_pct: f64,
    pub calmar_ratio: f64,
    pub trading_days: usize,
    pub daily_net_worth: Vec<NetWorthPoint>,
}

impl PerformanceReport {
    /// `None` when no positive net-worth value remains after trimming.
    pub fn compute(net_worth: &[NetWorthPoint], initial_capital: Decimal) -> Option<Self> {
        let series: Vec<NetWorthPoint> = net_worth
            .iter()
            .filter(|p| p.value > Decimal::ZERO)
            .cloned()
            .collect();
        if series.is_empty() {
            return None;
        }

        let initial = to_f64(initial_capital);
        let values: Vec<f64> = series.iter().map(|p| to_f64(p.value)).collect();
        let cumulative: Vec<f64> = values.iter().map(|v| v / initial).collect();
        let last = cumulative[cumulative.len() - 1];
        let n = values.len() as f64;

        let annualized_return_pct = (last.powf(TRADING_DAYS_PER_YEAR / n) - 1.0) * 100.0;
        let annualized_volatility_pct =
            sample_std(&daily_returns(&values)) * TRADING_DAYS_PER_YEAR.sqrt() * 100.0;
        let sharpe_ratio = if annualized_volatility_pct != 0.0 {
            annualized_return_pct / annualized_volatility_pct
        } else {
            0.0
        };
        let max_drawdown_pct = max_drawdown(&cumulative) * 100.0;
        let calmar_ratio = if max_drawdown_pct != 0.0 {
            annualized_return_pct / max_drawdown_pct.abs()
        } else {
            0.0
        };

        Some(PerformanceReport {
            initial_capital: initial,
            final_value: values[values.len() - 1],
            total_return_pct: (last - 1.0) * 100.0,
            annualized_return_pct,
            annualized_volatility_pct,
            sharpe_ratio,
            max_drawdown_pct,
            calmar_ratio,
            trading_days: series.len(),
            daily_net_worth: series,
        })
    }
}

fn daily_returns(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

/// Sample standard deviation (n - 1); 0 with fewer than two observations.
fn sample_std(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    var.sqrt()
}

/// Most negative `value / running_peak - 1`; 0 for a never-falling series.
fn max_drawdown(cumulative: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0_f64;
    for &v in cumulative {
        peak = peak.max(v);
        if peak > 0.0 {
            worst = worst.min((v - peak) / peak);
        }
    }
    worst
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeStats {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    /// Gross profit over gross loss; `None` without losing trades.
    pub profit_factor: Option<f64>,
    pub avg_holding_days: f64,
    pub total_pnl: Decimal,
}

impl TradeStats {
    pub fn compute(trades: &[ClosedTrade]) -> Self {
        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut gross_profit = Decimal::ZERO;
        let mut gross_loss = Decimal::ZERO;
        let mut total_days = 0i64;

        for trade in trades {
            if trade.pnl > Decimal::ZERO {
                wins += 1;
                gross_profit += trade.pnl;
            } else if trade.pnl < Decimal::ZERO {
                losses += 1;
                gross_loss += trade.pnl.abs();
            }
            total_days += trade.holding_days();
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            wins as f64 / total_trades as f64
        } else {
            0.0
        };
        let profit_factor = (gross_loss > Decimal::ZERO)
            .then(|| to_f64(gross_profit) / to_f64(gross_loss));
        let avg_holding_days = if total_trades > 0 {
            total_days as f64 / total_trades as f64
        } else {
            0.0
        };

        TradeStats {
            total_trades,
            wins,
            losses,
            win_rate,
            profit_factor,
            avg_holding_days,
            total_pnl: gross_profit - gross_loss,
        }
    }
}

/// Everything a backtest run reports: performance, trade summary and the
/// trade ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    /// `None` when the net-worth series has no usable values.
    pub performance: Option<PerformanceReport>,
    pub trade_stats: TradeStats,
    pub trades: Vec<ClosedTrade>,
    pub open_holdings: usize,
}

impl BacktestReport {
    pub fn from_portfolio(portfolio: &Portfolio) -> Self {
        BacktestReport {
            performance: PerformanceReport::compute(
                &portfolio.net_worth,
                portfolio.initial_capital,
            ),
            trade_stats: TradeStats::compute(&portfolio.closed_trades),
            trades: portfolio.closed_trades.clone(),
            open_holdings: portfolio.holding_count(),
        }
    }
}
