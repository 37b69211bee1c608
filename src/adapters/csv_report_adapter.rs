//! CSV report adapter.
//!
//! Signals go to a single file. A backtest writes `signals.csv`,
//! `trades.csv`, `net_worth.csv` and a two-column `summary.csv` into the
//! output directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::error::ScreenerError;
use crate::domain::metrics::BacktestReport;
use crate::domain::ranking::SignalResult;
use crate::ports::report_port::ReportPort;

/// Separator for `key_reasons` inside one CSV cell.
const REASON_SEPARATOR: &str = ";";

#[derive(Serialize)]
struct SignalRow<'a> {
    ticker: &'a str,
    date: String,
    current_price: String,
    target_price: String,
    stop_loss: String,
    timeframe: String,
    confidence: u8,
    score: f64,
    key_reasons: String,
    rationale: &'a str,
}

impl<'a> From<&'a SignalResult> for SignalRow<'a> {
    fn from(s: &'a SignalResult) -> Self {
        SignalRow {
            ticker: &s.ticker,
            date: s.date.to_string(),
            current_price: s.current_price.to_string(),
            target_price: s.target_price.to_string(),
            stop_loss: s.stop_loss.to_string(),
            timeframe: s.timeframe.to_string(),
            confidence: s.confidence,
            score: s.score,
            key_reasons: s.key_reasons.join(REASON_SEPARATOR),
            rationale: &s.rationale,
        }
    }
}

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_parent(path: &Path) -> Result<(), ScreenerError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn write_rows<T: Serialize>(
    path: &Path,
    rows: impl IntoIterator<Item = T>,
) -> Result<(), ScreenerError> {
    ensure_parent(path)?;
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn summary_rows(report: &BacktestReport) -> Vec<(&'static str, String)> {
    let stats = &report.trade_stats;
    let mut rows = Vec::new();
    if let Some(perf) = &report.performance {
        rows.extend([
            ("initial_capital", format!("{:.2}", perf.initial_capital)),
            ("final_value", format!("{:.2}", perf.final_value)),
            ("total_return_pct", format!("{:.4}", perf.total_return_pct)),
            (
                "annualized_return_pct",
                format!("{:.4}", perf.annualized_return_pct),
            ),
            (
                "annualized_volatility_pct",
                format!("{:.4}", perf.annualized_volatility_pct),
            ),
            ("sharpe_ratio", format!("{:.4}", perf.sharpe_ratio)),
            ("max_drawdown_pct", format!("{:.4}", perf.max_drawdown_pct)),
            ("calmar_ratio", format!("{:.4}", perf.calmar_ratio)),
            ("trading_days", perf.trading_days.to_string()),
        ]);
    }
    rows.extend([
        ("total_trades", stats.total_trades.to_string()),
        ("wins", stats.wins.to_string()),
        ("losses", stats.losses.to_string()),
        ("win_rate", format!("{:.4}", stats.win_rate)),
        (
            "profit_factor",
            stats
                .profit_factor
                .map(|pf| format!("{:.4}", pf))
                .unwrap_or_default(),
        ),
        ("avg_holding_days", format!("{:.2}", stats.avg_holding_days)),
        ("total_pnl", stats.total_pnl.to_string()),
        ("open_holdings", report.open_holdings.to_string()),
    ]);
    rows
}

impl ReportPort for CsvReportAdapter {
    fn write_signals(&self, signals: &[SignalResult], path: &Path) -> Result<(), ScreenerError> {
        write_rows(path, signals.iter().map(SignalRow::from))
    }

    fn write_backtest(
        &self,
        report: &BacktestReport,
        signals: &[SignalResult],
        dir: &Path,
    ) -> Result<Vec<PathBuf>, ScreenerError> {
        fs::create_dir_all(dir)?;

        let signals_path = dir.join("signals.csv");
        self.write_signals(signals, &signals_path)?;

        let trades_path = dir.join("trades.csv");
        write_rows(&trades_path, &report.trades)?;

        let net_worth_path = dir.join("net_worth.csv");
        let net_worth = report
            .performance
            .as_ref()
            .map(|p| p.daily_net_worth.as_slice())
            .unwrap_or_default();
        write_rows(&net_worth_path, net_worth)?;

        let summary_path = dir.join("summary.csv");
        let mut wtr = csv::Writer::from_path(&summary_path)?;
        wtr.write_record(["metric", "value"])?;
        for (metric, value) in summary_rows(report) {
            wtr.write_record([metric, value.as_str()])?;
        }
        wtr.flush()?;

        Ok(vec![signals_path, trades_path, net_worth_path, summary_path])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::{PerformanceReport, TradeStats};
    use crate::domain::portfolio::NetWorthPoint;
    use crate::domain::position::{ClosedTrade, ExitReason};
    use crate::domain::ranking::Timeframe;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn sample_signal(ticker: &str) -> SignalResult {
        SignalResult {
            ticker: ticker.into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            current_price: dec!(25.5),
            target_price: dec!(27.5),
            stop_loss: dec!(24),
            timeframe: Timeframe::ShortTerm,
            confidence: 72,
            score: 7.4,
            key_reasons: vec!["Price > SMA150".into(), "RSI > 50".into()],
            rationale: "Trend:0.71,Mom:0.80,Vol:0.70".into(),
        }
    }

    fn sample_report() -> BacktestReport {
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let trades = vec![ClosedTrade {
            ticker: "VNM".into(),
            shares: 100,
            entry_price: dec!(25.5),
            exit_price: dec!(27.6),
            entry_date: day,
            exit_date: NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
            reason: ExitReason::TargetReached,
            pnl: dec!(210),
        }];
        let net_worth = vec![
            NetWorthPoint {
                date: day,
                value: dec!(100000),
            },
            NetWorthPoint {
                date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                value: dec!(100210),
            },
        ];
        BacktestReport {
            performance: PerformanceReport::compute(&net_worth, dec!(100000)),
            trade_stats: TradeStats::compute(&trades),
            trades,
            open_holdings: 0,
        }
    }

    #[test]
    fn signals_csv_has_flat_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/signals.csv");
        CsvReportAdapter::new()
            .write_signals(&[sample_signal("VNM"), sample_signal("FPT")], &path)
            .unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "ticker,date,current_price,target_price,stop_loss,timeframe,confidence,score,key_reasons,rationale"
        );
        let first = lines.next().unwrap();
        assert!(first.starts_with("VNM,2024-03-01,25.5,27.5,24,short-term,72,7.4,"));
        assert!(first.contains("Price > SMA150;RSI > 50"));
        assert!(lines.next().unwrap().starts_with("FPT,"));
    }

    #[test]
    fn backtest_writes_all_files() {
        let dir = tempdir().unwrap();
        let files = CsvReportAdapter::new()
            .write_backtest(&sample_report(), &[sample_signal("VNM")], dir.path())
            .unwrap();
        assert_eq!(files.len(), 4);
        for f in &files {
            assert!(f.exists(), "{} missing", f.display());
        }

        let trades = fs::read_to_string(dir.path().join("trades.csv")).unwrap();
        assert!(trades.starts_with("ticker,shares,entry_price,exit_price"));
        assert!(trades.contains("target_reached"));

        let net_worth = fs::read_to_string(dir.path().join("net_worth.csv")).unwrap();
        assert_eq!(net_worth.lines().count(), 3);

        let summary = fs::read_to_string(dir.path().join("summary.csv")).unwrap();
        assert!(summary.contains("total_trades,1"));
        assert!(summary.contains("sharpe_ratio,"));
        assert!(summary.contains("profit_factor,\n") || summary.contains("profit_factor,\r\n"));
    }
}
