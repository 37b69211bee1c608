//! JSON report adapter.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::error::ScreenerError;
use crate::domain::metrics::BacktestReport;
use crate::domain::ranking::SignalResult;
use crate::ports::report_port::ReportPort;

#[derive(Serialize)]
struct BacktestDocument<'a> {
    #[serde(flatten)]
    report: &'a BacktestReport,
    signals: &'a [SignalResult],
}

pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ScreenerError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

impl ReportPort for JsonReportAdapter {
    fn write_signals(&self, signals: &[SignalResult], path: &Path) -> Result<(), ScreenerError> {
        write_json(path, signals)
    }

    fn write_backtest(
        &self,
        report: &BacktestReport,
        signals: &[SignalResult],
        dir: &Path,
    ) -> Result<Vec<PathBuf>, ScreenerError> {
        let path = dir.join("backtest.json");
        write_json(&path, &BacktestDocument { report, signals })?;
        Ok(vec![path])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::{PerformanceReport, TradeStats};
    use crate::domain::portfolio::NetWorthPoint;
    use crate::domain::ranking::Timeframe;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn sample_signal() -> SignalResult {
        SignalResult {
            ticker: "HPG".into(),
            date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            current_price: dec!(30.15),
            target_price: dec!(32.55),
            stop_loss: dec!(28.35),
            timeframe: Timeframe::MediumTerm,
            confidence: 61,
            score: 6.8,
            key_reasons: vec!["MACD > Signal".into()],
            rationale: "Trend:1.00,Mom:0.40,Vol:0.30".into(),
        }
    }

    #[test]
    fn signals_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/signals.json");
        let signals = vec![sample_signal()];
        JsonReportAdapter::new()
            .write_signals(&signals, &path)
            .unwrap();

        let parsed: Vec<SignalResult> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, signals);
    }

    #[test]
    fn signal_fields_are_named_for_consumers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("signals.json");
        JsonReportAdapter::new()
            .write_signals(&[sample_signal()], &path)
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["timeframe"], "medium-term");
        assert_eq!(value[0]["target_price"], "32.55");
        assert_eq!(value[0]["key_reasons"][0], "MACD > Signal");
    }

    #[test]
    fn backtest_document_flattens_report() {
        let dir = tempdir().unwrap();
        let net_worth = vec![NetWorthPoint {
            date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            value: dec!(1000),
        }];
        let report = BacktestReport {
            performance: PerformanceReport::compute(&net_worth, dec!(1000)),
            trade_stats: TradeStats::compute(&[]),
            trades: Vec::new(),
            open_holdings: 0,
        };

        let files = JsonReportAdapter::new()
            .write_backtest(&report, &[sample_signal()], dir.path())
            .unwrap();
        assert_eq!(files, vec![dir.path().join("backtest.json")]);

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&files[0]).unwrap()).unwrap();
        assert_eq!(value["performance"]["trading_days"], 1);
        assert_eq!(value["performance"]["sharpe_ratio"], 0.0);
        assert_eq!(value["trade_stats"]["total_trades"], 0);
        assert!(value["trade_stats"]["profit_factor"].is_null());
        assert_eq!(value["signals"][0]["ticker"], "HPG");
    }
}
