//! Report sink port.

use crate::domain::error::ScreenerError;
use crate::domain::metrics::BacktestReport;
use crate::domain::ranking::SignalResult;
use std::path::{Path, PathBuf};

pub trait ReportPort {
    /// Write the signal list to `path`.
    fn write_signals(&self, signals: &[SignalResult], path: &Path) -> Result<(), ScreenerError>;

    /// Write a backtest report into `dir`, returning the files created.
    fn write_backtest(
        &self,
        report: &BacktestReport,
        signals: &[SignalResult],
        dir: &Path,
    ) -> Result<Vec<PathBuf>, ScreenerError>;
}
