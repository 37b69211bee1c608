//! CSV file data adapter.
//!
//! One `<TICKER>.csv` per instrument with a `date,open,high,low,close,volume`
//! header. Dates are `YYYY-MM-DD`.

use crate::domain::error::ScreenerError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }
}

fn data_error(reason: String) -> ScreenerError {
    ScreenerError::DataSource { reason }
}

fn field<'a>(
    record: &'a csv::StringRecord,
    index: usize,
    name: &str,
    line: usize,
) -> Result<&'a str, ScreenerError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| data_error(format!("line {}: missing {} column", line, name)))
}

fn number(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    line: usize,
) -> Result<f64, ScreenerError> {
    field(record, index, name, line)?
        .parse()
        .map_err(|e| data_error(format!("line {}: invalid {} value: {}", line, name, e)))
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(&self, ticker: &str) -> Result<Vec<OhlcvBar>, ScreenerError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path)
            .map_err(|e| data_error(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (i, result) in rdr.records().enumerate() {
            // header is line 1
            let line = i + 2;
            let record =
                result.map_err(|e| data_error(format!("{}: CSV parse error: {}", ticker, e)))?;

            let date_str = field(&record, 0, "date", line)?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
                .map_err(|e| data_error(format!("line {}: invalid date format: {}", line, e)))?;

            bars.push(OhlcvBar {
                date,
                open: number(&record, 1, "open", line)?,
                high: number(&record, 2, "high", line)?,
                low: number(&record, 3, "low", line)?,
                close: number(&record, 4, "close", line)?,
                volume: number(&record, 5, "volume", line)?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, ScreenerError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            data_error(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| data_error(format!("directory entry error: {}", e)))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                symbols.push(stem.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ScreenerError> {
        let bars = self.fetch_ohlcv(ticker)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
