//! Bar source port.

use crate::domain::error::ScreenerError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Full daily history for one ticker, oldest first.
    fn fetch_ohlcv(&self, ticker: &str) -> Result<Vec<OhlcvBar>, ScreenerError>;

    fn list_symbols(&self) -> Result<Vec<String>, ScreenerError>;

    /// First date, last date and bar count; `None` when the ticker has no bars.
    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ScreenerError>;
}
