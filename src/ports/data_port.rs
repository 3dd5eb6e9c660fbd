//! Price data access port trait.

use crate::domain::error::SignalbenchError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `symbol` with `start <= date <= end`, ascending by date.
    /// Either bound may be open.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, SignalbenchError>;

    fn list_symbols(&self) -> Result<Vec<String>, SignalbenchError>;
}
