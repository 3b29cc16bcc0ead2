//! Bar store port trait.

use crate::domain::error::MacrossError;
use crate::domain::price_bar::PriceBar;
use chrono::NaiveDate;

/// Read access to stored daily bars.
pub trait DataPort {
    /// Every stored bar for `symbol`, in no particular order.
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<PriceBar>, MacrossError>;

    fn list_symbols(&self) -> Result<Vec<String>, MacrossError>;

    /// First date, last date and bar count, or `None` when nothing is stored.
    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MacrossError>;
}
