//! Upstream price-series port.

use chrono::NaiveDate;

use crate::domain::error::MacrossError;
use crate::domain::price_bar::PriceBar;

/// A remote provider of daily bars.
pub trait SeriesSource: Send + Sync {
    fn name(&self) -> &str;

    /// Every daily bar for `symbol` dated on or after `since`, sorted by date.
    fn fetch_daily(
        &self,
        symbol: &str,
        since: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, MacrossError>;
}
