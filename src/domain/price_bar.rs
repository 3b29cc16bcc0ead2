//! Daily price bar for one instrument.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// One trading day of OHLCV data as handed over by the bar store.
/// Prices are exact decimals; `time` is the calendar day and the ordering key.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub symbol: String,
    pub time: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}
