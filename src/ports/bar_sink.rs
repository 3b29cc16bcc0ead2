//! Writable bar store port trait, used by ingestion.

use crate::domain::error::MacrossError;
use crate::domain::price_bar::PriceBar;

pub trait BarSink {
    /// Insert or replace bars keyed by (symbol, time). Returns the count written.
    fn upsert_bars(&self, bars: &[PriceBar]) -> Result<usize, MacrossError>;
}
