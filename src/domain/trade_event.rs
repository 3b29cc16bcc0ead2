//! Trade log entries.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Bought,
    Sold,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Bought => write!(f, "Bought"),
            TradeAction::Sold => write!(f, "Sold"),
        }
    }
}

/// One buy or sell, in the order the engine performed it.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeEvent {
    pub action: TradeAction,
    pub share_count: u128,
    pub time: NaiveDate,
    pub price_per_share: Decimal,
}

/// Renders as `Bought 10 stocks on 2024-01-02 for 100`.
impl fmt::Display for TradeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} stocks on {} for {}",
            self.action,
            self.share_count,
            self.time.format("%Y-%m-%d"),
            self.price_per_share
        )
    }
}
