#![allow(dead_code)]

use chrono::NaiveDate;
use macross::domain::error::MacrossError;
pub use macross::domain::price_bar::PriceBar;
use macross::ports::data_port::DataPort;
use rust_decimal::Decimal;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    fn check(&self, symbol: &str) -> Result<(), MacrossError> {
        match self.errors.get(symbol) {
            Some(reason) => Err(MacrossError::Database {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<PriceBar>, MacrossError> {
        self.check(symbol)?;
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, MacrossError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MacrossError> {
        self.check(symbol)?;
        let Some(bars) = self.data.get(symbol) else {
            return Ok(None);
        };
        let min = bars.iter().map(|b| b.time).min();
        let max = bars.iter().map(|b| b.time).max();
        Ok(min.zip(max).map(|(min, max)| (min, max, bars.len())))
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn make_bar(symbol: &str, day: &str, open: Decimal, close: Decimal) -> PriceBar {
    PriceBar {
        symbol: symbol.to_string(),
        time: date(day),
        open,
        high: open.max(close),
        low: open.min(close),
        close,
        volume: Decimal::from(1_000_000),
    }
}

/// Consecutive daily bars starting at `start`, one per `(open, close)` pair.
pub fn series(symbol: &str, start: &str, prices: &[(Decimal, Decimal)]) -> Vec<PriceBar> {
    let first = date(start);
    prices
        .iter()
        .enumerate()
        .map(|(i, &(open, close))| {
            let day = first + chrono::Duration::days(i as i64);
            make_bar(symbol, &day.format("%Y-%m-%d").to_string(), open, close)
        })
        .collect()
}

/// Three bars that buy 11 shares at 90 on 2024-01-02 and sell them at 120
/// on 2024-01-03 with both windows at 2 and 1000 invested.
pub fn crossover_bars(symbol: &str) -> Vec<PriceBar> {
    series(
        symbol,
        "2024-01-01",
        &[
            (Decimal::from(100), Decimal::from(100)),
            (Decimal::from(90), Decimal::from(100)),
            (Decimal::from(100), Decimal::from(120)),
        ],
    )
}

pub const CROSSOVER_EVENTS: [&str; 2] = [
    "Bought 11 stocks on 2024-01-02 for 90",
    "Sold 11 stocks on 2024-01-03 for 120",
];
