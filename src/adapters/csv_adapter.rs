//! CSV file bar store.
//!
//! One `<SYMBOL>.csv` per instrument with the header
//! `time,open,high,low,close,volume` and dates as `YYYY-MM-DD`.

use crate::domain::error::MacrossError;
use crate::domain::price_bar::PriceBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};

use super::parse_decimal;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

/// Parse every row of a bar CSV file, keeping file order.
pub fn read_bars(path: &Path, symbol: &str) -> Result<Vec<PriceBar>, MacrossError> {
    let content = fs::read_to_string(path).map_err(|e| MacrossError::Database {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;

    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut bars = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| MacrossError::DataFormat {
            reason: format!("CSV parse error: {}", e),
        })?;

        let time_str = field(&record, 0, "time")?;
        let time = NaiveDate::parse_from_str(time_str, "%Y-%m-%d").map_err(|e| {
            MacrossError::DataFormat {
                reason: format!("invalid date {:?}: {}", time_str, e),
            }
        })?;

        bars.push(PriceBar {
            symbol: symbol.to_string(),
            time,
            open: decimal_field(&record, 1, "open")?,
            high: decimal_field(&record, 2, "high")?,
            low: decimal_field(&record, 3, "low")?,
            close: decimal_field(&record, 4, "close")?,
            volume: decimal_field(&record, 5, "volume")?,
        });
    }

    Ok(bars)
}

fn field<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<&'r str, MacrossError> {
    record.get(index).ok_or_else(|| MacrossError::DataFormat {
        reason: format!("missing {} column", name),
    })
}

fn decimal_field(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<Decimal, MacrossError> {
    parse_decimal(name, field(record, index, name)?)
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<PriceBar>, MacrossError> {
        read_bars(&self.csv_path(symbol), symbol)
    }

    fn list_symbols(&self) -> Result<Vec<String>, MacrossError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| MacrossError::Database {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| MacrossError::Database {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MacrossError> {
        let path = self.csv_path(symbol);
        if !path.exists() {
            return Ok(None);
        }

        let bars = read_bars(&path, symbol)?;
        let min = bars.iter().map(|b| b.time).min();
        let max = bars.iter().map(|b| b.time).max();
        Ok(min.zip(max).map(|(min, max)| (min, max, bars.len())))
    }
}
