//! Concrete adapter implementations for ports.

#[cfg(feature = "postgres")]
pub mod postgres_adapter;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
#[cfg(any(feature = "web-sqlite", feature = "web-postgres"))]
pub mod scheduler;
#[cfg(any(feature = "web-sqlite", feature = "web-postgres"))]
pub mod web;
pub mod alpha_vantage;
pub mod csv_adapter;
pub mod file_config_adapter;

use crate::domain::error::MacrossError;
use crate::domain::price_bar::PriceBar;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

/// Parse a stored price or volume as an exact decimal.
pub(crate) fn parse_decimal(name: &str, raw: &str) -> Result<Decimal, MacrossError> {
    Decimal::from_str(raw.trim()).map_err(|e| MacrossError::DataFormat {
        reason: format!("invalid {} value {:?}: {}", name, raw, e),
    })
}

/// Load bars for `symbol` from an Alpha Vantage `.json` document or a bar
/// `.csv` file, keeping dates on or after `since`.
pub fn load_bars_file(
    path: &Path,
    symbol: &str,
    since: Option<NaiveDate>,
) -> Result<Vec<PriceBar>, MacrossError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("json") => alpha_vantage::read_daily_series(path, symbol, since),
        Some("csv") => {
            let mut bars = csv_adapter::read_bars(path, symbol)?;
            bars.retain(|b| since.is_none_or(|start| b.time >= start));
            Ok(bars)
        }
        _ => Err(MacrossError::DataFormat {
            reason: format!("{} is neither .json nor .csv", path.display()),
        }),
    }
}
