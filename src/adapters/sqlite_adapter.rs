//! SQLite bar store.
//!
//! Prices and volumes are stored as TEXT so they round-trip as exact decimals.

use crate::domain::error::MacrossError;
use crate::domain::price_bar::PriceBar;
use crate::ports::bar_sink::BarSink;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use super::parse_decimal;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_error(e: r2d2::Error) -> MacrossError {
    MacrossError::Database {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> MacrossError {
    MacrossError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn date_column(raw: &str) -> Result<NaiveDate, MacrossError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| MacrossError::DataFormat {
        reason: format!("invalid stored date {:?}: {}", raw, e),
    })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, MacrossError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| MacrossError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory() -> Result<Self, MacrossError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, MacrossError> {
        self.pool.get().map_err(pool_error)
    }

    pub fn initialize_schema(&self) -> Result<(), MacrossError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS price_bars (
                    symbol TEXT NOT NULL,
                    time TEXT NOT NULL,
                    open TEXT NOT NULL,
                    high TEXT NOT NULL,
                    low TEXT NOT NULL,
                    close TEXT NOT NULL,
                    volume TEXT NOT NULL,
                    PRIMARY KEY (symbol, time)
                );",
            )
            .map_err(query_error)
    }
}

impl BarSink for SqliteAdapter {
    fn upsert_bars(&self, bars: &[PriceBar]) -> Result<usize, MacrossError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO price_bars (symbol, time, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    bar.symbol,
                    bar.time.format("%Y-%m-%d").to_string(),
                    bar.open.to_string(),
                    bar.high.to_string(),
                    bar.low.to_string(),
                    bar.close.to_string(),
                    bar.volume.to_string(),
                ],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)?;
        Ok(bars.len())
    }
}

type RawRow = (String, String, String, String, String, String, String);

impl DataPort for SqliteAdapter {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<PriceBar>, MacrossError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT symbol, time, open, high, low, close, volume
                 FROM price_bars WHERE symbol = ?1",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map(params![symbol], |row| -> rusqlite::Result<RawRow> {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            })
            .map_err(query_error)?;

        let mut bars = Vec::new();
        for row in rows {
            let (symbol, time, open, high, low, close, volume) = row.map_err(query_error)?;
            bars.push(PriceBar {
                symbol,
                time: date_column(&time)?,
                open: parse_decimal("open", &open)?,
                high: parse_decimal("high", &high)?,
                low: parse_decimal("low", &low)?,
                close: parse_decimal("close", &close)?,
                volume: parse_decimal("volume", &volume)?,
            });
        }

        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, MacrossError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT symbol FROM price_bars ORDER BY symbol")
            .map_err(query_error)?;

        let rows = stmt.query_map([], |row| row.get(0)).map_err(query_error)?;

        let mut symbols = Vec::new();
        for row in rows {
            symbols.push(row.map_err(query_error)?);
        }
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MacrossError> {
        let result: (Option<String>, Option<String>, i64) = self
            .conn()?
            .query_row(
                "SELECT MIN(time), MAX(time), COUNT(*) FROM price_bars WHERE symbol = ?1",
                params![symbol],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(query_error)?;

        match result {
            (Some(min), Some(max), count) if count > 0 => {
                Ok(Some((date_column(&min)?, date_column(&max)?, count as usize)))
            }
            _ => Ok(None),
        }
    }
}
