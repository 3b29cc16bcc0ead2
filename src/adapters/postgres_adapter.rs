//! PostgreSQL bar store.
//!
//! Reads a per-instrument table (`time TIMESTAMPTZ PRIMARY KEY`, `open_price`,
//! `close_price`, `high_price`, `low_price`, `volume` as NUMERIC). NUMERIC
//! columns decode straight into `Decimal`.

use crate::domain::error::MacrossError;
use crate::domain::price_bar::PriceBar;
use crate::ports::bar_sink::BarSink;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use postgres::NoTls;
use r2d2::{Pool, PooledConnection};
use r2d2_postgres::PostgresConnectionManager;
use rust_decimal::Decimal;

type Manager = PostgresConnectionManager<NoTls>;

pub struct PostgresAdapter {
    pool: Pool<Manager>,
    table: String,
    symbol: String,
}

fn query_error(e: postgres::Error) -> MacrossError {
    MacrossError::DatabaseQuery {
        reason: e.to_string(),
    }
}

/// Plain SQL identifier: letters, digits and underscores, not starting with a digit.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl PostgresAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, MacrossError> {
        let connection_string = config
            .get_string("postgres", "connection_string")
            .ok_or_else(|| MacrossError::ConfigMissing {
                section: "postgres".into(),
                key: "connection_string".into(),
            })?;

        let table = config
            .get_string("postgres", "table")
            .unwrap_or_else(|| "aapl_stock_data".to_string());
        if !is_identifier(&table) {
            return Err(MacrossError::ConfigInvalid {
                section: "postgres".into(),
                key: "table".into(),
                reason: format!("{table:?} is not a plain table name"),
            });
        }

        let symbol = config
            .get_string("data", "symbol")
            .ok_or_else(|| MacrossError::ConfigMissing {
                section: "data".into(),
                key: "symbol".into(),
            })?;

        let pg_config: postgres::Config =
            connection_string
                .parse()
                .map_err(|e: postgres::Error| MacrossError::ConfigInvalid {
                    section: "postgres".into(),
                    key: "connection_string".into(),
                    reason: e.to_string(),
                })?;

        let pool_size = config.get_int("postgres", "pool_size", 4).max(1) as u32;
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(PostgresConnectionManager::new(pg_config, NoTls))
            .map_err(|e| MacrossError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self {
            pool,
            table,
            symbol: symbol.trim().to_uppercase(),
        })
    }

    fn conn(&self) -> Result<PooledConnection<Manager>, MacrossError> {
        self.pool.get().map_err(|e| MacrossError::Database {
            reason: e.to_string(),
        })
    }

    fn holds(&self, symbol: &str) -> bool {
        self.symbol.eq_ignore_ascii_case(symbol)
    }
}

impl DataPort for PostgresAdapter {
    fn fetch_bars(&self, symbol: &str) -> Result<Vec<PriceBar>, MacrossError> {
        if !self.holds(symbol) {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT time, open_price, high_price, low_price, close_price, volume FROM {}",
            self.table
        );
        let rows = self.conn()?.query(&query, &[]).map_err(query_error)?;

        let bars = rows
            .into_iter()
            .map(|row| {
                let time: DateTime<Utc> = row.get(0);
                PriceBar {
                    symbol: self.symbol.clone(),
                    time: time.date_naive(),
                    open: row.get::<_, Decimal>(1),
                    high: row.get::<_, Decimal>(2),
                    low: row.get::<_, Decimal>(3),
                    close: row.get::<_, Decimal>(4),
                    volume: row.get::<_, Decimal>(5),
                }
            })
            .collect();

        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, MacrossError> {
        Ok(vec![self.symbol.clone()])
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MacrossError> {
        if !self.holds(symbol) {
            return Ok(None);
        }

        let query = format!("SELECT MIN(time), MAX(time), COUNT(*) FROM {}", self.table);
        let row = self.conn()?.query_one(&query, &[]).map_err(query_error)?;

        let min: Option<DateTime<Utc>> = row.get(0);
        let max: Option<DateTime<Utc>> = row.get(1);
        let count: i64 = row.get(2);

        match (min, max) {
            (Some(min), Some(max)) if count > 0 => {
                Ok(Some((min.date_naive(), max.date_naive(), count as usize)))
            }
            _ => Ok(None),
        }
    }
}

impl BarSink for PostgresAdapter {
    fn upsert_bars(&self, bars: &[PriceBar]) -> Result<usize, MacrossError> {
        let statement = format!(
            "INSERT INTO {} (time, open_price, close_price, high_price, low_price, volume) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (time) DO UPDATE SET \
                open_price = EXCLUDED.open_price, close_price = EXCLUDED.close_price, \
                high_price = EXCLUDED.high_price, low_price = EXCLUDED.low_price, \
                volume = EXCLUDED.volume",
            self.table
        );

        let mut conn = self.conn()?;
        let mut tx = conn.transaction().map_err(query_error)?;
        let mut written = 0;

        for bar in bars.iter().filter(|b| self.holds(&b.symbol)) {
            let time: DateTime<Utc> = bar.time.and_time(NaiveTime::MIN).and_utc();
            tx.execute(
                &statement,
                &[&time, &bar.open, &bar.close, &bar.high, &bar.low, &bar.volume],
            )
            .map_err(query_error)?;
            written += 1;
        }

        tx.commit().map_err(query_error)?;
        Ok(written)
    }
}
