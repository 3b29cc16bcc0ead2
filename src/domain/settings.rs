//! Typed views over the INI sections.
//!
//! Each `from_config` reads one concern out of a [`ConfigPort`] and reports
//! the first bad or missing key. Consumers match on the enums instead of
//! comparing strings.

use chrono::{NaiveDate, NaiveTime};
use std::fmt;
use std::path::PathBuf;

use crate::domain::error::MacrossError;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";

/// Where stored bars live, from `[data] source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Sqlite,
    Csv,
    Postgres,
}

impl DataSource {
    pub const ALL: [DataSource; 3] = [DataSource::Sqlite, DataSource::Csv, DataSource::Postgres];

    /// Defaults to sqlite when unset.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, MacrossError> {
        let Some(raw) = config.get_string("data", "source") else {
            return Ok(DataSource::Sqlite);
        };
        let wanted = raw.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == wanted)
            .ok_or_else(|| MacrossError::ConfigInvalid {
                section: "data".into(),
                key: "source".into(),
                reason: format!("unknown source {wanted:?}, expected one of sqlite, csv, postgres"),
            })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DataSource::Sqlite => "sqlite",
            DataSource::Csv => "csv",
            DataSource::Postgres => "postgres",
        }
    }

    /// The `(section, key)` a store of this kind cannot open without.
    pub fn required_key(self) -> (&'static str, &'static str) {
        match self {
            DataSource::Sqlite => ("sqlite", "path"),
            DataSource::Csv => ("csv", "dir"),
            DataSource::Postgres => ("postgres", "connection_string"),
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the nightly refresh pulls bars from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshSource {
    /// Download `TIME_SERIES_DAILY` from Alpha Vantage.
    AlphaVantage,
    /// Re-import a file another process drops on disk.
    File(PathBuf),
}

/// `[refresh]`: when and from where the store is topped up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSettings {
    pub at: NaiveTime,
    pub source: RefreshSource,
    pub since: Option<NaiveDate>,
}

impl RefreshSettings {
    /// `None` unless `[refresh] enabled` is set. The time of day is checked
    /// either way so a typo does not wait until the job is switched on.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Option<Self>, MacrossError> {
        let hour = bounded(config, "hour", 23)?;
        let minute = bounded(config, "minute", 59)?;
        if !config.get_bool("refresh", "enabled", false) {
            return Ok(None);
        }

        let at = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
        let source = match config
            .get_string("refresh", "source")
            .map(|s| s.trim().to_lowercase())
            .as_deref()
        {
            None | Some("api") => RefreshSource::AlphaVantage,
            Some("file") => match config.get_string("refresh", "source_file") {
                Some(path) => RefreshSource::File(PathBuf::from(path)),
                None => return Err(missing("refresh", "source_file")),
            },
            Some(other) => {
                return Err(invalid(
                    "source",
                    format!("unknown refresh source {other:?}, expected api or file"),
                ));
            }
        };

        let since = match config.get_string("refresh", "since") {
            Some(raw) => Some(
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .map_err(|e| invalid("since", format!("{raw:?} is not YYYY-MM-DD: {e}")))?,
            ),
            None => None,
        };

        Ok(Some(Self { at, source, since }))
    }
}

fn bounded(config: &dyn ConfigPort, key: &str, max: i64) -> Result<u32, MacrossError> {
    let value = config.get_int("refresh", key, 0);
    if !(0..=max).contains(&value) {
        return Err(invalid(key, format!("{key} must be between 0 and {max}")));
    }
    Ok(value as u32)
}

/// `[alpha_vantage]`: credentials for the daily series download.
#[derive(Clone, PartialEq, Eq)]
pub struct AlphaVantageSettings {
    pub api_key: String,
    pub base_url: String,
}

impl AlphaVantageSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, MacrossError> {
        let api_key = config
            .get_string("alpha_vantage", "api_key")
            .ok_or_else(|| missing("alpha_vantage", "api_key"))?;
        let base_url = config
            .get_string("alpha_vantage", "base_url")
            .unwrap_or_else(|| DEFAULT_ALPHA_VANTAGE_URL.to_string());
        Ok(Self { api_key, base_url })
    }
}

// keeps the key out of logs
impl fmt::Debug for AlphaVantageSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlphaVantageSettings")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn missing(section: &str, key: &str) -> MacrossError {
    MacrossError::ConfigMissing {
        section: section.into(),
        key: key.into(),
    }
}

fn invalid(key: &str, reason: String) -> MacrossError {
    MacrossError::ConfigInvalid {
        section: "refresh".into(),
        key: key.into(),
        reason,
    }
}
