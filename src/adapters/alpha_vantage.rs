//! Alpha Vantage `TIME_SERIES_DAILY` documents and the client that fetches them.
//!
//! The same parser reads a downloaded response body and a document saved to
//! disk. Prices arrive as strings and are kept as exact decimals.

use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::domain::error::MacrossError;
use crate::domain::price_bar::PriceBar;
use crate::domain::settings::AlphaVantageSettings;
use crate::ports::config_port::ConfigPort;
use crate::ports::series_source::SeriesSource;

use super::parse_decimal;

/// Top level of a `TIME_SERIES_DAILY` response. A throttled or rejected
/// call comes back as 200 with one of the message fields instead of a series.
#[derive(Debug, Deserialize)]
struct DailySeriesDocument {
    #[serde(rename = "Time Series (Daily)")]
    series: Option<BTreeMap<String, DailyValues>>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DailyValues {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

impl DailyValues {
    fn into_bar(self, symbol: &str, time: NaiveDate) -> Result<PriceBar, MacrossError> {
        Ok(PriceBar {
            symbol: symbol.to_string(),
            time,
            open: parse_decimal("open", &self.open)?,
            high: parse_decimal("high", &self.high)?,
            low: parse_decimal("low", &self.low)?,
            close: parse_decimal("close", &self.close)?,
            volume: parse_decimal("volume", &self.volume)?,
        })
    }
}

/// Bars on or after `since`, sorted by date.
pub fn parse_daily_series(
    json: &str,
    symbol: &str,
    since: Option<NaiveDate>,
) -> Result<Vec<PriceBar>, MacrossError> {
    let document: DailySeriesDocument =
        serde_json::from_str(json).map_err(|e| MacrossError::DataFormat {
            reason: format!("invalid daily series document: {e}"),
        })?;

    let Some(series) = document.series else {
        let upstream = document
            .error_message
            .or(document.note)
            .or(document.information);
        return Err(MacrossError::DataFormat {
            reason: match upstream {
                Some(message) => format!("no daily series in document: {message}"),
                None => "no daily series in document".to_string(),
            },
        });
    };

    let mut bars = Vec::with_capacity(series.len());
    for (date_str, values) in series {
        let time = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
            MacrossError::DataFormat {
                reason: format!("invalid date {date_str:?}: {e}"),
            }
        })?;
        if since.is_some_and(|start| time < start) {
            continue;
        }
        bars.push(values.into_bar(symbol, time)?);
    }

    bars.sort_by_key(|b| b.time);
    Ok(bars)
}

pub fn read_daily_series(
    path: &Path,
    symbol: &str,
    since: Option<NaiveDate>,
) -> Result<Vec<PriceBar>, MacrossError> {
    let json = fs::read_to_string(path)?;
    parse_daily_series(&json, symbol, since)
}

/// Blocking client for the daily series endpoint.
///
/// Connection failures, timeouts and 5xx answers are retried with
/// exponential backoff. Must be built outside an async context.
pub struct AlphaVantageClient {
    http: reqwest::blocking::Client,
    settings: AlphaVantageSettings,
    max_retries: u32,
    base_delay: Duration,
}

impl AlphaVantageClient {
    pub fn new(settings: AlphaVantageSettings) -> Result<Self, MacrossError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("macross/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(fetch_error)?;
        Ok(Self {
            http,
            settings,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, MacrossError> {
        Self::new(AlphaVantageSettings::from_config(config)?)
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    fn request(&self, symbol: &str) -> Result<reqwest::blocking::Request, MacrossError> {
        self.http
            .get(&self.settings.base_url)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", "full"),
                ("apikey", self.settings.api_key.as_str()),
            ])
            .build()
            .map_err(fetch_error)
    }

    fn download(&self, symbol: &str) -> Result<String, MacrossError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                debug!("retrying {symbol} download in {delay:?}");
                std::thread::sleep(delay);
            }

            match self.http.execute(self.request(symbol)?) {
                Ok(response) => {
                    let status = response.status();
                    info!("alpha vantage answered {status} for {symbol}");
                    if status.is_success() {
                        return response.text().map_err(fetch_error);
                    }
                    let failure = MacrossError::Fetch {
                        reason: format!("HTTP {status} for {symbol}"),
                    };
                    if !status.is_server_error() {
                        return Err(failure);
                    }
                    last_error = Some(failure);
                }
                Err(e) if e.is_connect() || e.is_timeout() => {
                    let failure = fetch_error(e);
                    warn!("alpha vantage unreachable for {symbol}: {failure}");
                    last_error = Some(failure);
                }
                Err(e) => return Err(fetch_error(e)),
            }
        }

        Err(last_error.unwrap_or_else(|| MacrossError::Fetch {
            reason: "max retries exceeded".into(),
        }))
    }
}

impl SeriesSource for AlphaVantageClient {
    fn name(&self) -> &str {
        "alpha_vantage"
    }

    fn fetch_daily(
        &self,
        symbol: &str,
        since: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, MacrossError> {
        let body = self.download(symbol)?;
        parse_daily_series(&body, symbol, since)
    }
}

// the request URL carries the api key
fn fetch_error(e: reqwest::Error) -> MacrossError {
    MacrossError::Fetch {
        reason: e.without_url().to_string(),
    }
}
