//! Daily bar refresh.
//!
//! The scheduler is a plain value built and owned by the `serve` command.
//! It sleeps until the configured UTC time, runs its job on a blocking
//! thread, logs the outcome and repeats. Jobs either download the daily
//! series or re-import a file dropped on disk.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::adapters::load_bars_file;
use crate::domain::error::MacrossError;
use crate::domain::price_bar::PriceBar;
use crate::domain::settings::RefreshSettings;
use crate::ports::bar_sink::BarSink;
use crate::ports::series_source::SeriesSource;

/// Unit of work run once per day.
pub trait RefreshJob: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the number of bars written.
    fn run(&self) -> Result<usize, MacrossError>;
}

fn store_bars(
    sink: &dyn BarSink,
    symbol: &str,
    bars: Vec<PriceBar>,
) -> Result<usize, MacrossError> {
    if bars.is_empty() {
        return Err(MacrossError::EmptyDataset {
            symbol: symbol.to_string(),
        });
    }
    sink.upsert_bars(&bars)
}

/// Downloads the daily series and upserts it into a writable store.
pub struct FetchJob {
    pub source: Arc<dyn SeriesSource>,
    pub symbol: String,
    pub since: Option<NaiveDate>,
    pub sink: Arc<dyn BarSink + Send + Sync>,
}

impl RefreshJob for FetchJob {
    fn name(&self) -> &str {
        self.source.name()
    }

    fn run(&self) -> Result<usize, MacrossError> {
        let bars = self.source.fetch_daily(&self.symbol, self.since)?;
        store_bars(&*self.sink, &self.symbol, bars)
    }
}

/// Re-imports a bar file (Alpha Vantage JSON or CSV) into a writable store.
pub struct FileImportJob {
    pub path: PathBuf,
    pub symbol: String,
    pub since: Option<NaiveDate>,
    pub sink: Arc<dyn BarSink + Send + Sync>,
}

impl RefreshJob for FileImportJob {
    fn name(&self) -> &str {
        "file-import"
    }

    fn run(&self) -> Result<usize, MacrossError> {
        let bars = load_bars_file(&self.path, &self.symbol, self.since)?;
        store_bars(&*self.sink, &self.symbol, bars)
    }
}

pub struct RefreshScheduler {
    job: Arc<dyn RefreshJob>,
    at: NaiveTime,
}

impl RefreshScheduler {
    pub fn new(job: Arc<dyn RefreshJob>, at: NaiveTime) -> Self {
        Self { job, at }
    }

    pub fn from_settings(settings: &RefreshSettings, job: Arc<dyn RefreshJob>) -> Self {
        Self::new(job, settings.at)
    }

    pub fn spawn(self) -> JoinHandle<()> {
        info!(
            "refresh scheduler started: job {} daily at {} UTC",
            self.job.name(),
            self.at.format("%H:%M")
        );
        tokio::spawn(async move {
            loop {
                let now = Utc::now();
                let next = next_run_after(now, self.at);
                let wait = (next - now).to_std().unwrap_or_default();
                tokio::time::sleep(wait).await;
                self.run_once().await;
            }
        })
    }

    /// Run the job now on a blocking thread and log how it went.
    pub async fn run_once(&self) -> Option<usize> {
        let job = Arc::clone(&self.job);
        match tokio::task::spawn_blocking(move || job.run()).await {
            Ok(Ok(written)) => {
                info!("refresh job {} wrote {} bars", self.job.name(), written);
                Some(written)
            }
            Ok(Err(e)) => {
                warn!("refresh job {} failed: {}", self.job.name(), e);
                None
            }
            Err(e) => {
                warn!("refresh job {} panicked: {}", self.job.name(), e);
                None
            }
        }
    }
}

/// The first instant strictly after `now` whose UTC time of day is `at`.
pub fn next_run_after(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}
