//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::alpha_vantage::AlphaVantageClient;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::load_bars_file;
use crate::domain::backtest::{BacktestOutcome, BacktestReport, backtest_from_store};
use crate::domain::config_validation::validate_config;
use crate::domain::error::MacrossError;
use crate::domain::price_bar::PriceBar;
use crate::domain::request::validate;
use crate::domain::settings::DataSource;
use crate::ports::bar_sink::BarSink;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::series_source::SeriesSource;

pub type SharedDataPort = Arc<dyn DataPort + Send + Sync>;
pub type SharedBarSink = Arc<dyn BarSink + Send + Sync>;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8000";

#[derive(Parser, Debug)]
#[command(name = "macross", about = "Moving-average crossover backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over the stored bars
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        investing_amount: Option<String>,
        #[arg(long)]
        buy_period: Option<String>,
        #[arg(long)]
        sell_period: Option<String>,
        #[arg(long)]
        symbol: Option<String>,
        /// Print `{"profit", "events"}` on stdout
        #[arg(long)]
        json: bool,
    },
    /// Load an Alpha Vantage JSON or bar CSV file into the configured store
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        file: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        /// Drop bars dated before YYYY-MM-DD
        #[arg(long)]
        since: Option<NaiveDate>,
    },
    /// Download the daily series from Alpha Vantage into the configured store
    Fetch {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        /// Drop bars dated before YYYY-MM-DD
        #[arg(long)]
        since: Option<NaiveDate>,
    },
    /// Show bar count and date range for a symbol
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        /// Every symbol in the store
        #[arg(long, conflicts_with = "symbol")]
        all: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Start the web server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            investing_amount,
            buy_period,
            sell_period,
            symbol,
            json,
        } => run_backtest(
            &config,
            investing_amount.as_deref(),
            buy_period.as_deref(),
            sell_period.as_deref(),
            symbol.as_deref(),
            json,
        ),
        Command::Import {
            config,
            file,
            symbol,
            since,
        } => run_import(&config, &file, symbol.as_deref(), since),
        Command::Fetch {
            config,
            symbol,
            since,
        } => run_fetch(&config, symbol.as_deref(), since),
        Command::Info {
            config,
            symbol,
            all,
        } => {
            if all {
                run_info_all(&config)
            } else {
                run_info(&config, symbol.as_deref())
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Serve { config } => run_serve(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Read an INI file, layer `MACROSS__SECTION__KEY` variables over it and
/// validate the result.
pub fn load_config(path: &Path) -> Result<FileConfigAdapter, MacrossError> {
    let config = FileConfigAdapter::from_file(path)?.with_env();
    validate_config(&config)?;
    Ok(config)
}

/// `--symbol` if given, else `[data] symbol`, uppercased.
pub fn resolve_symbol(symbol_override: Option<&str>, config: &dyn ConfigPort) -> String {
    symbol_override
        .map(str::to_string)
        .or_else(|| config.get_string("data", "symbol"))
        .unwrap_or_default()
        .trim()
        .to_uppercase()
}

#[cfg(not(all(feature = "sqlite", feature = "postgres")))]
fn feature_disabled(source: DataSource) -> MacrossError {
    MacrossError::ConfigInvalid {
        section: "data".into(),
        key: "source".into(),
        reason: format!("{source} support is not compiled in (enable the `{source}` feature)"),
    }
}

pub fn open_data_port(config: &dyn ConfigPort) -> Result<SharedDataPort, MacrossError> {
    match DataSource::from_config(config)? {
        DataSource::Csv => {
            let dir = config
                .get_string("csv", "dir")
                .ok_or_else(|| MacrossError::ConfigMissing {
                    section: "csv".into(),
                    key: "dir".into(),
                })?;
            Ok(Arc::new(CsvAdapter::new(PathBuf::from(dir))) as SharedDataPort)
        }
        #[cfg(feature = "sqlite")]
        DataSource::Sqlite => {
            let adapter = crate::adapters::sqlite_adapter::SqliteAdapter::from_config(config)?;
            Ok(Arc::new(adapter) as SharedDataPort)
        }
        #[cfg(feature = "postgres")]
        DataSource::Postgres => {
            let adapter = crate::adapters::postgres_adapter::PostgresAdapter::from_config(config)?;
            Ok(Arc::new(adapter) as SharedDataPort)
        }
        #[cfg(not(all(feature = "sqlite", feature = "postgres")))]
        other => Err(feature_disabled(other)),
    }
}

/// Writable store for ingestion. CSV directories are read-only.
pub fn open_bar_sink(config: &dyn ConfigPort) -> Result<SharedBarSink, MacrossError> {
    match DataSource::from_config(config)? {
        DataSource::Csv => Err(MacrossError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: "csv stores are read-only; import into sqlite or postgres".into(),
        }),
        #[cfg(feature = "sqlite")]
        DataSource::Sqlite => {
            let adapter = crate::adapters::sqlite_adapter::SqliteAdapter::from_config(config)?;
            Ok(Arc::new(adapter) as SharedBarSink)
        }
        #[cfg(feature = "postgres")]
        DataSource::Postgres => {
            let adapter = crate::adapters::postgres_adapter::PostgresAdapter::from_config(config)?;
            Ok(Arc::new(adapter) as SharedBarSink)
        }
        #[cfg(not(all(feature = "sqlite", feature = "postgres")))]
        other => Err(feature_disabled(other)),
    }
}

pub fn outcome_json(outcome: &BacktestOutcome) -> Result<String, MacrossError> {
    serde_json::to_string(&BacktestReport::from(outcome)).map_err(|e| MacrossError::DataFormat {
        reason: format!("failed to encode result: {e}"),
    })
}

pub fn run_backtest(
    config_path: &Path,
    investing_amount: Option<&str>,
    buy_period: Option<&str>,
    sell_period: Option<&str>,
    symbol_override: Option<&str>,
    json: bool,
) -> Result<(), MacrossError> {
    let request = validate(investing_amount, sell_period, buy_period).map_err(|e| {
        debug!("rejected backtest parameters: {e:?}");
        MacrossError::from(e)
    })?;

    let config = load_config(config_path)?;
    let symbol = resolve_symbol(symbol_override, &config);
    let data_port = open_data_port(&config)?;

    let outcome = backtest_from_store(&*data_port, &symbol, &request)?;

    if json {
        println!("{}", outcome_json(&outcome)?);
        return Ok(());
    }

    eprintln!(
        "Backtest {}: investing {} with buy period {} and sell period {}",
        symbol, request.investing_amount, request.buy_period, request.sell_period
    );
    for line in outcome.event_lines() {
        println!("{line}");
    }
    eprintln!("Final cash:  {}", outcome.final_cash);
    eprintln!("Profit:      {}", outcome.profit);
    Ok(())
}

/// Dates that appear more than once; the store keeps the later bar.
fn duplicate_dates(bars: &[PriceBar]) -> usize {
    let mut seen = HashSet::with_capacity(bars.len());
    bars.iter().filter(|b| !seen.insert(b.time)).count()
}

pub fn run_import(
    config_path: &Path,
    file: &Path,
    symbol_override: Option<&str>,
    since: Option<NaiveDate>,
) -> Result<(), MacrossError> {
    let config = load_config(config_path)?;
    let symbol = resolve_symbol(symbol_override, &config);

    let bars = load_bars_file(file, &symbol, since)?;
    if bars.is_empty() {
        return Err(MacrossError::EmptyDataset { symbol });
    }

    let duplicates = duplicate_dates(&bars);
    if duplicates > 0 {
        warn!(
            "{} duplicate dates in {}; keeping the later bar for each",
            duplicates,
            file.display()
        );
    }

    let sink = open_bar_sink(&config)?;
    let written = sink.upsert_bars(&bars)?;
    info!("imported {} bars for {} from {}", written, symbol, file.display());
    eprintln!("Imported {} bars for {}", written, symbol);
    Ok(())
}

/// Download the daily series for the symbol and upsert it. The store is
/// opened first so a read-only source fails before any request is made.
pub fn run_fetch(
    config_path: &Path,
    symbol_override: Option<&str>,
    since: Option<NaiveDate>,
) -> Result<(), MacrossError> {
    let config = load_config(config_path)?;
    let symbol = resolve_symbol(symbol_override, &config);
    let sink = open_bar_sink(&config)?;
    let client = AlphaVantageClient::from_config(&config)?;

    let bars = client.fetch_daily(&symbol, since)?;
    if bars.is_empty() {
        return Err(MacrossError::EmptyDataset { symbol });
    }

    let written = sink.upsert_bars(&bars)?;
    info!("fetched {} bars for {} from {}", written, symbol, client.name());
    eprintln!("Fetched {} bars for {}", written, symbol);
    Ok(())
}

pub fn run_info(config_path: &Path, symbol_override: Option<&str>) -> Result<(), MacrossError> {
    let config = load_config(config_path)?;
    let symbol = resolve_symbol(symbol_override, &config);
    let data_port = open_data_port(&config)?;

    match data_port.get_data_range(&symbol)? {
        Some((first, last, count)) => {
            println!("{symbol}: {count} bars from {first} to {last}");
            Ok(())
        }
        None => Err(MacrossError::EmptyDataset { symbol }),
    }
}

pub fn run_info_all(config_path: &Path) -> Result<(), MacrossError> {
    let config = load_config(config_path)?;
    let data_port = open_data_port(&config)?;

    let symbols = data_port.list_symbols()?;
    if symbols.is_empty() {
        eprintln!("No symbols stored");
    }
    for symbol in symbols {
        match data_port.get_data_range(&symbol)? {
            Some((first, last, count)) => println!("{symbol}: {count} bars from {first} to {last}"),
            None => println!("{symbol}: no bars"),
        }
    }
    Ok(())
}

pub fn run_validate(config_path: &Path) -> Result<(), MacrossError> {
    let config = load_config(config_path)?;
    eprintln!(
        "Configuration OK: source {}, symbol {}",
        DataSource::from_config(&config)?,
        resolve_symbol(None, &config)
    );
    Ok(())
}

#[cfg(any(feature = "web-sqlite", feature = "web-postgres"))]
fn run_serve(config_path: &Path) -> Result<(), MacrossError> {
    use crate::adapters::scheduler::{FetchJob, FileImportJob, RefreshJob, RefreshScheduler};
    use crate::domain::settings::{RefreshSettings, RefreshSource};
    use crate::adapters::web::{AppState, build_router};
    use std::net::SocketAddr;

    let config = load_config(config_path)?;
    let symbol = resolve_symbol(None, &config);
    let data_port = open_data_port(&config)?;

    let listen = config
        .get_string("web", "listen")
        .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
    let addr: SocketAddr =
        listen
            .trim()
            .parse()
            .map_err(|e: std::net::AddrParseError| MacrossError::ConfigInvalid {
                section: "web".into(),
                key: "listen".into(),
                reason: e.to_string(),
            })?;

    // the blocking http client has to be built before the runtime starts
    let scheduler = match RefreshSettings::from_config(&config)? {
        Some(settings) => {
            let sink = open_bar_sink(&config)?;
            let job: Arc<dyn RefreshJob> = match &settings.source {
                RefreshSource::AlphaVantage => Arc::new(FetchJob {
                    source: Arc::new(AlphaVantageClient::from_config(&config)?),
                    symbol: symbol.clone(),
                    since: settings.since,
                    sink,
                }),
                RefreshSource::File(path) => Arc::new(FileImportJob {
                    path: path.clone(),
                    symbol: symbol.clone(),
                    since: settings.since,
                    sink,
                }),
            };
            Some(RefreshScheduler::from_settings(&settings, job))
        }
        None => None,
    };

    let router = build_router(AppState { data_port, symbol });
    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async move {
        if let Some(scheduler) = scheduler {
            scheduler.spawn();
        }
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("listening on {addr}");
        eprintln!("Starting web server on {addr}");
        axum::serve(listener, router).await?;
        Ok::<(), MacrossError>(())
    })
}

#[cfg(not(any(feature = "web-sqlite", feature = "web-postgres")))]
fn run_serve(_config_path: &Path) -> Result<(), MacrossError> {
    Err(MacrossError::ConfigInvalid {
        section: "web".into(),
        key: "listen".into(),
        reason: "web server support is not compiled in (enable the `web` feature)".into(),
    })
}
