//! Domain error types.

/// Why a set of raw backtest parameters was rejected.
///
/// Callers collapse every variant into one "bad request" outcome; the
/// variant only matters for logging.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing parameter {name}")]
    MissingParameter { name: &'static str },

    #[error("parameter {name} is not a non-negative integer: {value:?}")]
    NonNumericParameter { name: &'static str, value: String },

    #[error("parameter {name} out of range: {reason}")]
    OutOfRangeParameter { name: &'static str, reason: String },
}

/// Top-level error type for macross.
#[derive(Debug, thiserror::Error)]
pub enum MacrossError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no price bars for {symbol}")]
    EmptyDataset { symbol: String },

    #[error("malformed price data: {reason}")]
    DataFormat { reason: String },

    #[error("amount out of range: {reason}")]
    Arithmetic { reason: String },

    #[error("price download failed: {reason}")]
    Fetch { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&MacrossError> for std::process::ExitCode {
    fn from(err: &MacrossError) -> Self {
        let code: u8 = match err {
            MacrossError::Io(_) => 1,
            MacrossError::ConfigParse { .. }
            | MacrossError::ConfigMissing { .. }
            | MacrossError::ConfigInvalid { .. }
            | MacrossError::Validation(_)
            | MacrossError::Arithmetic { .. } => 2,
            MacrossError::Database { .. }
            | MacrossError::DatabaseQuery { .. }
            | MacrossError::Fetch { .. } => 3,
            MacrossError::DataFormat { .. } => 4,
            MacrossError::EmptyDataset { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
