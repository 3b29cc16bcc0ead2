//! HTTP error responses for the web adapter.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::{debug, error};

use crate::domain::error::MacrossError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Uniform rejection of bad parameters; the body stays empty.
    pub fn bad_request() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

/// Parameter problems are the client's; everything else is ours. The
/// backtest route never raises `EmptyDataset` because an empty store is a
/// zero outcome.
pub fn status_from_error(err: &MacrossError) -> StatusCode {
    match err {
        MacrossError::Validation(_) | MacrossError::Arithmetic { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<MacrossError> for WebError {
    fn from(err: MacrossError) -> Self {
        let status = status_from_error(&err);
        if status == StatusCode::BAD_REQUEST {
            debug!("rejected backtest request: {err}");
            return Self::bad_request();
        }
        error!("backtest request failed: {err}");
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ValidationError;

    #[test]
    fn parameter_failures_are_bad_requests() {
        let err = MacrossError::from(ValidationError::MissingParameter {
            name: "buy_period",
        });
        assert_eq!(status_from_error(&err), StatusCode::BAD_REQUEST);

        let err = MacrossError::Arithmetic {
            reason: "10000000000000000000 / 0.0000000001".into(),
        };
        let web = WebError::from(err);
        assert_eq!(web.status, StatusCode::BAD_REQUEST);
        assert!(web.message.is_empty());
    }

    #[test]
    fn store_failures_are_server_errors() {
        let err = MacrossError::Database {
            reason: "connection refused".into(),
        };
        assert_eq!(status_from_error(&err), StatusCode::INTERNAL_SERVER_ERROR);

        let err = MacrossError::EmptyDataset {
            symbol: "AAPL".into(),
        };
        assert_eq!(status_from_error(&err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
