//! HTTP adapter.
//!
//! Serves the backtest over `GET /api/backtest/` as JSON.

mod error;
mod handlers;

pub use error::WebError;
pub use handlers::*;

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::ports::data_port::DataPort;

pub struct AppState {
    pub data_port: Arc<dyn DataPort + Send + Sync>,
    /// Instrument every backtest request reads.
    pub symbol: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/backtest/", get(handlers::backtest))
        .route("/api/backtest", get(handlers::backtest))
        .route("/health", get(handlers::health))
        .with_state(Arc::new(state))
}
