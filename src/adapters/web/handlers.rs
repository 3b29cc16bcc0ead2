//! HTTP request handlers for the web adapter.

use axum::{
    Json,
    extract::{Query, State},
};
use log::debug;
use std::sync::Arc;

use crate::domain::backtest::{BacktestReport, backtest_from_store};
use crate::domain::request::validate;

use super::{AppState, WebError};

/// Raw query string; every field stays a string until validated.
#[derive(Debug, Default, serde::Deserialize)]
pub struct BacktestParams {
    pub investing_amount: Option<String>,
    pub sell_period: Option<String>,
    pub buy_period: Option<String>,
}

pub async fn backtest(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BacktestParams>,
) -> Result<Json<BacktestReport>, WebError> {
    let request = validate(
        params.investing_amount.as_deref(),
        params.sell_period.as_deref(),
        params.buy_period.as_deref(),
    )
    .map_err(|e| {
        debug!("rejected backtest request: {e}");
        WebError::bad_request()
    })?;

    let data_port = Arc::clone(&state.data_port);
    let symbol = state.symbol.clone();
    let outcome =
        tokio::task::spawn_blocking(move || backtest_from_store(&*data_port, &symbol, &request))
            .await
            .map_err(|e| WebError::internal(e.to_string()))??;

    Ok(Json(BacktestReport::from(&outcome)))
}

pub async fn health() -> &'static str {
    "ok"
}
