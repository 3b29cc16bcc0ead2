#![cfg(feature = "web")]
//! Web handler integration tests.
//!
//! Tests cover:
//! - Backtest endpoint returns profit and event lines as JSON
//! - Both `/api/backtest/` and `/api/backtest` are routed
//! - Any parameter failure is a 400 with an empty body
//! - Trades that leave the decimal range are a 400
//! - Store failures surface as 500
//! - Health check

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use macross::adapters::web::{build_router, AppState};
use std::sync::Arc;
use tower::ServiceExt;

use common::*;

fn create_test_app() -> Router {
    create_test_app_with_port(MockDataPort::new().with_bars("AAPL", crossover_bars("AAPL")))
}

fn create_test_app_with_port(port: MockDataPort) -> Router {
    let state = AppState {
        data_port: Arc::new(port),
        symbol: "AAPL".to_string(),
    };
    build_router(state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

mod backtest_tests {
    use super::*;

    #[tokio::test]
    async fn returns_profit_and_events() {
        let (status, body) = get(
            create_test_app(),
            "/api/backtest/?investing_amount=1000&sell_period=2&buy_period=2",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["profit"].to_string(), "330");
        assert_eq!(json["events"], serde_json::json!(CROSSOVER_EVENTS));
    }

    #[tokio::test]
    async fn route_without_trailing_slash() {
        let (status, _) = get(
            create_test_app(),
            "/api/backtest?investing_amount=1000&sell_period=2&buy_period=2",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn empty_store_is_zero_profit() {
        let (status, body) = get(
            create_test_app_with_port(MockDataPort::new()),
            "/api/backtest/?investing_amount=1000&sell_period=5&buy_period=10",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["profit"].to_string(), "0");
        assert_eq!(json["events"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn zero_amount_is_empty_run() {
        let (status, body) = get(
            create_test_app(),
            "/api/backtest/?investing_amount=0&sell_period=2&buy_period=2",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["events"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn large_profit_keeps_every_digit() {
        let bars = series(
            "AAPL",
            "2024-01-01",
            &[(dec!(2.99), dec!(3)), (dec!(3.01), dec!(3.01))],
        );
        let (status, body) = get(
            create_test_app_with_port(MockDataPort::new().with_bars("AAPL", bars)),
            "/api/backtest/?investing_amount=1000000000000000000&sell_period=2&buy_period=1",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let body = String::from_utf8(body).unwrap();
        assert!(body.contains(r#""profit":6688963210702341.12"#), "{body}");
        assert!(body.contains("Bought 334448160535117056 stocks on 2024-01-01 for 2.99"));
    }

    #[tokio::test]
    async fn store_failure_is_server_error() {
        let port = MockDataPort::new().with_error("AAPL", "disk on fire");
        let (status, _) = get(
            create_test_app_with_port(port),
            "/api/backtest/?investing_amount=1000&sell_period=2&buy_period=2",
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}

mod rejection_tests {
    use super::*;

    async fn assert_bad_request(query: &str) {
        let (status, body) = get(create_test_app(), &format!("/api/backtest/{query}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "query {query}");
        assert!(body.is_empty(), "query {query}");
    }

    #[tokio::test]
    async fn missing_parameters() {
        assert_bad_request("").await;
        assert_bad_request("?investing_amount=1000&sell_period=5").await;
        assert_bad_request("?investing_amount=&sell_period=5&buy_period=10").await;
    }

    #[tokio::test]
    async fn negative_amount() {
        assert_bad_request("?investing_amount=-1&sell_period=5&buy_period=10").await;
    }

    #[tokio::test]
    async fn zero_window() {
        assert_bad_request("?investing_amount=1000&sell_period=0&buy_period=10").await;
        assert_bad_request("?investing_amount=1000&sell_period=5&buy_period=0").await;
    }

    #[tokio::test]
    async fn non_integer_values() {
        assert_bad_request("?investing_amount=10.5&sell_period=5&buy_period=10").await;
        assert_bad_request("?investing_amount=1e3&sell_period=5&buy_period=10").await;
        assert_bad_request("?investing_amount=1000&sell_period=five&buy_period=10").await;
    }

    #[tokio::test]
    async fn share_count_beyond_decimal_range() {
        let bars = series(
            "AAPL",
            "2024-01-01",
            &[(dec!(0.0000000001), dec!(1.0001))],
        );
        let (status, body) = get(
            create_test_app_with_port(MockDataPort::new().with_bars("AAPL", bars)),
            "/api/backtest/?investing_amount=10000000000000000000&sell_period=1&buy_period=1",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn amount_overflow() {
        assert_bad_request(
            "?investing_amount=99999999999999999999999&sell_period=5&buy_period=10",
        )
        .await;
    }
}

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = get(create_test_app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (status, _) = get(create_test_app(), "/api/predict-data").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
