//! Core domain types and logic.

pub mod price_bar;
pub mod moving_average;
pub mod position;
pub mod trade_event;
pub mod backtest;
pub mod request;
pub mod config_validation;
pub mod settings;
pub mod error;
