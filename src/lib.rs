//! macross: moving-average crossover backtester.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], wiring in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
