//! Port traits between the domain and its adapters.

pub mod bar_sink;
pub mod config_port;
pub mod data_port;
pub mod series_source;
