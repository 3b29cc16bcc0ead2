//! Configuration validation.
//!
//! Validates the INI sections before any store is opened.

use crate::domain::error::MacrossError;
use crate::domain::settings::{AlphaVantageSettings, DataSource, RefreshSettings, RefreshSource};
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), MacrossError> {
    validate_symbol(config)?;
    validate_source(config)?;
    validate_refresh(config)?;
    Ok(())
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), MacrossError> {
    match config.get_string("data", "symbol") {
        Some(_) => Ok(()),
        None => Err(MacrossError::ConfigMissing {
            section: "data".to_string(),
            key: "symbol".to_string(),
        }),
    }
}

fn validate_source(config: &dyn ConfigPort) -> Result<(), MacrossError> {
    let (section, key) = DataSource::from_config(config)?.required_key();
    match config.get_string(section, key) {
        Some(_) => Ok(()),
        None => Err(MacrossError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_refresh(config: &dyn ConfigPort) -> Result<(), MacrossError> {
    if let Some(RefreshSettings {
        source: RefreshSource::AlphaVantage,
        ..
    }) = RefreshSettings::from_config(config)?
    {
        AlphaVantageSettings::from_config(config)?;
    }
    Ok(())
}
