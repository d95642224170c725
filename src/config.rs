//! Runtime configuration
//!
//! All settings come from environment variables with sensible local-dev
//! defaults, so the binary runs without any setup.

use crate::error::{AppError, Result};
use std::env;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bind host for the HTTP server
    pub host: String,
    /// Bind port for the HTTP server
    pub port: u16,
    /// Path to the SQLite database file
    pub database_path: PathBuf,
    /// Hour of day (market timezone) at which the weekday refresh runs
    pub refresh_hour: u32,
    /// Symbols refreshed by the scheduler (bare tickers)
    pub refresh_symbols: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            database_path: PathBuf::from("data/finance.db"),
            // After B3 market close, matching the original deployment
            refresh_hour: 18,
            refresh_symbols: vec![
                "PETR4".to_string(),
                "VALE3".to_string(),
                "ITUB4".to_string(),
            ],
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment, falling back to defaults.
    ///
    /// Recognized variables: `FINANCE_API_HOST`, `FINANCE_API_PORT`,
    /// `FINANCE_API_DB`, `FINANCE_API_REFRESH_HOUR`,
    /// `FINANCE_API_SYMBOLS` (comma separated).
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(host) = env::var("FINANCE_API_HOST") {
            config.host = host;
        }
        if let Ok(port) = env::var("FINANCE_API_PORT") {
            config.port = port
                .parse()
                .map_err(|_| AppError::Config(format!("invalid port: {}", port)))?;
        }
        if let Ok(path) = env::var("FINANCE_API_DB") {
            config.database_path = PathBuf::from(path);
        }
        if let Ok(hour) = env::var("FINANCE_API_REFRESH_HOUR") {
            let hour: u32 = hour
                .parse()
                .map_err(|_| AppError::Config(format!("invalid refresh hour: {}", hour)))?;
            if hour > 23 {
                return Err(AppError::Config(format!(
                    "refresh hour out of range: {}",
                    hour
                )));
            }
            config.refresh_hour = hour;
        }
        if let Ok(symbols) = env::var("FINANCE_API_SYMBOLS") {
            let symbols: Vec<String> = symbols
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !symbols.is_empty() {
                config.refresh_symbols = symbols;
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.refresh_hour, 18);
        assert!(!config.refresh_symbols.is_empty());
    }
}
