//! Application state management

use crate::config::AppConfig;
use crate::db::sqlite::SqliteDb;
use crate::error::Result;
use crate::market::{MarketData, YahooClient};
use std::sync::Arc;

/// Shared state for request handlers and the refresh scheduler
pub struct AppState {
    /// SQLite database
    pub db: Arc<SqliteDb>,

    /// Market data gateway
    pub market: Arc<dyn MarketData>,
}

impl AppState {
    /// Create state from configuration, wiring the real gateway.
    pub fn new(config: &AppConfig) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Arc::new(SqliteDb::new(&config.database_path)?);
        let market: Arc<dyn MarketData> = Arc::new(YahooClient::new()?);

        Ok(Self { db, market })
    }

    /// Create state with an explicit gateway (used by tests).
    pub fn with_market(db: Arc<SqliteDb>, market: Arc<dyn MarketData>) -> Self {
        Self { db, market }
    }
}
