//! Market data gateway
//!
//! Abstracts the external quote provider behind a trait so services and the
//! scheduler never depend on a concrete vendor, and tests can script the
//! responses.

pub mod yahoo;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use yahoo::YahooClient;

/// One OHLCV bar as delivered by the provider, before any enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// External market data provider
///
/// Implementations are fallible and rate-limited outside our control; every
/// call is attempted exactly once, and an empty series is a valid response.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Fetch daily history for `symbol` (already carrying the exchange
    /// suffix) over the trailing `days` calendar days, oldest bar first.
    async fn fetch_history(&self, symbol: &str, days: u32) -> Result<Vec<ProviderBar>>;
}

#[cfg(test)]
pub mod testing {
    //! Scripted gateway for service and scheduler tests

    use super::*;
    use crate::error::AppError;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// In-memory gateway that replays canned series and records every
    /// requested symbol.
    #[derive(Default)]
    pub struct ScriptedMarket {
        series: HashMap<String, Vec<ProviderBar>>,
        failing: Vec<String>,
        pub requests: Mutex<Vec<String>>,
    }

    impl ScriptedMarket {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_series(mut self, symbol: &str, bars: Vec<ProviderBar>) -> Self {
            self.series.insert(symbol.to_string(), bars);
            self
        }

        pub fn with_failure(mut self, symbol: &str) -> Self {
            self.failing.push(symbol.to_string());
            self
        }
    }

    #[async_trait]
    impl MarketData for ScriptedMarket {
        async fn fetch_history(&self, symbol: &str, _days: u32) -> Result<Vec<ProviderBar>> {
            self.requests.lock().push(symbol.to_string());

            if self.failing.iter().any(|s| s == symbol) {
                return Err(AppError::Upstream(format!("scripted failure for {}", symbol)));
            }

            Ok(self.series.get(symbol).cloned().unwrap_or_default())
        }
    }

    /// Build a flat daily series of `n` bars with the given closes; opens are
    /// `close - 0.5`, timestamps one day apart.
    pub fn bars_from_closes(closes: &[f64]) -> Vec<ProviderBar> {
        let start = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| ProviderBar {
                timestamp: start + chrono::Duration::days(i as i64),
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000 + i as i64,
            })
            .collect()
    }
}
