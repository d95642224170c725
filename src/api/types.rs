//! API request/response types

use serde::{Deserialize, Serialize};

/// Query string for the history endpoint
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    /// Trailing window in days (default 30)
    pub days: Option<u32>,
}

impl HistoryParams {
    pub fn days_or_default(&self) -> u32 {
        self.days.unwrap_or(30)
    }
}

/// Reduced realtime payload: latest close and volume only
#[derive(Debug, Serialize)]
pub struct RealtimeQuote {
    pub price: f64,
    pub volume: i64,
}

/// Root liveness body
#[derive(Debug, Serialize)]
pub struct Liveness {
    pub message: &'static str,
}
