//! SQLite row models and create requests

use serde::{Deserialize, Serialize};

/// Stock reference data (seeded, read by suggestion lookups)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stock {
    pub symbol: String,
    pub name: String,
    pub sector: Option<String>,
    pub subsector: Option<String>,
}

/// Cached OHLCV history row
///
/// Append-only: one row per (symbol, date) per refresh, never updated in
/// place. Repeated refreshes may write duplicate (symbol, date) pairs; there
/// is deliberately no uniqueness constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockDataRow {
    pub id: i64,
    pub symbol: String,
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub moving_avg_20: Option<f64>,
    pub volatility: Option<f64>,
}

/// Investment portfolio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

/// Create request for a portfolio
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePortfolioRequest {
    pub name: String,
    pub description: Option<String>,
}

/// Asset held in a portfolio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioAsset {
    pub id: i64,
    pub portfolio_id: i64,
    pub symbol: String,
    pub quantity: f64,
    pub purchase_price: f64,
    pub purchase_date: String,
    pub notes: Option<String>,
}

/// Create request for a portfolio asset
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAssetRequest {
    pub portfolio_id: i64,
    pub symbol: String,
    pub quantity: f64,
    pub purchase_price: f64,
    pub purchase_date: String,
    pub notes: Option<String>,
}

/// Buy/sell operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationType {
    Buy,
    Sell,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Buy => "BUY",
            OperationType::Sell => "SELL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BUY" => Some(OperationType::Buy),
            "SELL" => Some(OperationType::Sell),
            _ => None,
        }
    }
}

/// Ledger entry for a portfolio (append-only, no update/delete surface)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub portfolio_id: i64,
    pub symbol: String,
    pub operation_type: OperationType,
    pub quantity: f64,
    pub price: f64,
    pub date: String,
    pub notes: Option<String>,
}

/// Create request for a transaction
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransactionRequest {
    pub portfolio_id: i64,
    pub symbol: String,
    pub operation_type: OperationType,
    pub quantity: f64,
    pub price: f64,
    pub date: String,
    pub notes: Option<String>,
}

/// Portfolio with its nested collections (composite read)
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioDetail {
    #[serde(flatten)]
    pub portfolio: Portfolio,
    pub assets: Vec<PortfolioAsset>,
    pub transactions: Vec<Transaction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_type_round_trips_wire_format() {
        let json = serde_json::to_string(&OperationType::Buy).unwrap();
        assert_eq!(json, "\"BUY\"");
        let parsed: OperationType = serde_json::from_str("\"SELL\"").unwrap();
        assert_eq!(parsed, OperationType::Sell);
    }

    #[test]
    fn operation_type_rejects_unknown_values() {
        assert!(OperationType::parse("HOLD").is_none());
        assert!(serde_json::from_str::<OperationType>("\"HOLD\"").is_err());
    }
}
