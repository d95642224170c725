//! Portfolio Service
//!
//! CRUD over portfolios, assets and transactions. Thin by design: the store
//! owns referential integrity (FK cascade), the service owns logging and the
//! NotFound taxonomy.

use crate::db::sqlite::models::{
    CreateAssetRequest, CreatePortfolioRequest, CreateTransactionRequest, Portfolio,
    PortfolioAsset, PortfolioDetail, Transaction,
};
use crate::error::Result;
use crate::state::AppState;
use tracing::info;

/// Portfolio service for persistence business logic
pub struct PortfolioService;

impl PortfolioService {
    /// Create a new portfolio; the store assigns id and creation timestamp.
    pub fn create(state: &AppState, req: &CreatePortfolioRequest) -> Result<Portfolio> {
        info!("PortfolioService::create - {}", req.name);
        state.db.create_portfolio(req)
    }

    /// All portfolios, without nested collections.
    pub fn list(state: &AppState) -> Result<Vec<Portfolio>> {
        state.db.list_portfolios()
    }

    /// One portfolio with its assets and transactions eagerly loaded.
    pub fn get(state: &AppState, id: i64) -> Result<PortfolioDetail> {
        info!("PortfolioService::get - {}", id);
        state.db.get_portfolio(id)
    }

    /// Delete a portfolio; the FK cascade removes its assets and
    /// transactions.
    pub fn delete(state: &AppState, id: i64) -> Result<()> {
        info!("PortfolioService::delete - {}", id);
        state.db.delete_portfolio(id)
    }

    /// Add an asset to a portfolio.
    pub fn add_asset(state: &AppState, req: &CreateAssetRequest) -> Result<PortfolioAsset> {
        info!(
            "PortfolioService::add_asset - {} -> portfolio {}",
            req.symbol, req.portfolio_id
        );
        state.db.add_asset(req)
    }

    /// Append a transaction to a portfolio's ledger.
    pub fn record_transaction(
        state: &AppState,
        req: &CreateTransactionRequest,
    ) -> Result<Transaction> {
        info!(
            "PortfolioService::record_transaction - {} {} x{}",
            req.operation_type.as_str(),
            req.symbol,
            req.quantity
        );
        state.db.record_transaction(req)
    }
}
