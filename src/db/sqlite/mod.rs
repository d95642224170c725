//! SQLite database module

pub mod models;
mod migrations;
mod portfolio;
mod stock;
mod stock_data;

use crate::error::Result;
use models::{
    CreateAssetRequest, CreatePortfolioRequest, CreateTransactionRequest, Portfolio,
    PortfolioAsset, PortfolioDetail, Stock, StockDataRow, Transaction,
};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;

pub use stock_data::NewStockData;

/// SQLite database wrapper
///
/// A single connection behind a mutex; the scheduler and request handlers
/// share it, and SQLite's transactional isolation serializes their writes.
pub struct SqliteDb {
    conn: Mutex<Connection>,
}

impl SqliteDb {
    /// Open (or create) the database and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL for concurrent readers; foreign_keys for the cascade deletes
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;

        let db = Self {
            conn: Mutex::new(conn),
        };

        db.run_migrations()?;

        Ok(db)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock();
        migrations::run_migrations(&conn)
    }

    // ========== Stock Reference Methods ==========

    /// Seed the stocks reference table (idempotent upsert).
    pub fn seed_stocks(&self) -> Result<usize> {
        let conn = self.conn.lock();
        stock::seed_stocks(&conn)
    }

    /// Prefix search over stock symbols.
    pub fn suggest_stocks(&self, prefix: &str, limit: usize) -> Result<Vec<Stock>> {
        let conn = self.conn.lock();
        stock::suggest_stocks(&conn, prefix, limit)
    }

    // ========== History Cache Methods ==========

    /// Append history rows (no dedup against existing rows).
    pub fn insert_stock_data(&self, bars: &[NewStockData]) -> Result<usize> {
        let mut conn = self.conn.lock();
        stock_data::insert_bars(&mut conn, bars)
    }

    /// Load cached history for a symbol, oldest first.
    pub fn get_stock_data(&self, symbol: &str) -> Result<Vec<StockDataRow>> {
        let conn = self.conn.lock();
        stock_data::get_bars(&conn, symbol)
    }

    // ========== Portfolio Methods ==========

    /// Create a portfolio.
    pub fn create_portfolio(&self, req: &CreatePortfolioRequest) -> Result<Portfolio> {
        let conn = self.conn.lock();
        portfolio::create_portfolio(&conn, req)
    }

    /// List all portfolios (no nested collections).
    pub fn list_portfolios(&self) -> Result<Vec<Portfolio>> {
        let conn = self.conn.lock();
        portfolio::list_portfolios(&conn)
    }

    /// Get a portfolio with its assets and transactions.
    pub fn get_portfolio(&self, id: i64) -> Result<PortfolioDetail> {
        let conn = self.conn.lock();
        portfolio::get_portfolio_detail(&conn, id)
    }

    /// Delete a portfolio and, via cascade, its assets and transactions.
    pub fn delete_portfolio(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock();
        portfolio::delete_portfolio(&conn, id)
    }

    /// Add an asset to a portfolio.
    pub fn add_asset(&self, req: &CreateAssetRequest) -> Result<PortfolioAsset> {
        let conn = self.conn.lock();
        portfolio::add_asset(&conn, req)
    }

    /// Record a transaction.
    pub fn record_transaction(&self, req: &CreateTransactionRequest) -> Result<Transaction> {
        let conn = self.conn.lock();
        portfolio::record_transaction(&conn, req)
    }

    /// Count asset/transaction rows whose portfolio no longer exists.
    pub fn count_orphans(&self) -> Result<(i64, i64)> {
        let conn = self.conn.lock();
        portfolio::count_orphans(&conn)
    }
}
