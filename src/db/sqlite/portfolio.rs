//! Portfolio, asset and transaction persistence

use crate::db::sqlite::models::{
    CreateAssetRequest, CreatePortfolioRequest, CreateTransactionRequest, OperationType,
    Portfolio, PortfolioAsset, PortfolioDetail, Transaction,
};
use crate::error::{AppError, Result};
use rusqlite::{params, Connection};

/// Create a new portfolio, returning it with its generated id.
pub fn create_portfolio(conn: &Connection, req: &CreatePortfolioRequest) -> Result<Portfolio> {
    conn.execute(
        "INSERT INTO portfolios (name, description) VALUES (?1, ?2)",
        params![req.name, req.description],
    )?;

    let id = conn.last_insert_rowid();
    get_portfolio_by_id(conn, id)
}

/// Get all portfolios (no nested collections), newest first.
pub fn list_portfolios(conn: &Connection) -> Result<Vec<Portfolio>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, created_at FROM portfolios ORDER BY created_at DESC, id DESC",
    )?;

    let portfolios = stmt
        .query_map([], |row| {
            Ok(Portfolio {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(portfolios)
}

fn get_portfolio_by_id(conn: &Connection, id: i64) -> Result<Portfolio> {
    conn.query_row(
        "SELECT id, name, description, created_at FROM portfolios WHERE id = ?",
        [id],
        |row| {
            Ok(Portfolio {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                created_at: row.get(3)?,
            })
        },
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            AppError::NotFound(format!("Portfolio not found: {}", id))
        }
        _ => e.into(),
    })
}

/// Get a portfolio together with its assets and transactions.
pub fn get_portfolio_detail(conn: &Connection, id: i64) -> Result<PortfolioDetail> {
    let portfolio = get_portfolio_by_id(conn, id)?;
    let assets = get_assets(conn, id)?;
    let transactions = get_transactions(conn, id)?;

    Ok(PortfolioDetail {
        portfolio,
        assets,
        transactions,
    })
}

/// Delete a portfolio; assets and transactions go with it via FK cascade.
pub fn delete_portfolio(conn: &Connection, id: i64) -> Result<()> {
    let rows = conn.execute("DELETE FROM portfolios WHERE id = ?", [id])?;

    if rows == 0 {
        return Err(AppError::NotFound(format!("Portfolio not found: {}", id)));
    }

    Ok(())
}

/// Add an asset to a portfolio. Referential integrity is the FK's job: an
/// unknown portfolio_id surfaces as a database error, not a pre-check.
pub fn add_asset(conn: &Connection, req: &CreateAssetRequest) -> Result<PortfolioAsset> {
    conn.execute(
        "INSERT INTO portfolio_assets (portfolio_id, symbol, quantity, purchase_price, purchase_date, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            req.portfolio_id,
            req.symbol,
            req.quantity,
            req.purchase_price,
            req.purchase_date,
            req.notes,
        ],
    )?;

    let id = conn.last_insert_rowid();

    Ok(PortfolioAsset {
        id,
        portfolio_id: req.portfolio_id,
        symbol: req.symbol.clone(),
        quantity: req.quantity,
        purchase_price: req.purchase_price,
        purchase_date: req.purchase_date.clone(),
        notes: req.notes.clone(),
    })
}

/// Record a transaction in the portfolio's ledger.
pub fn record_transaction(
    conn: &Connection,
    req: &CreateTransactionRequest,
) -> Result<Transaction> {
    conn.execute(
        "INSERT INTO transactions (portfolio_id, symbol, operation_type, quantity, price, date, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            req.portfolio_id,
            req.symbol,
            req.operation_type.as_str(),
            req.quantity,
            req.price,
            req.date,
            req.notes,
        ],
    )?;

    let id = conn.last_insert_rowid();

    Ok(Transaction {
        id,
        portfolio_id: req.portfolio_id,
        symbol: req.symbol.clone(),
        operation_type: req.operation_type,
        quantity: req.quantity,
        price: req.price,
        date: req.date.clone(),
        notes: req.notes.clone(),
    })
}

fn get_assets(conn: &Connection, portfolio_id: i64) -> Result<Vec<PortfolioAsset>> {
    let mut stmt = conn.prepare(
        "SELECT id, portfolio_id, symbol, quantity, purchase_price, purchase_date, notes
         FROM portfolio_assets WHERE portfolio_id = ?1 ORDER BY id",
    )?;

    let assets = stmt
        .query_map(params![portfolio_id], |row| {
            Ok(PortfolioAsset {
                id: row.get(0)?,
                portfolio_id: row.get(1)?,
                symbol: row.get(2)?,
                quantity: row.get(3)?,
                purchase_price: row.get(4)?,
                purchase_date: row.get(5)?,
                notes: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(assets)
}

fn get_transactions(conn: &Connection, portfolio_id: i64) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, portfolio_id, symbol, operation_type, quantity, price, date, notes
         FROM transactions WHERE portfolio_id = ?1 ORDER BY id",
    )?;

    let transactions = stmt
        .query_map(params![portfolio_id], |row| {
            let op: String = row.get(3)?;
            Ok(Transaction {
                id: row.get(0)?,
                portfolio_id: row.get(1)?,
                symbol: row.get(2)?,
                operation_type: OperationType::parse(&op).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Text,
                        format!("invalid operation_type: {}", op).into(),
                    )
                })?,
                quantity: row.get(4)?,
                price: row.get(5)?,
                date: row.get(6)?,
                notes: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(transactions)
}

/// Count orphan asset/transaction rows (rows whose portfolio no longer
/// exists). Used to verify the cascade invariant.
pub fn count_orphans(conn: &Connection) -> Result<(i64, i64)> {
    let orphan_assets: i64 = conn.query_row(
        "SELECT COUNT(*) FROM portfolio_assets a
         WHERE NOT EXISTS (SELECT 1 FROM portfolios p WHERE p.id = a.portfolio_id)",
        [],
        |row| row.get(0),
    )?;
    let orphan_transactions: i64 = conn.query_row(
        "SELECT COUNT(*) FROM transactions t
         WHERE NOT EXISTS (SELECT 1 FROM portfolios p WHERE p.id = t.portfolio_id)",
        [],
        |row| row.get(0),
    )?;

    Ok((orphan_assets, orphan_transactions))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        super::super::migrations::run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn corrupt_operation_type_surfaces_as_error() {
        let conn = test_conn();

        let portfolio = create_portfolio(
            &conn,
            &CreatePortfolioRequest {
                name: "Main".to_string(),
                description: None,
            },
        )
        .unwrap();

        // Sidestep the CHECK constraint to simulate a row written by an
        // older or foreign schema version.
        conn.execute_batch("PRAGMA ignore_check_constraints = ON;")
            .unwrap();
        conn.execute(
            "INSERT INTO transactions (portfolio_id, symbol, operation_type, quantity, price, date)
             VALUES (?1, 'PETR4', 'TRANSFER', 10.0, 35.5, '2026-08-01')",
            params![portfolio.id],
        )
        .unwrap();

        let err = get_transactions(&conn, portfolio.id).unwrap_err();
        assert!(err.to_string().contains("invalid operation_type"));
    }

    #[test]
    fn valid_operation_types_load_back() {
        let conn = test_conn();

        let portfolio = create_portfolio(
            &conn,
            &CreatePortfolioRequest {
                name: "Main".to_string(),
                description: None,
            },
        )
        .unwrap();

        for op in [OperationType::Buy, OperationType::Sell] {
            record_transaction(
                &conn,
                &CreateTransactionRequest {
                    portfolio_id: portfolio.id,
                    symbol: "VALE3".to_string(),
                    operation_type: op,
                    quantity: 5.0,
                    price: 60.0,
                    date: "2026-08-01".to_string(),
                    notes: None,
                },
            )
            .unwrap();
        }

        let loaded = get_transactions(&conn, portfolio.id).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].operation_type, OperationType::Buy);
        assert_eq!(loaded[1].operation_type, OperationType::Sell);
    }
}
