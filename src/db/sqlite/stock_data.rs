//! Cached OHLCV history (append-only)

use crate::db::sqlite::models::StockDataRow;
use crate::error::Result;
use rusqlite::{params, Connection};
use serde::Serialize;

/// A bar ready for persistence (no id yet).
#[derive(Debug, Clone, Serialize)]
pub struct NewStockData {
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

/// Append history rows in one transaction. No deduplication against existing
/// (symbol, date) pairs; repeated refreshes append again.
pub fn insert_bars(conn: &mut Connection, bars: &[NewStockData]) -> Result<usize> {
    let tx = conn.transaction()?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO stock_data
             (symbol, date, open, high, low, close, volume, moving_avg_20, volatility)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;

        for bar in bars {
            stmt.execute(params![
                bar.symbol,
                bar.date,
                bar.open,
                bar.high,
                bar.low,
                bar.close,
                bar.volume,
                bar.moving_avg_20,
                bar.volatility,
            ])?;
        }
    }

    tx.commit()?;
    Ok(bars.len())
}

/// Load cached history for a symbol, oldest first.
pub fn get_bars(conn: &Connection, symbol: &str) -> Result<Vec<StockDataRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, symbol, date, open, high, low, close, volume, moving_avg_20, volatility
         FROM stock_data WHERE symbol = ?1 ORDER BY date",
    )?;

    let rows = stmt
        .query_map(params![symbol], |row| {
            Ok(StockDataRow {
                id: row.get(0)?,
                symbol: row.get(1)?,
                date: row.get(2)?,
                open: row.get(3)?,
                high: row.get(4)?,
                low: row.get(5)?,
                close: row.get(6)?,
                volume: row.get(7)?,
                moving_avg_20: row.get(8)?,
                volatility: row.get(9)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}
