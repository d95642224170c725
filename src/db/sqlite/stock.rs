//! Stock reference data: seed and suggestion lookups

use crate::db::sqlite::models::Stock;
use crate::error::Result;
use rusqlite::{params, Connection};

/// B3 reference list used to seed the `stocks` table.
const SEED_STOCKS: &[(&str, &str, &str)] = &[
    ("PETR4", "Petrobras PN", "Petróleo e Gás"),
    ("VALE3", "Vale ON", "Mineração"),
    ("ITUB4", "Itaú Unibanco PN", "Financeiro"),
    ("BBDC4", "Bradesco PN", "Financeiro"),
    ("ABEV3", "Ambev ON", "Bebidas"),
    ("B3SA3", "B3 ON", "Financeiro"),
    ("BBAS3", "Banco do Brasil ON", "Financeiro"),
    ("WEGE3", "WEG ON", "Bens Industriais"),
    ("RENT3", "Localiza ON", "Aluguel de Carros"),
    ("JBSS3", "JBS ON", "Alimentos"),
    ("SUZB3", "Suzano ON", "Papel e Celulose"),
    ("HAPV3", "Hapvida ON", "Saúde"),
    ("MGLU3", "Magazine Luiza ON", "Varejo"),
    ("BPAC11", "BTG Pactual UNT", "Financeiro"),
    ("RAIL3", "Rumo ON", "Transportes"),
    ("BEEF3", "Minerva ON", "Alimentos"),
    ("CASH3", "Méliuz ON", "Tecnologia"),
    ("TOTS3", "Totvs ON", "Tecnologia"),
    ("RADL3", "Raia Drogasil ON", "Varejo"),
    ("BBSE3", "BB Seguridade ON", "Seguros"),
];

/// Seed the stocks table, refreshing name/sector for symbols that exist.
pub fn seed_stocks(conn: &Connection) -> Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT INTO stocks (symbol, name, sector) VALUES (?1, ?2, ?3)
         ON CONFLICT(symbol) DO UPDATE SET name = excluded.name, sector = excluded.sector",
    )?;

    for (symbol, name, sector) in SEED_STOCKS {
        stmt.execute(params![symbol, name, sector])?;
    }

    tracing::info!("Seeded {} reference stocks", SEED_STOCKS.len());
    Ok(SEED_STOCKS.len())
}

/// Case-insensitive prefix search over stock symbols, capped at `limit`.
pub fn suggest_stocks(conn: &Connection, prefix: &str, limit: usize) -> Result<Vec<Stock>> {
    // LIKE is case-insensitive for ASCII in SQLite; escape wildcard chars so
    // the prefix is matched literally.
    let pattern = format!(
        "{}%",
        prefix.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
    );

    let mut stmt = conn.prepare(
        "SELECT symbol, name, sector, subsector FROM stocks
         WHERE symbol LIKE ?1 ESCAPE '\\'
         ORDER BY symbol
         LIMIT ?2",
    )?;

    let stocks = stmt
        .query_map(params![pattern, limit as i64], |row| {
            Ok(Stock {
                symbol: row.get(0)?,
                name: row.get(1)?,
                sector: row.get(2)?,
                subsector: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(stocks)
}
