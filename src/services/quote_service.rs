//! Quote Service
//!
//! Normalizes symbols, pulls history from the market data gateway, derives
//! the 20-period moving average and annualized volatility, and shapes rows
//! for responses and for the history cache.

use crate::db::sqlite::models::Stock;
use crate::db::sqlite::NewStockData;
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::symbol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Trading periods per year used to annualize volatility.
const TRADING_PERIODS_PER_YEAR: f64 = 252.0;

/// Window for the moving average and the volatility returns.
const INDICATOR_WINDOW: usize = 20;

/// Queries shorter than this never reach the store.
const MIN_SUGGEST_LEN: usize = 3;

/// Cap on suggestion results.
const SUGGEST_LIMIT: usize = 10;

/// One enriched history bar (API-facing; bare ticker symbol)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockBar {
    pub symbol: String,
    pub date: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub moving_avg_20: Option<f64>,
    pub volatility: Option<f64>,
}

/// Current price snapshot
///
/// `updated_at` is the wall-clock time of the fetch, not the data's own
/// timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockPrice {
    pub symbol: String,
    pub price: f64,
    pub change_percent: f64,
    pub updated_at: DateTime<Utc>,
    pub volume: Option<i64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
}

/// Per-symbol outcome of a batch price request
#[derive(Debug)]
pub struct BatchPrice {
    pub symbol: String,
    pub result: Result<StockPrice>,
}

/// Quote service for market data business logic
pub struct QuoteService;

impl QuoteService {
    /// Fetch daily history for a symbol and compute derived indicators.
    ///
    /// Fails with `NotFound` when the gateway returns an empty series. Rows
    /// come back sorted by ascending timestamp with the exchange suffix
    /// stripped from the symbol field.
    pub async fn fetch_history(state: &AppState, symbol: &str, days: u32) -> Result<Vec<StockBar>> {
        let upstream_symbol = symbol::normalize(symbol);
        info!("QuoteService::fetch_history - {} ({}d)", upstream_symbol, days);

        let mut bars = state.market.fetch_history(&upstream_symbol, days).await?;
        if bars.is_empty() {
            return Err(AppError::NotFound(format!(
                "No data found for symbol {}",
                symbol
            )));
        }

        bars.sort_by_key(|b| b.timestamp);

        let bare_symbol = symbol::denormalize(&upstream_symbol);
        let moving_avgs = moving_average(&bars, INDICATOR_WINDOW);
        let volatilities = rolling_volatility(&bars, INDICATOR_WINDOW);

        Ok(bars
            .into_iter()
            .zip(moving_avgs)
            .zip(volatilities)
            .map(|((bar, moving_avg_20), volatility)| StockBar {
                symbol: bare_symbol.clone(),
                date: bar.timestamp,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
                moving_avg_20,
                volatility,
            })
            .collect())
    }

    /// Current price snapshot from the most recent one-day bar.
    pub async fn current_price(state: &AppState, symbol: &str) -> Result<StockPrice> {
        let upstream_symbol = symbol::normalize(symbol);
        info!("QuoteService::current_price - {}", upstream_symbol);

        let mut bars = state.market.fetch_history(&upstream_symbol, 1).await?;
        if bars.is_empty() {
            return Err(AppError::NotFound(format!(
                "No data found for symbol {}",
                symbol
            )));
        }

        bars.sort_by_key(|b| b.timestamp);

        let period_open = bars[0].open;
        let last = &bars[bars.len() - 1];

        Ok(StockPrice {
            symbol: symbol::denormalize(&upstream_symbol),
            price: last.close,
            change_percent: (last.close - period_open) / period_open * 100.0,
            updated_at: Utc::now(),
            volume: Some(last.volume),
            high: Some(last.high),
            low: Some(last.low),
        })
    }

    /// Current prices for many symbols; each symbol carries its own result
    /// so callers can tell "no data" apart from a hidden error. Never fails
    /// as a whole.
    pub async fn batch_prices(state: &AppState, symbols: &[String]) -> Vec<BatchPrice> {
        let mut results = Vec::with_capacity(symbols.len());

        for sym in symbols {
            let sym = sym.trim();
            if sym.is_empty() {
                continue;
            }

            let result = Self::current_price(state, sym).await;
            if let Err(e) = &result {
                warn!("Batch price failed for {}: {}", sym, e);
            }
            results.push(BatchPrice {
                symbol: symbol::denormalize(sym),
                result,
            });
        }

        results
    }

    /// Ticker suggestions by case-insensitive prefix. Queries shorter than
    /// three characters return empty without touching the store.
    pub fn suggest(state: &AppState, query: &str) -> Result<Vec<Stock>> {
        if query.chars().count() < MIN_SUGGEST_LEN {
            return Ok(Vec::new());
        }

        state.db.suggest_stocks(query, SUGGEST_LIMIT)
    }

    /// Persist enriched bars into the history cache (plain append).
    pub fn save_history(state: &AppState, bars: &[StockBar]) -> Result<usize> {
        let rows: Vec<NewStockData> = bars
            .iter()
            .map(|bar| NewStockData {
                symbol: bar.symbol.clone(),
                date: bar.date.to_rfc3339(),
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
                moving_avg_20: bar.moving_avg_20,
                volatility: bar.volatility,
            })
            .collect();

        let count = state.db.insert_stock_data(&rows)?;
        info!("Saved {} history rows", count);
        Ok(count)
    }
}

/// Trailing mean of `close` over `window` bars; None until a full window.
fn moving_average(bars: &[crate::market::ProviderBar], window: usize) -> Vec<Option<f64>> {
    bars.iter()
        .enumerate()
        .map(|(i, _)| {
            if i + 1 < window {
                None
            } else {
                let slice = &bars[i + 1 - window..=i];
                Some(slice.iter().map(|b| b.close).sum::<f64>() / window as f64)
            }
        })
        .collect()
}

/// Annualized rolling volatility: sample standard deviation of the trailing
/// `window` period-over-period returns, scaled by sqrt(252). None until
/// `window` returns exist (the first return needs two bars).
fn rolling_volatility(bars: &[crate::market::ProviderBar], window: usize) -> Vec<Option<f64>> {
    let returns: Vec<f64> = bars
        .windows(2)
        .map(|pair| pair[1].close / pair[0].close - 1.0)
        .collect();

    let mut result = vec![None; bars.len()];
    for (i, slot) in result.iter_mut().enumerate() {
        // returns[j] is the return realized at bar j + 1
        if i >= window {
            let slice = &returns[i - window..i];
            *slot = Some(sample_std_dev(slice) * TRADING_PERIODS_PER_YEAR.sqrt());
        }
    }
    result
}

fn sample_std_dev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::SqliteDb;
    use crate::market::testing::{bars_from_closes, ScriptedMarket};
    use crate::market::ProviderBar;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn state_with_market(market: ScriptedMarket) -> (tempfile::TempDir, AppState) {
        let dir = tempdir().unwrap();
        let db = Arc::new(SqliteDb::new(&dir.path().join("test.db")).unwrap());
        (dir, AppState::with_market(db, Arc::new(market)))
    }

    #[tokio::test]
    async fn history_is_ordered_with_indicator_null_windows() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let market = ScriptedMarket::new().with_series("PETR4.SA", bars_from_closes(&closes));
        let (_dir, state) = state_with_market(market);

        let bars = QuoteService::fetch_history(&state, "PETR4", 40).await.unwrap();
        assert_eq!(bars.len(), 40);
        assert!(bars.windows(2).all(|w| w[0].date < w[1].date));
        assert!(bars.iter().all(|b| b.symbol == "PETR4"));

        // moving average: None through row 18, Some from row 19
        assert!(bars[18].moving_avg_20.is_none());
        let ma = bars[19].moving_avg_20.unwrap();
        let expected: f64 = (0..20).map(|i| 100.0 + i as f64).sum::<f64>() / 20.0;
        assert!((ma - expected).abs() < 1e-9);

        // volatility: needs 20 returns, so None through row 19, Some from row 20
        assert!(bars[19].volatility.is_none());
        assert!(bars[20].volatility.unwrap() > 0.0);
    }

    #[tokio::test]
    async fn empty_series_is_not_found() {
        let market = ScriptedMarket::new().with_series("XXXX3.SA", Vec::new());
        let (_dir, state) = state_with_market(market);

        let err = QuoteService::fetch_history(&state, "XXXX3", 30).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn suffixed_and_bare_symbols_hit_the_same_upstream() {
        let closes = [100.0];
        let market = Arc::new(
            ScriptedMarket::new().with_series("PETR4.SA", bars_from_closes(&closes)),
        );
        let dir = tempdir().unwrap();
        let db = Arc::new(SqliteDb::new(&dir.path().join("test.db")).unwrap());
        let state = AppState::with_market(db, market.clone());

        let bare = QuoteService::current_price(&state, "PETR4").await.unwrap();
        let suffixed = QuoteService::current_price(&state, "PETR4.SA").await.unwrap();

        assert_eq!(bare.symbol, "PETR4");
        assert_eq!(suffixed.symbol, "PETR4");
        assert_eq!(
            *market.requests.lock(),
            vec!["PETR4.SA".to_string(), "PETR4.SA".to_string()]
        );
    }

    #[tokio::test]
    async fn change_percent_matches_open_to_close_move() {
        let bar = ProviderBar {
            timestamp: chrono::DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
            open: 100.0,
            high: 111.0,
            low: 99.0,
            close: 110.0,
            volume: 500,
        };
        let market = ScriptedMarket::new().with_series("PETR4.SA", vec![bar]);
        let (_dir, state) = state_with_market(market);

        let price = QuoteService::current_price(&state, "PETR4").await.unwrap();
        assert_eq!(price.change_percent, 10.0);
        assert_eq!(price.price, 110.0);
        assert_eq!(price.volume, Some(500));
    }

    #[tokio::test]
    async fn batch_swallows_per_symbol_failures() {
        let market = ScriptedMarket::new()
            .with_failure("AAA.SA")
            .with_series("BBB.SA", bars_from_closes(&[50.0]));
        let (_dir, state) = state_with_market(market);

        let symbols = vec!["AAA".to_string(), "BBB".to_string()];
        let results = QuoteService::batch_prices(&state, &symbols).await;

        assert_eq!(results.len(), 2);
        assert!(results[0].result.is_err());
        assert!(results[1].result.is_ok());

        let ok: Vec<_> = results.iter().filter(|r| r.result.is_ok()).collect();
        assert_eq!(ok.len(), 1);
        assert_eq!(ok[0].symbol, "BBB");
    }

    #[tokio::test]
    async fn short_suggest_query_skips_the_store() {
        let (_dir, state) = state_with_market(ScriptedMarket::new());
        // store is intentionally unseeded: a short query must not query it
        assert!(QuoteService::suggest(&state, "PE").unwrap().is_empty());
        // two characters even when multibyte (the gate counts chars, not bytes)
        assert!(QuoteService::suggest(&state, "éé").unwrap().is_empty());

        state.db.seed_stocks().unwrap();
        let suggestions = QuoteService::suggest(&state, "PET").unwrap();
        assert!(!suggestions.is_empty());
        assert!(suggestions.len() <= 10);
        assert!(suggestions
            .iter()
            .all(|s| s.symbol.to_uppercase().starts_with("PET")));
    }

    #[tokio::test]
    async fn save_history_appends_rows() {
        let closes: Vec<f64> = (0..5).map(|i| 10.0 + i as f64).collect();
        let market = ScriptedMarket::new().with_series("VALE3.SA", bars_from_closes(&closes));
        let (_dir, state) = state_with_market(market);

        let bars = QuoteService::fetch_history(&state, "VALE3", 5).await.unwrap();
        let saved = QuoteService::save_history(&state, &bars).unwrap();
        assert_eq!(saved, 5);

        let rows = state.db.get_stock_data("VALE3").unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].symbol, "VALE3");
    }

    #[test]
    fn sample_std_dev_matches_known_value() {
        // values 2,4,4,4,5,5,7,9: sample variance 32/7
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let expected = (32.0_f64 / 7.0).sqrt();
        assert!((sample_std_dev(&values) - expected).abs() < 1e-12);
    }
}
