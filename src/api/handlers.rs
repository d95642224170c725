//! REST API endpoint handlers
//!
//! Thin glue: extract, call the service, map the result. Error-to-status
//! mapping lives on `AppError`'s `IntoResponse` impl.

use crate::api::types::{HistoryParams, Liveness, RealtimeQuote};
use crate::db::sqlite::models::{
    CreateAssetRequest, CreatePortfolioRequest, CreateTransactionRequest, Portfolio,
    PortfolioAsset, PortfolioDetail, Stock, Transaction,
};
use crate::error::{AppError, Result};
use crate::services::{PortfolioService, QuoteService, StockBar, StockPrice};
use crate::state::AppState;
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use std::sync::Arc;
use tracing::debug;

// ============================================================================
// Liveness
// ============================================================================

/// GET /
pub async fn root() -> Json<Liveness> {
    Json(Liveness {
        message: "Finance API is running",
    })
}

// ============================================================================
// Market data
// ============================================================================

/// GET /api/v1/stocks/:symbol?days=N
pub async fn get_stock_history(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<StockBar>>> {
    let days = params.days_or_default();
    debug!("get_stock_history - {} ({}d)", symbol, days);

    let bars = QuoteService::fetch_history(&state, &symbol, days).await?;
    Ok(Json(bars))
}

/// GET /api/v1/stocks/:symbol/realtime
pub async fn get_realtime_quote(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<RealtimeQuote>> {
    debug!("get_realtime_quote - {}", symbol);

    let bars = QuoteService::fetch_history(&state, &symbol, 1).await?;
    let latest = bars
        .last()
        .ok_or_else(|| AppError::NotFound(format!("No data found for symbol {}", symbol)))?;

    Ok(Json(RealtimeQuote {
        price: latest.close,
        volume: latest.volume,
    }))
}

/// GET /api/v1/stocks/:symbol/price
///
/// Any failure here, upstream included, surfaces as 404: the route answers
/// "is there a price for this symbol", and a symbol we cannot price has none.
pub async fn get_stock_price(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<StockPrice>> {
    debug!("get_stock_price - {}", symbol);
    let price = QuoteService::current_price(&state, &symbol)
        .await
        .map_err(|e| AppError::NotFound(format!("Price not found for {}: {}", symbol, e)))?;
    Ok(Json(price))
}

/// GET /api/v1/stocks/batch/:symbols (comma separated)
///
/// Best-effort partial results: failed symbols are logged by the service and
/// omitted from the response.
pub async fn get_batch_prices(
    State(state): State<Arc<AppState>>,
    Path(symbols): Path<String>,
) -> Json<Vec<StockPrice>> {
    let symbols: Vec<String> = symbols.split(',').map(|s| s.trim().to_string()).collect();
    debug!("get_batch_prices - {:?}", symbols);

    let prices = QuoteService::batch_prices(&state, &symbols)
        .await
        .into_iter()
        .filter_map(|b| b.result.ok())
        .collect();

    Json(prices)
}

/// GET /api/v1/stocks/suggest/:query
pub async fn suggest_stocks(
    State(state): State<Arc<AppState>>,
    Path(query): Path<String>,
) -> Result<Json<Vec<Stock>>> {
    debug!("suggest_stocks - {}", query);
    let stocks = QuoteService::suggest(&state, &query)?;
    Ok(Json(stocks))
}

// ============================================================================
// Portfolios
// ============================================================================

/// POST /api/v1/portfolios
pub async fn create_portfolio(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePortfolioRequest>,
) -> Result<Json<Portfolio>> {
    let portfolio = PortfolioService::create(&state, &req)?;
    Ok(Json(portfolio))
}

/// GET /api/v1/portfolios
pub async fn list_portfolios(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Portfolio>>> {
    let portfolios = PortfolioService::list(&state)?;
    Ok(Json(portfolios))
}

/// GET /api/v1/portfolios/:id
pub async fn get_portfolio(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<PortfolioDetail>> {
    let detail = PortfolioService::get(&state, id)?;
    Ok(Json(detail))
}

/// DELETE /api/v1/portfolios/:id
pub async fn delete_portfolio(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    PortfolioService::delete(&state, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/portfolios/assets
pub async fn add_asset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAssetRequest>,
) -> Result<Json<PortfolioAsset>> {
    let asset = PortfolioService::add_asset(&state, &req)?;
    Ok(Json(asset))
}

/// POST /api/v1/portfolios/transactions
pub async fn record_transaction(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<Json<Transaction>> {
    let transaction = PortfolioService::record_transaction(&state, &req)?;
    Ok(Json(transaction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::SqliteDb;
    use crate::market::testing::ScriptedMarket;
    use axum::response::IntoResponse;
    use tempfile::tempdir;

    fn state_with_market(market: ScriptedMarket) -> (tempfile::TempDir, Arc<AppState>) {
        let dir = tempdir().unwrap();
        let db = Arc::new(SqliteDb::new(&dir.path().join("test.db")).unwrap());
        (dir, Arc::new(AppState::with_market(db, Arc::new(market))))
    }

    #[tokio::test]
    async fn price_snapshot_answers_404_for_upstream_failures() {
        let (_dir, state) = state_with_market(ScriptedMarket::new().with_failure("PETR4.SA"));

        let err = get_stock_price(State(state), Path("PETR4".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn price_snapshot_answers_404_for_empty_series() {
        let (_dir, state) =
            state_with_market(ScriptedMarket::new().with_series("XXXX3.SA", Vec::new()));

        let err = get_stock_price(State(state), Path("XXXX3".to_string()))
            .await
            .unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn history_route_keeps_500_for_upstream_failures() {
        let (_dir, state) = state_with_market(ScriptedMarket::new().with_failure("PETR4.SA"));

        let err = get_stock_history(
            State(state),
            Path("PETR4".to_string()),
            Query(crate::api::types::HistoryParams { days: Some(30) }),
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
