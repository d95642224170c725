//! HTTP server wiring
//!
//! Router assembly, CORS, request tracing and graceful shutdown.

use crate::api::handlers;
use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    // Allow-all CORS: the API serves a local frontend during development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        // Market data
        .route("/api/v1/stocks/:symbol", get(handlers::get_stock_history))
        .route(
            "/api/v1/stocks/:symbol/realtime",
            get(handlers::get_realtime_quote),
        )
        .route(
            "/api/v1/stocks/:symbol/price",
            get(handlers::get_stock_price),
        )
        .route(
            "/api/v1/stocks/batch/:symbols",
            get(handlers::get_batch_prices),
        )
        .route(
            "/api/v1/stocks/suggest/:query",
            get(handlers::suggest_stocks),
        )
        // Portfolios (trailing-slash aliases match the original API paths)
        .route(
            "/api/v1/portfolios",
            post(handlers::create_portfolio).get(handlers::list_portfolios),
        )
        .route(
            "/api/v1/portfolios/",
            post(handlers::create_portfolio).get(handlers::list_portfolios),
        )
        .route("/api/v1/portfolios/assets", post(handlers::add_asset))
        .route("/api/v1/portfolios/assets/", post(handlers::add_asset))
        .route(
            "/api/v1/portfolios/transactions",
            post(handlers::record_transaction),
        )
        .route(
            "/api/v1/portfolios/transactions/",
            post(handlers::record_transaction),
        )
        .route(
            "/api/v1/portfolios/:id",
            get(handlers::get_portfolio).delete(handlers::delete_portfolio),
        )
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until ctrl-c.
pub async fn run(config: &AppConfig, state: Arc<AppState>) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| AppError::Config(format!("invalid bind address: {}", e)))?;

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Finance API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
