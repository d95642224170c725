//! Services layer
//!
//! Business logic shared between the REST API handlers and the refresh
//! scheduler. Handlers stay thin; the scheduler reuses the same quote
//! operations the API exposes.
//!
//! - `QuoteService` - history, snapshots, batch prices, suggestions
//! - `PortfolioService` - portfolio/asset/transaction CRUD

pub mod portfolio_service;
pub mod quote_service;

pub use portfolio_service::PortfolioService;
pub use quote_service::{BatchPrice, QuoteService, StockBar, StockPrice};
