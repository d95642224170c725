//! Finance API
//!
//! A small financial-data backend: user-defined investment portfolios
//! (assets, transactions), proxied stock quote/history lookups, and a
//! weekday job that refreshes the cached quote history.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod market;
pub mod scheduler;
pub mod services;
pub mod state;
pub mod symbol;
