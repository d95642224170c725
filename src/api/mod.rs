//! HTTP API module
//!
//! JSON over REST under `/api/v1`, plus a root liveness message.

pub mod handlers;
pub mod server;
pub mod types;

pub use server::{router, run};
