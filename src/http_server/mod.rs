//! # HTTP Server Module
//!
//! JSON API over the offline store and the task submitter.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/records` - Store stats; `/records/:record_type` to store and retrieve
//! - `/tasks/*` - Mint tasks, voice queries, gift proposals
//! - `/observability/*` - Metrics

mod errors;
mod observability_routes;
mod records_routes;
mod task_routes;

pub mod config;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ApiResult};
pub use server::{AppState, HttpServer};
