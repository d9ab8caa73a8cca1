//! HTTP/REST API server exposing a [`LogStore`](crate::LogStore).
//!
//! Routes:
//!
//! - `GET /write` — health probe against the store
//! - `POST /write` — ingest a batch of log entries
//! - `GET /query` — query historical log entries
//! - `GET /metrics` — request-metrics snapshot in Prometheus text form
//! - `GET /debug/pprof/profile` — CPU profile (only when enabled)

mod config;
pub mod handlers;
mod http;
pub mod metrics;
mod middleware;
mod profiling;
mod request;
mod response;

pub use config::{CliArgs, ServerConfig};
pub use http::LogServer;
pub use response::{ApiError, ApiStatus};
