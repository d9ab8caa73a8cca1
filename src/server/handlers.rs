//! HTTP route handlers for the log server.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query as UrlQuery, State};
use axum::http::StatusCode;
use axum::response::Response;

use super::metrics::Metrics;
use super::request::query_from_params;
use super::response::{ApiError, ApiStatus, pretty_json};
use crate::model::LogEntry;
use crate::store::LogStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LogStore>,
    pub metrics: Arc<Metrics>,
}

/// Handle `GET /write`: a health probe against the backing store.
pub async fn handle_health(State(state): State<AppState>) -> ApiStatus {
    match state.store.ready().await {
        Ok(()) => ApiStatus::healthy(),
        Err(e) => ApiStatus::unhealthy(e.to_string()),
    }
}

/// Handle `POST /write`: ingest a batch of log entries.
///
/// Entries are validated before the readiness probe runs, so a malformed
/// batch is rejected even while the store is down.
pub async fn handle_write(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let entries: Vec<LogEntry> = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request("failed to parse request", e.to_string()))?;

    for entry in &entries {
        entry
            .validate()
            .map_err(|e| ApiError::bad_request("invalid log entry", e.to_string()))?;
    }

    tracing::debug!(count = entries.len(), "received log entries");

    state
        .store
        .ready()
        .await
        .map_err(|e| ApiError::service_unavailable("data store is not ready", e.to_string()))?;

    state.store.write(&entries).await.map_err(|e| {
        tracing::error!("failed to store log entries: {}", e);
        ApiError::internal("failed to store entries", e.to_string())
    })?;
    Ok(StatusCode::OK)
}

/// Handle `GET /query`: run a historical log query.
pub async fn handle_query(
    State(state): State<AppState>,
    UrlQuery(params): UrlQuery<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let query = query_from_params(&params)
        .map_err(|e| ApiError::bad_request("invalid query", e.to_string()))?;
    query
        .validate()
        .map_err(|e| ApiError::bad_request("invalid query", e.to_string()))?;

    state
        .store
        .ready()
        .await
        .map_err(|e| ApiError::service_unavailable("data store is not ready", e.to_string()))?;

    tracing::debug!(%query, "received query");
    let result = state
        .store
        .query(&query)
        .await
        .map_err(|e| ApiError::internal("query execution error", e.to_string()))?;

    pretty_json(&result)
}

/// Handle `GET /metrics`: snapshot of the request metrics collected so
/// far. Empty until the first request has completed, since observation
/// happens after the handler runs.
pub async fn handle_metrics(State(state): State<AppState>) -> String {
    state.metrics.render()
}
