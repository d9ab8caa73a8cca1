//! JSON response envelopes for the REST API.

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Error envelope returned by every failing route.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    /// Human-readable message intended for presentation.
    pub message: &'static str,
    /// Error details, typically the underlying error rendering.
    pub detail: String,
}

impl ApiError {
    pub fn bad_request(message: &'static str, detail: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
            detail,
        }
    }

    pub fn service_unavailable(message: &'static str, detail: String) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message,
            detail,
        }
    }

    pub fn internal(message: &'static str, detail: String) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
            detail,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

/// Health envelope for `GET /write`.
#[derive(Debug, Serialize)]
pub struct ApiStatus {
    pub healthy: bool,
    /// The failure reason when unhealthy, otherwise empty.
    pub detail: String,
}

impl ApiStatus {
    pub fn healthy() -> Self {
        Self {
            healthy: true,
            detail: String::new(),
        }
    }

    pub fn unhealthy(detail: String) -> Self {
        Self {
            healthy: false,
            detail,
        }
    }

    pub(super) fn status_code(&self) -> StatusCode {
        if self.healthy {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

impl IntoResponse for ApiStatus {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self)).into_response()
    }
}

/// Pretty-printed JSON response body, for human-friendly query results.
pub(super) fn pretty_json<T: Serialize>(value: &T) -> Result<Response, ApiError> {
    let body = serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::internal("failed to serialize response", e.to_string()))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_error_envelope_without_status_field() {
        // given
        let error = ApiError::bad_request("invalid query", "missing query parameter: namespace".to_string());

        // when
        let json = serde_json::to_string(&error).unwrap();

        // then
        assert_eq!(
            json,
            r#"{"message":"invalid query","detail":"missing query parameter: namespace"}"#
        );
    }

    #[test]
    fn should_serialize_healthy_status_with_empty_detail() {
        // given/when
        let json = serde_json::to_string(&ApiStatus::healthy()).unwrap();

        // then
        assert_eq!(json, r#"{"healthy":true,"detail":""}"#);
    }

    #[test]
    fn should_serialize_unhealthy_status_with_reason() {
        // given/when
        let json =
            serde_json::to_string(&ApiStatus::unhealthy("connection refused".to_string())).unwrap();

        // then
        assert_eq!(json, r#"{"healthy":false,"detail":"connection refused"}"#);
    }

    #[test]
    fn should_map_health_to_status_codes() {
        assert_eq!(ApiStatus::healthy().status_code(), StatusCode::OK);
        assert_eq!(
            ApiStatus::unhealthy("down".to_string()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
