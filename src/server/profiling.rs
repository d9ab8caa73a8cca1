//! CPU profiling endpoint, exposed only when profiling is enabled.

use std::time::Duration;

use axum::extract::Query as UrlQuery;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

const MAX_PROFILE_SECONDS: u64 = 60;

#[derive(Debug, Deserialize)]
pub(super) struct ProfileParams {
    /// Sampling duration; defaults to 5 seconds, capped at 60.
    seconds: Option<u64>,
}

/// Handle `GET /debug/pprof/profile`: sample the process CPU for the
/// requested duration and return a flamegraph SVG.
pub(super) async fn handle_profile(UrlQuery(params): UrlQuery<ProfileParams>) -> Response {
    let seconds = params.seconds.unwrap_or(5).min(MAX_PROFILE_SECONDS);
    tracing::info!(seconds, "starting CPU profile");

    // the profiler guard is tied to the thread that created it, so the
    // whole sampling window runs on one blocking thread
    let result = tokio::task::spawn_blocking(move || {
        let guard = pprof::ProfilerGuardBuilder::default()
            .frequency(99)
            .build()
            .map_err(|e| e.to_string())?;
        std::thread::sleep(Duration::from_secs(seconds));
        let report = guard.report().build().map_err(|e| e.to_string())?;
        let mut svg = Vec::new();
        report.flamegraph(&mut svg).map_err(|e| e.to_string())?;
        Ok::<_, String>(svg)
    })
    .await;

    match result {
        Ok(Ok(svg)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "image/svg+xml")],
            svg,
        )
            .into_response(),
        Ok(Err(e)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to profile: {}", e),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("profiling task failed: {}", e),
        )
            .into_response(),
    }
}
