//! HTTP server wiring: routes, middleware and the serve loop.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::signal;

use super::config::ServerConfig;
use super::handlers::{AppState, handle_health, handle_metrics, handle_query, handle_write};
use super::metrics::Metrics;
use super::middleware::MetricsLayer;
use super::profiling::handle_profile;
use crate::error::Result;
use crate::store::LogStore;

/// HTTP/REST API server for a [`LogStore`].
///
/// The store is expected to be connected before the server starts
/// serving requests.
pub struct LogServer {
    store: Arc<dyn LogStore>,
    config: ServerConfig,
}

impl LogServer {
    /// Creates a new server over a connected store.
    pub fn new(store: Arc<dyn LogStore>, config: ServerConfig) -> Self {
        Self { store, config }
    }

    /// Builds the router with all routes and the metrics middleware.
    pub fn router(&self) -> Router {
        let metrics = Arc::new(Metrics::new());
        let state = AppState {
            store: Arc::clone(&self.store),
            metrics: Arc::clone(&metrics),
        };

        let mut router = Router::new()
            .route("/write", get(handle_health).post(handle_write))
            .route("/query", get(handle_query))
            .route("/metrics", get(handle_metrics));

        if self.config.enable_profiling {
            tracing::info!("enabling profiling under /debug/pprof");
            router = router.route("/debug/pprof/profile", get(handle_profile));
        }

        router.layer(MetricsLayer::new(metrics)).with_state(state)
    }

    /// Runs the server until SIGINT/SIGTERM, then disconnects the store.
    pub async fn run(self) -> Result<()> {
        let addr = self.config.socket_addr()?;
        let app = self.router();

        tracing::info!("starting server on address {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        // stop the writer pool and close the driver before exiting
        self.store.disconnect().await?;
        tracing::info!("server shut down gracefully");
        Ok(())
    }
}

/// Listen for SIGTERM (pod termination) and SIGINT (Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("interrupted by SIGINT, starting graceful shutdown"),
        _ = terminate => tracing::info!("interrupted by SIGTERM, starting graceful shutdown"),
    }
}
