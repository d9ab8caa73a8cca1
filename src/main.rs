//! Log server binary entry point.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use podlog::server::{CliArgs, LogServer, ServerConfig};
use podlog::{CassandraStore, LogStore, ScyllaDriver};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    let options = match args.to_store_options() {
        Ok(options) => options,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };
    let server_config = ServerConfig::from(&args);

    tracing::info!("using cassandra options: {:?}", options);
    let driver = Arc::new(ScyllaDriver::new(&options.hosts, options.port));
    let store: Arc<dyn LogStore> = Arc::new(CassandraStore::new(driver, options));
    if let Err(e) = store.connect().await {
        tracing::error!("failed to connect to cassandra: {}", e);
        std::process::exit(1);
    }

    tracing::info!(pid = std::process::id(), "serving");
    let server = LogServer::new(store, server_config);
    if let Err(e) = server.run().await {
        tracing::error!("server failed: {}", e);
        std::process::exit(1);
    }
}
