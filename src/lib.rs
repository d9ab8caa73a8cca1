//! Kubernetes pod log ingestion and query service backed by Cassandra.
//!
//! The service accepts batches of container log records over HTTP (in
//! the JSON shape produced by the fluentbit Kubernetes metadata filter),
//! persists them into a wide-column store partitioned by (namespace,
//! pod, container, date), and answers time-range queries over them.
//!
//! # Architecture
//!
//! - [`Driver`] is the narrow seam to the CQL cluster; [`ScyllaDriver`]
//!   is the production implementation.
//! - [`CassandraStore`] orchestrates schema bootstrap, batched writes
//!   and range queries. Writes fan out over an internal bounded writer
//!   pool; queries whose interval crosses UTC date borders are split
//!   into one sub-query per touched day, matching the partition layout.
//! - [`server::LogServer`] exposes the store over HTTP together with a
//!   request-metrics surface.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use podlog::{CassandraStore, Options, ScyllaDriver};
//! use podlog::server::{LogServer, ServerConfig};
//!
//! let options = Options::default();
//! let driver = Arc::new(ScyllaDriver::new(&options.hosts, options.port));
//! let store = Arc::new(CassandraStore::new(driver, options));
//! store.connect().await?;
//!
//! LogServer::new(store, ServerConfig::default()).run().await?;
//! ```

mod driver;
mod error;
mod model;
mod options;
mod pool;
mod schema;
mod split;
mod store;

pub mod server;

pub use driver::{CqlArg, CqlRow, CqlRows, Driver, ScyllaDriver};
pub use error::{Error, Result};
pub use model::{KubernetesMetadata, LogEntry, LogRow, Query, QueryResult};
pub use options::{Options, ReplicationFactorMap, ReplicationStrategy};
pub use store::{CassandraStore, LogStore};
