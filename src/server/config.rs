//! Command-line and environment configuration for the server binary.
//!
//! Every flag falls back to an environment variable before its built-in
//! default, so precedence is flag > environment > default.

use std::net::SocketAddr;

use clap::Parser;

use crate::error::{Error, Result};
use crate::options::{Options, ReplicationFactorMap};

/// Connects to a (set of) Cassandra node(s) and starts an HTTP server
/// through which Kubernetes pod logs can be ingested and queried for
/// historical log entries. When no Cassandra nodes are given, 127.0.0.1
/// is assumed.
#[derive(Debug, Clone, Parser)]
#[command(name = "podlog", version, about)]
pub struct CliArgs {
    /// IP address to bind the HTTP server to
    #[arg(long = "bind-address", env = "IP", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Server port to listen on
    #[arg(long = "port", env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Keyspace to use; created when it does not exist
    #[arg(
        long = "cassandra-keyspace",
        env = "CASSANDRA_KEYSPACE",
        default_value = "insight_logs"
    )]
    pub cassandra_keyspace: String,

    /// Cassandra cluster CQL port
    #[arg(long = "cassandra-port", env = "CASSANDRA_PORT", default_value_t = 9042)]
    pub cassandra_port: u16,

    /// Replication strategy when the keyspace needs to be created; one
    /// of 'SimpleStrategy' and 'NetworkTopologyStrategy'
    #[arg(
        long = "cassandra-replication-strategy",
        env = "CASSANDRA_REPLICATION_STRATEGY",
        default_value = "SimpleStrategy"
    )]
    pub cassandra_replication_strategy: String,

    /// Replication factor(s) as a JSON map of datacenter to factor, for
    /// example '{"dc1": 3, "dc2": 3}'. With SimpleStrategy the map must
    /// hold a single entry keyed 'cluster'
    #[arg(
        long = "cassandra-replication-factors",
        env = "CASSANDRA_REPLICATION_FACTORS",
        default_value = r#"{"cluster":1}"#
    )]
    pub cassandra_replication_factors: String,

    /// Writer tasks used to process a received log entry batch; more
    /// than one can (to a certain limit) increase write throughput.
    /// Defaults to four per CPU core
    #[arg(
        long = "cassandra-write-concurrency",
        env = "CASSANDRA_WRITE_CONCURRENCY"
    )]
    pub cassandra_write_concurrency: Option<usize>,

    /// Maximum number of inserts queued up before additional writes block
    #[arg(
        long = "cassandra-write-buffer-size",
        env = "CASSANDRA_WRITE_BUFFER_SIZE",
        default_value_t = 1024
    )]
    pub cassandra_write_buffer_size: usize,

    /// Expose a CPU profiling endpoint at /debug/pprof/profile
    #[arg(
        long = "enable-profiling",
        env = "ENABLE_PROFILING",
        default_value_t = false
    )]
    pub enable_profiling: bool,

    /// Cassandra contact host(s)
    #[arg(value_name = "CASSANDRA_NODE")]
    pub hosts: Vec<String>,
}

impl CliArgs {
    /// Builds validated store options from the parsed arguments.
    pub fn to_store_options(&self) -> Result<Options> {
        let defaults = Options::default();
        let options = Options {
            hosts: if self.hosts.is_empty() {
                defaults.hosts
            } else {
                self.hosts.clone()
            },
            port: self.cassandra_port,
            keyspace: self.cassandra_keyspace.clone(),
            log_table: defaults.log_table,
            replication_strategy: self.cassandra_replication_strategy.parse()?,
            replication_factors: ReplicationFactorMap::from_json(
                &self.cassandra_replication_factors,
            )?,
            write_concurrency: self
                .cassandra_write_concurrency
                .unwrap_or(defaults.write_concurrency),
            write_buffer_size: self.cassandra_write_buffer_size,
        };
        options.validate()?;
        Ok(options)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Local IP address to bind the listen socket to.
    pub bind_address: String,
    /// Port to listen on.
    pub port: u16,
    /// Expose the CPU profiling endpoint.
    pub enable_profiling: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            enable_profiling: false,
        }
    }
}

impl From<&CliArgs> for ServerConfig {
    fn from(args: &CliArgs) -> Self {
        Self {
            bind_address: args.bind_address.clone(),
            port: args.port,
            enable_profiling: args.enable_profiling,
        }
    }
}

impl ServerConfig {
    pub(super) fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| Error::Options(format!("invalid bind address: {}", e)))
    }
}
