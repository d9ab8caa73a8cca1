//! Error types for the log store and its HTTP surface.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid store configuration, reported at process start.
    #[error("invalid cassandra options: {0}")]
    Options(String),

    /// A log entry or query failed validation.
    #[error("{0}")]
    Validation(String),

    /// The driver could not connect to or talk to the cluster.
    #[error("{0}")]
    Driver(String),

    /// Keyspace or table creation failed during connect.
    #[error("schema creation failed: {phase}: {source}")]
    Schema {
        phase: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// At least one insert in a batch failed; wraps the first error observed.
    #[error("insert failed: {0}")]
    Insert(#[source] Box<Error>),

    /// A sub-query failed; the rest of the query is aborted.
    #[error("query failed: query execution: {0}")]
    Query(#[source] Box<Error>),

    /// An insert was submitted to a stopped writer pool.
    #[error("write rejected: writer pool has been stopped")]
    WriteRejected,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps a DDL failure with the schema phase that produced it.
    pub(crate) fn schema(phase: &'static str, source: Error) -> Error {
        Error::Schema {
            phase,
            source: Box::new(source),
        }
    }
}
