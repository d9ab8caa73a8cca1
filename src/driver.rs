//! Simplified CQL driver seam between the store and the cluster.
//!
//! The [`Driver`] trait keeps the store, writer pool and tests
//! independent of the concrete driver crate; [`ScyllaDriver`] is the
//! production implementation. Implementations must tolerate concurrent
//! `execute` and `query` calls, since the writer pool runs several
//! workers against one driver.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::value::{CqlTimestamp, CqlValue, Row};
use tokio::sync::RwLock;

use crate::error::{Error, Result};

/// A value bound to a statement placeholder, or read back from a result
/// column.
#[derive(Debug, Clone, PartialEq)]
pub enum CqlArg {
    Text(String),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
    Map(HashMap<String, String>),
}

/// One result row as a column-name to value mapping.
pub type CqlRow = HashMap<String, CqlArg>;

/// The ordered rows of a query result.
pub type CqlRows = Vec<CqlRow>;

/// Narrow driver contract used by the store.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Establishes the primary session to the configured nodes.
    async fn connect(&self) -> Result<()>;

    /// Releases the primary session. Idempotent; the driver must not be
    /// used for statements afterwards.
    async fn close(&self) -> Result<()>;

    /// Probes cluster reachability by opening (and immediately dropping)
    /// a fresh session. Never touches the primary session, so a
    /// saturated session cannot block the probe.
    async fn reachable(&self) -> Result<()>;

    /// Runs a DDL/DML statement with no row results. Fails when
    /// [`Driver::connect`] has not succeeded.
    async fn execute(&self, statement: &str, args: &[CqlArg]) -> Result<()>;

    /// Runs a SELECT statement, returning its rows in result order.
    /// Fails when [`Driver::connect`] has not succeeded.
    async fn query(&self, statement: &str, args: &[CqlArg]) -> Result<CqlRows>;
}

/// Production driver backed by a scylla session.
pub struct ScyllaDriver {
    /// `host:port` contact points.
    nodes: Vec<String>,
    /// `None` until [`Driver::connect`] succeeds.
    session: RwLock<Option<Session>>,
}

impl ScyllaDriver {
    /// Creates a disconnected driver for the given contact hosts.
    pub fn new(hosts: &[String], port: u16) -> Self {
        Self {
            nodes: hosts.iter().map(|h| format!("{}:{}", h, port)).collect(),
            session: RwLock::new(None),
        }
    }

    async fn build_session(&self) -> Result<Session> {
        SessionBuilder::new()
            .known_nodes(&self.nodes)
            .build()
            .await
            .map_err(|e| Error::Driver(format!("unable to create cassandra session: {}", e)))
    }
}

#[async_trait]
impl Driver for ScyllaDriver {
    async fn connect(&self) -> Result<()> {
        let session = self.build_session().await?;
        *self.session.write().await = Some(session);
        tracing::debug!("connected");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        // dropping the session tears down its connections
        *self.session.write().await = None;
        Ok(())
    }

    async fn reachable(&self) -> Result<()> {
        self.build_session()
            .await
            .map(drop)
            .map_err(|e| Error::Driver(format!("failed to connect to cluster: {}", e)))
    }

    async fn execute(&self, statement: &str, args: &[CqlArg]) -> Result<()> {
        let session = self.session.read().await;
        let session = session.as_ref().ok_or_else(|| {
            Error::Driver("cannot execute statement: not connected to cassandra".to_string())
        })?;

        tracing::trace!(statement, ?args, "executing statement");
        session
            .query_unpaged(statement, to_cql_values(args))
            .await
            .map_err(|e| Error::Driver(format!("statement execution failed: {}", e)))?;
        Ok(())
    }

    async fn query(&self, statement: &str, args: &[CqlArg]) -> Result<CqlRows> {
        let session = self.session.read().await;
        let session = session.as_ref().ok_or_else(|| {
            Error::Driver("cannot execute query: not connected to cassandra".to_string())
        })?;

        tracing::trace!(statement, ?args, "executing query");
        let result = session
            .query_unpaged(statement, to_cql_values(args))
            .await
            .map_err(|e| Error::Driver(format!("query execution failed: {}", e)))?;

        let rows_result = result
            .into_rows_result()
            .map_err(|e| Error::Driver(format!("failed to get result rows: {}", e)))?;
        let names: Vec<String> = rows_result
            .column_specs()
            .iter()
            .map(|spec| spec.name().to_string())
            .collect();

        let mut rows = Vec::new();
        let typed_rows = rows_result
            .rows::<Row>()
            .map_err(|e| Error::Driver(format!("failed to get result rows: {}", e)))?;
        for row in typed_rows {
            let row = row.map_err(|e| Error::Driver(format!("failed to get result rows: {}", e)))?;
            let mut columns = HashMap::with_capacity(names.len());
            for (name, value) in names.iter().zip(row.columns) {
                if let Some(value) = value.and_then(from_cql_value) {
                    columns.insert(name.clone(), value);
                }
            }
            rows.push(columns);
        }
        Ok(rows)
    }
}

fn to_cql_values(args: &[CqlArg]) -> Vec<CqlValue> {
    args.iter()
        .map(|arg| match arg {
            CqlArg::Text(s) => CqlValue::Text(s.clone()),
            CqlArg::Timestamp(t) => CqlValue::Timestamp(CqlTimestamp(t.timestamp_millis())),
            CqlArg::Date(d) => CqlValue::Date((*d).into()),
            CqlArg::Map(m) => CqlValue::Map(
                m.iter()
                    .map(|(k, v)| (CqlValue::Text(k.clone()), CqlValue::Text(v.clone())))
                    .collect(),
            ),
        })
        .collect()
}

/// Converts a result column into a [`CqlArg`]; columns of types the log
/// schema does not read back map to `None` and are dropped from the row.
fn from_cql_value(value: CqlValue) -> Option<CqlArg> {
    match value {
        CqlValue::Text(s) | CqlValue::Ascii(s) => Some(CqlArg::Text(s)),
        CqlValue::Timestamp(ts) => DateTime::from_timestamp_millis(ts.0).map(CqlArg::Timestamp),
        CqlValue::Date(d) => TryInto::<NaiveDate>::try_into(d).ok().map(CqlArg::Date),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory driver double for store and pool tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use tokio::sync::Semaphore;

    use super::*;

    /// Records every executed statement and serves canned query results.
    ///
    /// With a `gate`, `execute` blocks until a permit is released, which
    /// lets tests hold workers busy deterministically.
    #[derive(Default)]
    pub(crate) struct RecordingDriver {
        pub executed: Mutex<Vec<(String, Vec<CqlArg>)>>,
        pub queried: Mutex<Vec<(String, Vec<CqlArg>)>>,
        /// One canned response per expected query call, served in order.
        pub query_results: Mutex<VecDeque<Result<CqlRows>>>,
        pub execute_error: Mutex<Option<String>>,
        pub reachable_error: Mutex<Option<String>>,
        pub gate: Option<Semaphore>,
    }

    impl RecordingDriver {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        /// A driver whose `execute` blocks until [`Self::release`] is
        /// called once per held call.
        pub(crate) fn gated() -> Self {
            Self {
                gate: Some(Semaphore::new(0)),
                ..Self::default()
            }
        }

        pub(crate) fn release(&self, permits: usize) {
            if let Some(gate) = &self.gate {
                gate.add_permits(permits);
            }
        }

        pub(crate) fn fail_executes_with(&self, message: &str) {
            *self.execute_error.lock().unwrap() = Some(message.to_string());
        }

        pub(crate) fn fail_reachable_with(&self, message: &str) {
            *self.reachable_error.lock().unwrap() = Some(message.to_string());
        }

        pub(crate) fn push_query_result(&self, result: Result<CqlRows>) {
            self.query_results.lock().unwrap().push_back(result);
        }

        pub(crate) fn executed_count(&self) -> usize {
            self.executed.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Driver for RecordingDriver {
        async fn connect(&self) -> Result<()> {
            Ok(())
        }

        async fn close(&self) -> Result<()> {
            Ok(())
        }

        async fn reachable(&self) -> Result<()> {
            match self.reachable_error.lock().unwrap().clone() {
                Some(message) => Err(Error::Driver(message)),
                None => Ok(()),
            }
        }

        async fn execute(&self, statement: &str, args: &[CqlArg]) -> Result<()> {
            if let Some(gate) = &self.gate {
                let permit = gate
                    .acquire()
                    .await
                    .map_err(|_| Error::Driver("gate closed".to_string()))?;
                permit.forget();
            }
            self.executed
                .lock()
                .unwrap()
                .push((statement.to_string(), args.to_vec()));
            match self.execute_error.lock().unwrap().clone() {
                Some(message) => Err(Error::Driver(message)),
                None => Ok(()),
            }
        }

        async fn query(&self, statement: &str, args: &[CqlArg]) -> Result<CqlRows> {
            self.queried
                .lock()
                .unwrap()
                .push((statement.to_string(), args.to_vec()));
            self.query_results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }
}
