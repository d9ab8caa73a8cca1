//! The log store: lifecycle, batched writes and range queries over a
//! driver, the schema statements and the writer pool.

use std::sync::Arc;

use async_trait::async_trait;

use crate::driver::{CqlArg, Driver};
use crate::error::{Error, Result};
use crate::model::{LogEntry, LogRow, Query, QueryResult};
use crate::options::Options;
use crate::pool::WriterPool;
use crate::schema;
use crate::split;

/// Capability set the HTTP adapter depends on: a store that can ingest
/// Kubernetes pod log entries and answer historical range queries.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Connects to the backing data store and bootstraps its schema.
    async fn connect(&self) -> Result<()>;

    /// Gracefully disconnects from the backing data store.
    async fn disconnect(&self) -> Result<()>;

    /// Health probe: succeeds when the store can accept writes/queries,
    /// fails with the reason otherwise.
    async fn ready(&self) -> Result<()>;

    /// Writes a batch of log entries. See the module docs on error
    /// semantics: the first failed insert is reported, others may still
    /// have landed (at-least-once).
    async fn write(&self, entries: &[LogEntry]) -> Result<()>;

    /// Runs a query for historical log entries.
    async fn query(&self, query: &Query) -> Result<QueryResult>;
}

/// Cassandra-backed [`LogStore`].
///
/// Owns the writer pool and shares the driver with it. The pool starts
/// with the store, before [`LogStore::connect`] runs; inserts submitted
/// before a successful connect simply fail with the driver's
/// not-connected error.
pub struct CassandraStore {
    driver: Arc<dyn Driver>,
    options: Options,
    pool: WriterPool,
}

impl CassandraStore {
    /// Creates the store and starts its writer pool per
    /// [`Options::write_concurrency`] and [`Options::write_buffer_size`].
    pub fn new(driver: Arc<dyn Driver>, options: Options) -> Self {
        let pool = WriterPool::new(
            Arc::clone(&driver),
            options.write_concurrency,
            options.write_buffer_size,
        );
        Self {
            driver,
            options,
            pool,
        }
    }

    /// The 11 positional bind values of one insert: namespace, pod_name,
    /// container_name, date, time, message, stream, pod_id, docker_id,
    /// host, labels. The date column is the UTC calendar day of the
    /// entry's own timestamp.
    fn insert_args(entry: &LogEntry) -> Result<Vec<CqlArg>> {
        let time = entry.timestamp()?;
        let meta = &entry.kubernetes;
        Ok(vec![
            CqlArg::Text(meta.namespace.clone()),
            CqlArg::Text(meta.pod_name.clone()),
            CqlArg::Text(meta.container_name.clone()),
            CqlArg::Date(time.date_naive()),
            CqlArg::Timestamp(time),
            CqlArg::Text(entry.log.clone()),
            CqlArg::Text(entry.stream.clone()),
            CqlArg::Text(meta.pod_id.clone()),
            CqlArg::Text(meta.docker_id.clone()),
            CqlArg::Text(meta.host.clone()),
            CqlArg::Map(meta.labels.clone()),
        ])
    }

    /// Runs one day-bounded sub-query. The date bind comes from the
    /// sub-query start, which is safe because the splitter guarantees a
    /// sub-query never crosses a date border.
    async fn run_sub_query(&self, sub_query: &Query) -> Result<Vec<LogRow>> {
        let args = vec![
            CqlArg::Text(sub_query.namespace.clone()),
            CqlArg::Text(sub_query.pod_name.clone()),
            CqlArg::Text(sub_query.container_name.clone()),
            CqlArg::Date(sub_query.start_time.date_naive()),
            CqlArg::Timestamp(sub_query.start_time),
            CqlArg::Timestamp(sub_query.end_time),
        ];
        let rows = self
            .driver
            .query(&schema::select_statement(&self.options), &args)
            .await?;

        let mut log_rows = Vec::with_capacity(rows.len());
        for row in rows {
            let time = match row.get("time") {
                Some(CqlArg::Timestamp(t)) => *t,
                _ => {
                    return Err(Error::Driver(
                        "query returned a row without a time column".to_string(),
                    ));
                }
            };
            let log = match row.get("message") {
                Some(CqlArg::Text(s)) => s.clone(),
                _ => {
                    return Err(Error::Driver(
                        "query returned a row without a message column".to_string(),
                    ));
                }
            };
            log_rows.push(LogRow { time, log });
        }
        Ok(log_rows)
    }
}

#[async_trait]
impl LogStore for CassandraStore {
    async fn connect(&self) -> Result<()> {
        tracing::info!("connecting to cassandra ...");
        self.driver.connect().await?;

        self.driver
            .execute(&schema::keyspace_ddl(&self.options), &[])
            .await
            .map_err(|e| Error::schema("failed to create keyspace", e))?;
        self.driver
            .execute(&schema::table_ddl(&self.options), &[])
            .await
            .map_err(|e| Error::schema("failed to create log table", e))?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.pool.stop().await;
        tracing::info!("disconnecting from cassandra ...");
        self.driver.close().await
    }

    async fn ready(&self) -> Result<()> {
        self.driver.reachable().await
    }

    async fn write(&self, entries: &[LogEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        // fan the batch out over the writer pool, collecting one result
        // channel per entry in submission order
        let statement = schema::insert_statement(&self.options);
        let mut result_channels = Vec::with_capacity(entries.len());
        for entry in entries {
            let args = Self::insert_args(entry)?;
            result_channels.push(self.pool.submit(statement.clone(), args).await);
        }

        // await them all; report the first error but keep draining so no
        // worker is left blocked on an unread result slot
        let mut first_error = None;
        for result_rx in result_channels {
            let result = result_rx.await.unwrap_or(Err(Error::WriteRejected));
            if let Err(e) = result {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(Error::Insert(Box::new(e))),
            None => Ok(()),
        }
    }

    async fn query(&self, query: &Query) -> Result<QueryResult> {
        // break into sub-queries where the interval spans date border(s)
        let sub_queries = split::split(query);

        let mut log_rows = Vec::new();
        for (i, sub_query) in sub_queries.iter().enumerate() {
            tracing::trace!(
                "running subquery {} of {}: {}",
                i + 1,
                sub_queries.len(),
                sub_query
            );
            let rows = self
                .run_sub_query(sub_query)
                .await
                .map_err(|e| Error::Query(Box::new(e)))?;
            log_rows.extend(rows);
        }

        Ok(QueryResult { log_rows })
    }
}
