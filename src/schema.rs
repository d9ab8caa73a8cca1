//! CQL statement builders for the log keyspace and table.
//!
//! The table partitions rows by (namespace, pod_name, container_name,
//! date) and clusters them by time. Including the UTC calendar date in
//! the partition key bounds each partition to one day of logs per
//! container, which keeps partitions tractable under high-throughput
//! pods and makes any single-day range scan a one-partition read.

use crate::options::{Options, ReplicationStrategy};

/// `CREATE KEYSPACE IF NOT EXISTS` statement for the configured keyspace.
pub(crate) fn keyspace_ddl(options: &Options) -> String {
    let replication = match options.replication_strategy {
        ReplicationStrategy::NetworkTopology => format!(
            "{{ 'class': 'NetworkTopologyStrategy', {} }}",
            options.replication_factors.as_cql()
        ),
        ReplicationStrategy::Simple => format!(
            "{{ 'class': 'SimpleStrategy', 'replication_factor': {} }}",
            options.replication_factors.get("cluster").unwrap_or(1)
        ),
    };
    format!(
        "CREATE KEYSPACE IF NOT EXISTS {} WITH REPLICATION = {}",
        options.keyspace, replication
    )
}

/// `CREATE TABLE IF NOT EXISTS` statement for the log table.
pub(crate) fn table_ddl(options: &Options) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {}.{} (\n\
         \tnamespace text,\n\
         \tpod_name text,\n\
         \tcontainer_name text,\n\
         \tdate date,\n\
         \ttime timestamp,\n\
         \tmessage text,\n\
         \tstream text,\n\
         \tpod_id text,\n\
         \tdocker_id text,\n\
         \thost text,\n\
         \tlabels map<text,text>,\n\
         \tPRIMARY KEY ((namespace, pod_name, container_name, date), time) )\n\
         WITH CLUSTERING ORDER BY (time DESC)",
        options.keyspace, options.log_table
    )
}

/// Insert statement binding, in order: namespace, pod_name,
/// container_name, date, time, message, stream, pod_id, docker_id, host,
/// labels.
pub(crate) fn insert_statement(options: &Options) -> String {
    format!(
        "INSERT INTO {}.{} \
         (namespace, pod_name, container_name, date, time, message, stream, \
         pod_id, docker_id, host, labels) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        options.keyspace, options.log_table
    )
}

/// Select statement binding, in order: namespace, pod_name,
/// container_name, date, time lower bound, time upper bound.
pub(crate) fn select_statement(options: &Options) -> String {
    format!(
        "SELECT time, message FROM {}.{} \
         WHERE (namespace = ?) AND (pod_name = ?) AND (container_name = ?) \
         AND (date = ?) AND (time >= ?) AND (time <= ?) \
         ORDER BY time ASC",
        options.keyspace, options.log_table
    )
}
