//! Core data types: ingested log entries, queries and query results.
//!
//! The JSON shape of [`LogEntry`] follows the fluentbit Kubernetes metadata
//! filter, so a fluentbit HTTP output can point straight at the ingest
//! endpoint:
//!
//! ```json
//! {
//!   "date": 1525349097.094408,
//!   "kubernetes": {
//!     "docker_id": "e8b89cc4e292827b2f521c...",
//!     "labels": { "name": "weave-net" },
//!     "host": "master1",
//!     "pod_name": "weave-net-5mfwh",
//!     "container_name": "weave",
//!     "pod_id": "f5225d5f-4e9d-11e8-8b6b-02425d6e035a",
//!     "namespace_name": "kube-system"
//!   },
//!   "log": "INFO: 2018/05/03 12:04:57.094154 Discovered remote MAC ...",
//!   "stream": "stderr",
//!   "time": "2018-05-03T12:04:57.094408152Z"
//! }
//! ```

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single log line captured from a container in a Kubernetes pod.
///
/// Constructed by the HTTP decoder, validated once, then handed to the
/// store; never mutated after that.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Epoch seconds as emitted by fluentbit. Accepted but not persisted;
    /// [`LogEntry::time`] is authoritative.
    #[serde(default)]
    pub date: f64,
    #[serde(default)]
    pub kubernetes: KubernetesMetadata,
    /// The log line itself.
    #[serde(default)]
    pub log: String,
    /// Source stream, typically "stdout" or "stderr".
    #[serde(default)]
    pub stream: String,
    /// Wall-clock capture time. `None` when absent from the payload.
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
}

/// Kubernetes metadata attached to a [`LogEntry`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KubernetesMetadata {
    #[serde(default)]
    pub docker_id: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub pod_name: String,
    #[serde(default)]
    pub container_name: String,
    #[serde(default)]
    pub pod_id: String,
    #[serde(default, rename = "namespace_name")]
    pub namespace: String,
}

impl LogEntry {
    /// Ensures the entry carries all fields needed to form a row key.
    ///
    /// Reports the first missing field; other fields may be empty.
    pub fn validate(&self) -> Result<()> {
        if self.kubernetes.namespace.is_empty() {
            return Err(Error::Validation(
                "log entry missing namespace field".to_string(),
            ));
        }
        if self.kubernetes.pod_name.is_empty() {
            return Err(Error::Validation(
                "log entry missing pod_name field".to_string(),
            ));
        }
        if self.kubernetes.container_name.is_empty() {
            return Err(Error::Validation(
                "log entry missing container_name field".to_string(),
            ));
        }
        if self.time.is_none() {
            return Err(Error::Validation(
                "log entry missing time field".to_string(),
            ));
        }
        Ok(())
    }

    /// The entry timestamp, or a validation error when it is absent.
    pub(crate) fn timestamp(&self) -> Result<DateTime<Utc>> {
        self.time
            .ok_or_else(|| Error::Validation("log entry missing time field".to_string()))
    }
}

/// A closed time-range filter for historical log entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub namespace: String,
    pub pod_name: String,
    pub container_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl Query {
    /// Checks that all identifying fields are present and the interval is
    /// positive.
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(Error::Validation(
                "missing query parameter: namespace".to_string(),
            ));
        }
        if self.pod_name.is_empty() {
            return Err(Error::Validation(
                "missing query parameter: pod_name".to_string(),
            ));
        }
        if self.container_name.is_empty() {
            return Err(Error::Validation(
                "missing query parameter: container_name".to_string(),
            ));
        }
        if self.start_time >= self.end_time {
            return Err(Error::Validation(
                "query time-interval: start_time must be earlier than end_time".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{} [{}, {}]",
            self.namespace,
            self.pod_name,
            self.container_name,
            self.start_time.to_rfc3339(),
            self.end_time.to_rfc3339()
        )
    }
}

/// The rows matched by a [`Query`], in ascending time order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub log_rows: Vec<LogRow>,
}

/// A single matched log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRow {
    pub time: DateTime<Utc>,
    pub log: String,
}
