//! Store configuration: contact points, schema names, replication
//! topology and writer-pool sizing.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Replication strategy used when the keyspace needs to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicationStrategy {
    Simple,
    NetworkTopology,
}

impl fmt::Display for ReplicationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplicationStrategy::Simple => f.write_str("SimpleStrategy"),
            ReplicationStrategy::NetworkTopology => f.write_str("NetworkTopologyStrategy"),
        }
    }
}

impl FromStr for ReplicationStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SimpleStrategy" => Ok(ReplicationStrategy::Simple),
            "NetworkTopologyStrategy" => Ok(ReplicationStrategy::NetworkTopology),
            other => Err(Error::Options(format!(
                "invalid replication strategy: {}: must be one of \
                 [SimpleStrategy, NetworkTopologyStrategy]",
                other
            ))),
        }
    }
}

/// Per-datacenter replication factors for the keyspace.
///
/// With [`ReplicationStrategy::Simple`] the map must hold exactly one
/// entry keyed `cluster`. The sorted key order of the underlying
/// `BTreeMap` keeps DDL rendering deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplicationFactorMap(BTreeMap<String, u32>);

impl ReplicationFactorMap {
    /// Parses a map from its JSON form, e.g. `{"dc1":3,"dc2":2}`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Options(format!("failed to parse replication factor map: {}", e)))
    }

    pub fn get(&self, datacenter: &str) -> Option<u32> {
        self.0.get(datacenter).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Renders the map as a CQL replication option fragment:
    /// `'dc1': 2, 'dc2': 3`, keys in sorted order.
    pub(crate) fn as_cql(&self) -> String {
        let mut out = String::new();
        for (i, (dc, factor)) in self.0.iter().enumerate() {
            if i != 0 {
                out.push_str(", ");
            }
            out.push_str(&format!("'{}': {}", dc, factor));
        }
        out
    }
}

impl<const N: usize> From<[(&str, u32); N]> for ReplicationFactorMap {
    fn from(entries: [(&str, u32); N]) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(dc, factor)| (dc.to_string(), factor))
                .collect(),
        )
    }
}

/// Cassandra store options.
#[derive(Debug, Clone)]
pub struct Options {
    /// One or more cluster nodes to connect to.
    pub hosts: Vec<String>,
    /// CQL native protocol port.
    pub port: u16,
    /// Keyspace holding the log table; created if it does not exist.
    pub keyspace: String,
    /// Name of the log table; created if it does not exist.
    pub log_table: String,
    /// Strategy to use when the keyspace needs to be created.
    pub replication_strategy: ReplicationStrategy,
    /// Replication factors, one per datacenter (or the single `cluster`
    /// entry for [`ReplicationStrategy::Simple`]).
    pub replication_factors: ReplicationFactorMap,
    /// Number of writer tasks processing insert statements.
    pub write_concurrency: usize,
    /// Maximum number of inserts queued before further writes block.
    pub write_buffer_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            hosts: vec!["127.0.0.1".to_string()],
            port: 9042,
            keyspace: "insight_logs".to_string(),
            log_table: "logs".to_string(),
            replication_strategy: ReplicationStrategy::Simple,
            replication_factors: ReplicationFactorMap::from([("cluster", 1)]),
            write_concurrency: cores * 4,
            write_buffer_size: 1024,
        }
    }
}

impl Options {
    /// Checks the options, reporting the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.hosts.is_empty() {
            return Err(Error::Options(
                "at least one cassandra host must be given".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(Error::Options(
                "CQL port must be in range [1,65535]".to_string(),
            ));
        }
        if self.keyspace.is_empty() {
            return Err(Error::Options("no keyspace given".to_string()));
        }
        if self.log_table.is_empty() {
            return Err(Error::Options("no log table name given".to_string()));
        }
        match self.replication_strategy {
            ReplicationStrategy::Simple => {
                if self.replication_factors.len() != 1 {
                    return Err(Error::Options(
                        "for SimpleStrategy, one single replication factor must be given"
                            .to_string(),
                    ));
                }
                if self.replication_factors.get("cluster").is_none() {
                    return Err(Error::Options(
                        "for SimpleStrategy, a replication factor with key 'cluster' is required"
                            .to_string(),
                    ));
                }
            }
            ReplicationStrategy::NetworkTopology => {
                if self.replication_factors.is_empty() {
                    return Err(Error::Options(
                        "for NetworkTopologyStrategy, one replication factor must be given \
                         for each datacenter"
                            .to_string(),
                    ));
                }
            }
        }
        if self.write_concurrency == 0 {
            return Err(Error::Options(
                "write concurrency must be a positive value".to_string(),
            ));
        }
        if self.write_buffer_size == 0 {
            return Err(Error::Options(
                "write buffer size must be a positive value".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_accept_default_options() {
        assert!(Options::default().validate().is_ok());
    }

    #[test]
    fn should_reject_empty_hosts() {
        // given
        let options = Options {
            hosts: vec![],
            ..Options::default()
        };

        // when
        let err = options.validate().unwrap_err();

        // then
        assert_eq!(
            err.to_string(),
            "invalid cassandra options: at least one cassandra host must be given"
        );
    }

    #[test]
    fn should_reject_zero_port() {
        let options = Options {
            port: 0,
            ..Options::default()
        };
        let err = options.validate().unwrap_err();
        assert!(err.to_string().contains("CQL port must be in range"));
    }

    #[test]
    fn should_reject_empty_keyspace() {
        let options = Options {
            keyspace: String::new(),
            ..Options::default()
        };
        let err = options.validate().unwrap_err();
        assert!(err.to_string().contains("no keyspace given"));
    }

    #[test]
    fn should_reject_empty_log_table() {
        let options = Options {
            log_table: String::new(),
            ..Options::default()
        };
        let err = options.validate().unwrap_err();
        assert!(err.to_string().contains("no log table name given"));
    }

    #[test]
    fn should_reject_simple_strategy_with_multiple_factors() {
        let options = Options {
            replication_strategy: ReplicationStrategy::Simple,
            replication_factors: ReplicationFactorMap::from([("dc1", 1), ("dc2", 2)]),
            ..Options::default()
        };
        let err = options.validate().unwrap_err();
        assert!(
            err.to_string()
                .contains("one single replication factor must be given")
        );
    }

    #[test]
    fn should_reject_simple_strategy_without_cluster_key() {
        let options = Options {
            replication_strategy: ReplicationStrategy::Simple,
            replication_factors: ReplicationFactorMap::from([("dc1", 1)]),
            ..Options::default()
        };
        let err = options.validate().unwrap_err();
        assert!(
            err.to_string()
                .contains("a replication factor with key 'cluster' is required")
        );
    }

    #[test]
    fn should_reject_network_topology_without_factors() {
        let options = Options {
            replication_strategy: ReplicationStrategy::NetworkTopology,
            replication_factors: ReplicationFactorMap::default(),
            ..Options::default()
        };
        let err = options.validate().unwrap_err();
        assert!(
            err.to_string()
                .contains("one replication factor must be given for each datacenter")
        );
    }

    #[test]
    fn should_accept_network_topology_with_factors() {
        let options = Options {
            replication_strategy: ReplicationStrategy::NetworkTopology,
            replication_factors: ReplicationFactorMap::from([("dc1", 3), ("dc2", 2)]),
            ..Options::default()
        };
        assert!(options.validate().is_ok());
    }

    #[test]
    fn should_reject_zero_write_concurrency() {
        let options = Options {
            write_concurrency: 0,
            ..Options::default()
        };
        let err = options.validate().unwrap_err();
        assert!(
            err.to_string()
                .contains("write concurrency must be a positive value")
        );
    }

    #[test]
    fn should_reject_zero_write_buffer_size() {
        let options = Options {
            write_buffer_size: 0,
            ..Options::default()
        };
        let err = options.validate().unwrap_err();
        assert!(
            err.to_string()
                .contains("write buffer size must be a positive value")
        );
    }

    #[test]
    fn should_parse_replication_strategy_names() {
        assert_eq!(
            "SimpleStrategy".parse::<ReplicationStrategy>().unwrap(),
            ReplicationStrategy::Simple
        );
        assert_eq!(
            "NetworkTopologyStrategy"
                .parse::<ReplicationStrategy>()
                .unwrap(),
            ReplicationStrategy::NetworkTopology
        );
        assert!("RackAwareStrategy".parse::<ReplicationStrategy>().is_err());
    }

    #[test]
    fn should_parse_replication_factor_map_from_json() {
        // given/when
        let map = ReplicationFactorMap::from_json(r#"{"dc1":3,"dc2":2}"#).unwrap();

        // then
        assert_eq!(map.get("dc1"), Some(3));
        assert_eq!(map.get("dc2"), Some(2));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn should_reject_malformed_replication_factor_json() {
        let err = ReplicationFactorMap::from_json("not json").unwrap_err();
        assert!(
            err.to_string()
                .contains("failed to parse replication factor map")
        );
    }

    #[test]
    fn should_render_cql_fragment_with_sorted_keys() {
        // given - insertion order differs from sorted order
        let map = ReplicationFactorMap::from([("dc2", 3), ("dc1", 2), ("dc3", 4)]);

        // when
        let fragment = map.as_cql();

        // then
        assert_eq!(fragment, "'dc1': 2, 'dc2': 3, 'dc3': 4");
    }
}
