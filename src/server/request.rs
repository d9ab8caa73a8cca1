//! Extraction of a [`Query`] from `GET /query` string parameters.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::model::Query;

/// Builds a query from the request's query-string parameters.
///
/// `namespace`, `pod_name`, `container_name` and `start_time` are
/// required; `end_time` defaults to the current UTC time. Timestamps are
/// RFC3339 with optional fractional seconds.
pub(super) fn query_from_params(params: &HashMap<String, String>) -> Result<Query> {
    let namespace = required(params, "namespace")?;
    let pod_name = required(params, "pod_name")?;
    let container_name = required(params, "container_name")?;

    let start_time = parse_rfc3339(required(params, "start_time")?)
        .ok_or_else(|| Error::Validation("failed to parse start_time".to_string()))?;
    let end_time = match params.get("end_time") {
        Some(raw) => parse_rfc3339(raw)
            .ok_or_else(|| Error::Validation("failed to parse end_time".to_string()))?,
        None => Utc::now(),
    };

    Ok(Query {
        namespace: namespace.to_string(),
        pod_name: pod_name.to_string(),
        container_name: container_name.to_string(),
        start_time,
        end_time,
    })
}

fn required<'a>(params: &'a HashMap<String, String>, name: &str) -> Result<&'a str> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| Error::Validation(format!("missing query parameter: {}", name)))
}

fn parse_rfc3339(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn complete_params() -> HashMap<String, String> {
        params(&[
            ("namespace", "kube-system"),
            ("pod_name", "weave-net-5mfwh"),
            ("container_name", "weave"),
            ("start_time", "2018-05-03T12:00:00Z"),
            ("end_time", "2018-05-03T13:00:00Z"),
        ])
    }

    #[test]
    fn should_build_query_from_complete_params() {
        // when
        let query = query_from_params(&complete_params()).unwrap();

        // then
        assert_eq!(query.namespace, "kube-system");
        assert_eq!(query.pod_name, "weave-net-5mfwh");
        assert_eq!(query.container_name, "weave");
        assert_eq!(
            query.start_time,
            "2018-05-03T12:00:00Z".parse::<chrono::DateTime<chrono::Utc>>().unwrap()
        );
        assert_eq!(
            query.end_time,
            "2018-05-03T13:00:00Z".parse::<chrono::DateTime<chrono::Utc>>().unwrap()
        );
    }

    #[test]
    fn should_report_each_missing_required_parameter() {
        for name in ["namespace", "pod_name", "container_name", "start_time"] {
            // given
            let mut p = complete_params();
            p.remove(name);

            // when
            let err = query_from_params(&p).unwrap_err();

            // then
            assert_eq!(err.to_string(), format!("missing query parameter: {}", name));
        }
    }

    #[test]
    fn should_default_end_time_to_now() {
        // given
        let mut p = complete_params();
        p.remove("end_time");

        // when
        let before = Utc::now();
        let query = query_from_params(&p).unwrap();
        let after = Utc::now();

        // then
        assert!(query.end_time >= before && query.end_time <= after);
    }

    #[test]
    fn should_reject_malformed_start_time() {
        // given
        let mut p = complete_params();
        p.insert("start_time".to_string(), "yesterday".to_string());

        // when
        let err = query_from_params(&p).unwrap_err();

        // then
        assert_eq!(err.to_string(), "failed to parse start_time");
    }

    #[test]
    fn should_reject_malformed_end_time() {
        let mut p = complete_params();
        p.insert("end_time".to_string(), "2018-05-03".to_string());
        let err = query_from_params(&p).unwrap_err();
        assert_eq!(err.to_string(), "failed to parse end_time");
    }

    #[test]
    fn should_parse_fractional_second_timestamps() {
        // given
        let mut p = complete_params();
        p.insert(
            "start_time".to_string(),
            "2018-05-03T12:04:57.094408152Z".to_string(),
        );

        // when
        let query = query_from_params(&p).unwrap();

        // then
        assert_eq!(query.start_time.timestamp_subsec_nanos(), 94408152);
    }
}
