//! Splitting a query time interval on UTC date borders.
//!
//! The log table's partition key contains the calendar date, so a query
//! whose interval crosses midnight would span several partitions. The
//! splitter decomposes such an interval into one period per touched UTC
//! day; every resulting sub-query then hits exactly one partition per
//! container.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::model::Query;

/// A time span with inclusive start and end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TimePeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimePeriod {
    /// Breaks the period apart on every UTC date border. For instance
    /// `["2018-10-10T23:00:00Z", "2018-10-12T01:00:00Z"]` becomes
    ///
    /// ```text
    /// ["2018-10-10T23:00:00Z", "2018-10-10T23:59:59.999999999Z"]
    /// ["2018-10-11T00:00:00Z", "2018-10-11T23:59:59.999999999Z"]
    /// ["2018-10-12T00:00:00Z", "2018-10-12T01:00:00Z"]
    /// ```
    ///
    /// A period contained in a single day is returned unchanged. The
    /// period is assumed valid (start <= end); interval validation
    /// happens upstream in [`Query::validate`].
    pub(crate) fn divide_by_days(self) -> Vec<TimePeriod> {
        if date(self.start) == date(self.end) {
            return vec![self];
        }

        let mut periods = Vec::new();
        let mut t = self.start;
        while date(t) < date(self.end) {
            let next_day = start_of_day(date(t)) + Duration::days(1);
            periods.push(TimePeriod {
                start: t,
                end: next_day - Duration::nanoseconds(1),
            });
            t = next_day;
        }
        // remaining partial day up to the original end
        periods.push(TimePeriod {
            start: start_of_day(date(self.end)),
            end: self.end,
        });

        periods
    }
}

/// The UTC calendar date of a timestamp.
fn date(t: DateTime<Utc>) -> NaiveDate {
    t.date_naive()
}

/// Midnight at the start of the given date, in UTC.
fn start_of_day(d: NaiveDate) -> DateTime<Utc> {
    d.and_time(NaiveTime::MIN).and_utc()
}

/// Lifts a query into one sub-query per UTC day its interval touches.
///
/// Sub-queries copy the identifying fields and substitute the day
/// period as their time interval; they are returned in chronological
/// order. The query is assumed valid.
pub(crate) fn split(query: &Query) -> Vec<Query> {
    TimePeriod {
        start: query.start_time,
        end: query.end_time,
    }
    .divide_by_days()
    .into_iter()
    .map(|period| Query {
        namespace: query.namespace.clone(),
        pod_name: query.pod_name.clone(),
        container_name: query.container_name.clone(),
        start_time: period.start,
        end_time: period.end,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn period(start: &str, end: &str) -> TimePeriod {
        TimePeriod {
            start: ts(start),
            end: ts(end),
        }
    }

    #[test]
    fn should_keep_single_day_period_unchanged() {
        // given
        let p = period("2018-10-10T01:00:00Z", "2018-10-10T23:00:00Z");

        // when
        let days = p.divide_by_days();

        // then
        assert_eq!(days, vec![p]);
    }

    #[test]
    fn should_keep_full_day_period_unchanged() {
        // given - exactly 00:00:00 to 23:59:59.999999999 of one day
        let p = period("2018-10-10T00:00:00Z", "2018-10-10T23:59:59.999999999Z");

        // when
        let days = p.divide_by_days();

        // then
        assert_eq!(days, vec![p]);
    }

    #[test]
    fn should_keep_zero_length_period_unchanged() {
        let p = period("2018-10-10T12:00:00Z", "2018-10-10T12:00:00Z");
        assert_eq!(p.divide_by_days(), vec![p]);
    }

    #[test]
    fn should_split_period_crossing_one_date_border() {
        // given
        let p = period("2018-01-01T23:59:00Z", "2018-01-02T00:01:00Z");

        // when
        let days = p.divide_by_days();

        // then
        assert_eq!(
            days,
            vec![
                period("2018-01-01T23:59:00Z", "2018-01-01T23:59:59.999999999Z"),
                period("2018-01-02T00:00:00Z", "2018-01-02T00:01:00Z"),
            ]
        );
    }

    #[test]
    fn should_split_period_spanning_intervening_full_days() {
        // given
        let p = period("2018-10-10T23:00:00Z", "2018-10-12T01:00:00Z");

        // when
        let days = p.divide_by_days();

        // then
        assert_eq!(
            days,
            vec![
                period("2018-10-10T23:00:00Z", "2018-10-10T23:59:59.999999999Z"),
                period("2018-10-11T00:00:00Z", "2018-10-11T23:59:59.999999999Z"),
                period("2018-10-12T00:00:00Z", "2018-10-12T01:00:00Z"),
            ]
        );
    }

    #[test]
    fn should_cover_union_without_gaps_or_overlap() {
        // given
        let p = period("2018-03-04T07:13:21.5Z", "2018-03-09T18:00:00Z");

        // when
        let days = p.divide_by_days();

        // then - one period per touched day
        assert_eq!(days.len(), 6);
        // endpoints preserved
        assert_eq!(days[0].start, p.start);
        assert_eq!(days[days.len() - 1].end, p.end);
        // consecutive periods are adjacent: next start is exactly 1ns
        // after the previous end
        for pair in days.windows(2) {
            assert_eq!(pair[1].start, pair[0].end + Duration::nanoseconds(1));
        }
        // no period crosses a date border
        for day in &days {
            assert_eq!(day.start.date_naive(), day.end.date_naive());
        }
    }

    #[test]
    fn should_split_query_into_subqueries_preserving_filters() {
        // given
        let query = Query {
            namespace: "kube-system".to_string(),
            pod_name: "weave-net-5mfwh".to_string(),
            container_name: "weave".to_string(),
            start_time: ts("2018-01-01T23:59:00Z"),
            end_time: ts("2018-01-02T00:01:00Z"),
        };

        // when
        let sub_queries = split(&query);

        // then
        assert_eq!(sub_queries.len(), 2);
        for sub in &sub_queries {
            assert_eq!(sub.namespace, query.namespace);
            assert_eq!(sub.pod_name, query.pod_name);
            assert_eq!(sub.container_name, query.container_name);
        }
        assert_eq!(sub_queries[0].start_time, ts("2018-01-01T23:59:00Z"));
        assert_eq!(
            sub_queries[0].end_time,
            ts("2018-01-01T23:59:59.999999999Z")
        );
        assert_eq!(sub_queries[1].start_time, ts("2018-01-02T00:00:00Z"));
        assert_eq!(sub_queries[1].end_time, ts("2018-01-02T00:01:00Z"));
    }

    #[test]
    fn should_yield_single_subquery_for_single_day_query() {
        // given
        let query = Query {
            namespace: "ns".to_string(),
            pod_name: "pod".to_string(),
            container_name: "ctr".to_string(),
            start_time: ts("2018-01-01T01:00:00Z"),
            end_time: ts("2018-01-01T02:00:00Z"),
        };

        // when
        let sub_queries = split(&query);

        // then
        assert_eq!(sub_queries, vec![query]);
    }
}
