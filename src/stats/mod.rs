//! Summary statistics and minute-resolution timeline
//!
//! Two "failed" predicates exist on purpose. The headline count treats a
//! record as failed if its action, status or event id says so; timeline
//! buckets only look at the action. They disagree on records such as a 403
//! with a successful action, and are kept separate rather than unified.

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::models::{LogBatch, LogRecord, EVENT_LOGON_FAILED};

/// Timeline keeps at most this many of the latest buckets
pub const MAX_TIMELINE_BUCKETS: usize = 20;

/// Headline counters for a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    pub failed: usize,
    pub unique_ips: usize,
    pub critical: usize,
}

/// Event counts for one `HH:MM` minute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineBucket {
    pub time_label: String,
    pub total_count: usize,
    pub failed_count: usize,
}

/// Failure as counted in `Stats::failed`
pub fn is_failed_event(record: &LogRecord) -> bool {
    is_failed_action(record)
        || record.status_code() == Some(403)
        || record.event_id().and_then(|id| id.as_numeric()) == Some(EVENT_LOGON_FAILED)
}

/// Failure as counted in timeline buckets
pub fn is_failed_action(record: &LogRecord) -> bool {
    record.action().contains("FAILED")
}

pub fn is_critical(record: &LogRecord) -> bool {
    matches!(record.severity(), Some("High") | Some("Critical"))
}

/// Compute headline counters
pub fn compute_stats(batch: &LogBatch) -> Stats {
    let unique_ips: HashSet<&str> = batch.iter().map(LogRecord::ip).collect();

    Stats {
        total: batch.len(),
        failed: batch.iter().filter(|r| is_failed_event(r)).count(),
        unique_ips: unique_ips.len(),
        critical: batch.iter().filter(|r| is_critical(r)).count(),
    }
}

/// Build the timeline with labels in the local timezone
pub fn build_timeline(batch: &LogBatch) -> Vec<TimelineBucket> {
    build_timeline_in(batch, &Local, MAX_TIMELINE_BUCKETS)
}

/// Build the timeline with labels in `tz`, keeping the last `max_buckets`
///
/// Buckets are ordered by label, so a batch that crosses midnight orders
/// `00:xx` before `23:xx`.
pub fn build_timeline_in<Tz: TimeZone>(batch: &LogBatch, tz: &Tz, max_buckets: usize) -> Vec<TimelineBucket>
where
    Tz::Offset: std::fmt::Display,
{
    let mut buckets: BTreeMap<String, (usize, usize)> = BTreeMap::new();

    for record in batch {
        let label = record.timestamp().with_timezone(tz).format("%H:%M").to_string();
        let entry = buckets.entry(label).or_insert((0, 0));
        entry.0 += 1;
        if is_failed_action(record) {
            entry.1 += 1;
        }
    }

    let skip = buckets.len().saturating_sub(max_buckets);
    buckets
        .into_iter()
        .skip(skip)
        .map(|(time_label, (total_count, failed_count))| TimelineBucket {
            time_label,
            total_count,
            failed_count,
        })
        .collect()
}

/// Stats and timeline for a batch, labels in the local timezone
pub fn aggregate(batch: &LogBatch) -> (Stats, Vec<TimelineBucket>) {
    (compute_stats(batch), build_timeline(batch))
}

/// Stats and timeline for a batch, labels in `tz`
pub fn aggregate_in<Tz: TimeZone>(batch: &LogBatch, tz: &Tz) -> (Stats, Vec<TimelineBucket>)
where
    Tz::Offset: std::fmt::Display,
{
    (compute_stats(batch), build_timeline_in(batch, tz, MAX_TIMELINE_BUCKETS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::SyntheticLogGenerator;
    use crate::models::EventId;
    use chrono::{DateTime, Duration, FixedOffset, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, minute, second).unwrap()
    }

    #[test]
    fn test_failed_counted_once_per_record() {
        let record = LogRecord::new(at(10, 0, 0), "1.2.3.4", "LOGIN_FAILED")
            .with_status_code(200)
            .with_event_id(EVENT_LOGON_FAILED)
            .with_severity("Info");
        let (stats, _) = aggregate_in(&LogBatch::new(vec![record]), &Utc);

        assert_eq!(stats.total, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.critical, 0);
        assert_eq!(stats.unique_ips, 1);
    }

    #[test]
    fn test_empty_batch() {
        let (stats, timeline) = aggregate(&LogBatch::empty());
        assert_eq!(stats, Stats { total: 0, failed: 0, unique_ips: 0, critical: 0 });
        assert!(timeline.is_empty());
    }

    #[test]
    fn test_failed_predicates_differ() {
        let forbidden = LogRecord::new(at(10, 0, 0), "1.1.1.1", "FILE_ACCESS").with_status_code(403);
        let text_id = LogRecord::new(at(10, 0, 0), "1.1.1.1", "LOGIN_SUCCESS").with_event_id(EventId::Text("4625".to_string()));
        let failed_event = LogRecord::new(at(10, 0, 0), "1.1.1.1", "LOGIN_SUCCESS").with_event_id(EVENT_LOGON_FAILED);

        assert!(is_failed_event(&forbidden));
        assert!(!is_failed_action(&forbidden));
        assert!(!is_failed_event(&text_id));
        assert!(is_failed_event(&failed_event));
        assert!(!is_failed_action(&failed_event));

        let batch = LogBatch::new(vec![forbidden, text_id, failed_event]);
        let (stats, timeline) = aggregate_in(&batch, &Utc);
        assert_eq!(stats.failed, 2);
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].total_count, 3);
        assert_eq!(timeline[0].failed_count, 0);
    }

    #[test]
    fn test_unique_ips_and_critical() {
        let batch = LogBatch::new(vec![
            LogRecord::new(at(9, 0, 0), "10.0.0.1", "LOGIN_SUCCESS").with_severity("High"),
            LogRecord::new(at(9, 0, 1), "10.0.0.1", "LOGIN_SUCCESS").with_severity("Critical"),
            LogRecord::new(at(9, 0, 2), "10.0.0.2", "LOGOUT").with_severity("high"),
            LogRecord::new(at(9, 0, 3), "Unknown", "RAW_LOG"),
        ]);
        let stats = compute_stats(&batch);

        assert_eq!(stats.unique_ips, 3);
        assert_eq!(stats.critical, 2);
        assert_eq!(stats.failed, 0);
    }

    #[test]
    fn test_timeline_groups_by_minute() {
        let batch = LogBatch::new(vec![
            LogRecord::new(at(10, 1, 59), "a", "LOGIN_FAILED"),
            LogRecord::new(at(10, 0, 5), "a", "LOGIN_SUCCESS"),
            LogRecord::new(at(10, 0, 45), "b", "LOGIN_FAILED"),
            LogRecord::new(at(10, 1, 0), "c", "SSH_FAILED"),
        ]);
        let timeline = build_timeline_in(&batch, &Utc, MAX_TIMELINE_BUCKETS);

        assert_eq!(
            timeline,
            vec![
                TimelineBucket { time_label: "10:00".to_string(), total_count: 2, failed_count: 1 },
                TimelineBucket { time_label: "10:01".to_string(), total_count: 2, failed_count: 2 },
            ]
        );
    }

    #[test]
    fn test_timeline_labels_follow_timezone() {
        let batch = LogBatch::new(vec![LogRecord::new(at(10, 15, 0), "a", "LOGIN_SUCCESS")]);
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let timeline = build_timeline_in(&batch, &plus_two, MAX_TIMELINE_BUCKETS);
        assert_eq!(timeline[0].time_label, "12:15");
    }

    #[test]
    fn test_timeline_keeps_latest_twenty() {
        let start = at(8, 0, 0);
        let records = (0..30)
            .map(|i| LogRecord::new(start + Duration::minutes(i), "a", "LOGIN_SUCCESS"))
            .collect::<Vec<_>>();
        let timeline = build_timeline_in(&LogBatch::new(records), &Utc, MAX_TIMELINE_BUCKETS);

        assert_eq!(timeline.len(), MAX_TIMELINE_BUCKETS);
        assert_eq!(timeline.first().unwrap().time_label, "08:10");
        assert_eq!(timeline.last().unwrap().time_label, "08:29");
        assert!(timeline.windows(2).all(|pair| pair[0].time_label < pair[1].time_label));
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let batch = SyntheticLogGenerator::with_rng(StdRng::seed_from_u64(5)).generate_at(150, at(12, 0, 0));

        let first = aggregate_in(&batch, &Utc);
        let second = aggregate_in(&batch, &Utc);
        assert_eq!(first, second);
        assert!(first.1.len() <= MAX_TIMELINE_BUCKETS);
        assert!(first.1.windows(2).all(|pair| pair[0].time_label < pair[1].time_label));
        assert_eq!(first.0.total, batch.len());
    }
}
