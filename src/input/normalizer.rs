//! Normalization of uploaded log text into log records
//!
//! Input that looks like JSON (an object or an array) is parsed and each
//! element is mapped onto the record shape. Anything else, including JSON
//! that fails to parse, is treated as free text with one record per
//! non-blank line. Normalization never fails.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::models::{EventId, LogBatch, LogRecord, RAW_LOG_ACTION, UNKNOWN_IP};

const TIMESTAMP_KEYS: &[&str] = &["timestamp", "@timestamp", "time"];
const IP_KEYS: &[&str] = &["ip", "sourceIp", "source_ip", "src_ip"];
const ACTION_KEYS: &[&str] = &["action", "eventType", "event_type"];
const EVENT_ID_KEYS: &[&str] = &["eventId", "event_id"];
const STATUS_KEYS: &[&str] = &["statusCode", "status_code", "status"];
const USER_AGENT_KEYS: &[&str] = &["userAgent", "user_agent"];

/// Epoch values above this are read as milliseconds
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Normalize raw log text using the current time for synthesized timestamps
pub fn normalize(raw: &str) -> LogBatch {
    normalize_at(raw, Utc::now())
}

/// Normalize raw log text, using `now` wherever a timestamp must be synthesized
pub fn normalize_at(raw: &str, now: DateTime<Utc>) -> LogBatch {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let trimmed = raw.trim();

    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Array(items)) => {
                log::debug!("Normalizing JSON array with {} element(s)", items.len());
                return items.iter().map(|item| record_from_value(item, now)).collect::<Vec<_>>().into();
            }
            Ok(value @ Value::Object(_)) => {
                log::debug!("Normalizing single JSON object");
                return LogBatch::new(vec![record_from_value(&value, now)]);
            }
            Ok(_) => {}
            Err(e) => {
                log::debug!("Structured parse failed, falling back to raw text: {}", e);
            }
        }
    }

    normalize_lines(raw, now)
}

fn normalize_lines(raw: &str, now: DateTime<Utc>) -> LogBatch {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| LogRecord::raw(now, line))
        .collect::<Vec<_>>()
        .into()
}

fn record_from_value(value: &Value, now: DateTime<Utc>) -> LogRecord {
    match value {
        Value::Object(map) => record_from_object(map, now),
        Value::String(line) => LogRecord::raw(now, line.as_str()),
        other => LogRecord::raw(now, other.to_string()),
    }
}

fn record_from_object(map: &Map<String, Value>, now: DateTime<Utc>) -> LogRecord {
    let timestamp = first_field(map, TIMESTAMP_KEYS)
        .and_then(parse_timestamp)
        .unwrap_or(now);
    let ip = string_field(map, IP_KEYS).unwrap_or_else(|| UNKNOWN_IP.to_string());
    let action = string_field(map, ACTION_KEYS).unwrap_or_else(|| RAW_LOG_ACTION.to_string());

    let mut record = LogRecord::new(timestamp, ip, action);

    if let Some(event_id) = first_field(map, EVENT_ID_KEYS).and_then(parse_event_id) {
        record = record.with_event_id(event_id);
    }
    if let Some(user) = string_field(map, &["user", "username"]) {
        record = record.with_user(user);
    }
    if let Some(status) = first_field(map, STATUS_KEYS).and_then(parse_status_code) {
        record = record.with_status_code(status);
    }
    if let Some(agent) = string_field(map, USER_AGENT_KEYS) {
        record = record.with_user_agent(agent);
    }
    if let Some(severity) = string_field(map, &["severity", "level"]) {
        record = record.with_severity(severity);
    }
    if let Some(message) = string_field(map, &["message", "msg"]) {
        record = record.with_message(message);
    }

    record
}

fn first_field<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find(|value| !value.is_null())
}

/// First non-empty string or number under any of `keys`
fn string_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn parse_event_id(value: &Value) -> Option<EventId> {
    match value {
        Value::Number(n) => n.as_i64().map(EventId::Numeric).or_else(|| Some(EventId::Text(n.to_string()))),
        Value::String(s) if !s.is_empty() => Some(EventId::Text(s.clone())),
        _ => None,
    }
}

fn parse_status_code(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|code| u16::try_from(code).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse the timestamp formats commonly found in exported security logs
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_str(s.trim()),
        Value::Number(n) => n.as_i64().and_then(from_epoch),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    s.parse::<i64>().ok().and_then(from_epoch)
}

fn from_epoch(value: i64) -> Option<DateTime<Utc>> {
    if value.unsigned_abs() >= EPOCH_MILLIS_THRESHOLD.unsigned_abs() {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    }
}
