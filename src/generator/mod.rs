//! Synthetic security logs for demonstrations
//!
//! Produces an hour of mixed authentication and access events with the
//! occasional brute-force burst against the admin account. Values are random
//! but the shape is fixed; the random source is injected so callers can seed it.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::ThreadRng;
use rand::Rng;

use crate::models::{LogBatch, LogRecord, EVENT_LOGON_FAILED, EVENT_LOGON_SUCCESS};

pub const IP_POOL: [&str; 5] = [
    "192.168.1.10",
    "10.0.0.5",
    "45.33.22.11",
    "172.16.0.24",
    "203.0.113.7",
];

pub const USER_POOL: [&str; 5] = ["admin", "jsmith", "svc_backup", "guest", "mlopez"];

pub const ACTION_POOL: [&str; 5] = [
    "LOGIN_SUCCESS",
    "LOGIN_FAILED",
    "FILE_ACCESS",
    "PRIVILEGE_ESCALATION",
    "LOGOUT",
];

/// Records emitted per brute-force burst
pub const BURST_LEN: usize = 8;

/// Chance that a slot starts a burst
pub const BURST_PROBABILITY: f64 = 0.05;

/// Chance that a regular record carries a 403
pub const FORBIDDEN_PROBABILITY: f64 = 0.2;

/// All timestamps fall within this many milliseconds before `now`
const WINDOW_MILLIS: i64 = 60 * 60 * 1000;

/// Generates demo log batches from an injected random source
pub struct SyntheticLogGenerator<R: Rng> {
    rng: R,
    burst_probability: f64,
}

impl SyntheticLogGenerator<ThreadRng> {
    /// Generator backed by the thread-local RNG
    pub fn new() -> Self {
        SyntheticLogGenerator::with_rng(rand::thread_rng())
    }
}

impl Default for SyntheticLogGenerator<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> SyntheticLogGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        SyntheticLogGenerator {
            rng,
            burst_probability: BURST_PROBABILITY,
        }
    }

    /// Override the per-slot burst chance (clamped to 0..=1)
    pub fn with_burst_probability(mut self, probability: f64) -> Self {
        self.burst_probability = probability.clamp(0.0, 1.0);
        self
    }

    /// Generate `count` slots worth of records ending around the current time
    pub fn generate(&mut self, count: usize) -> LogBatch {
        self.generate_at(count, Utc::now())
    }

    /// Generate `count` slots worth of records within the hour before `now`
    ///
    /// A burst consumes `BURST_LEN` slots at once, so the batch may run up to
    /// `BURST_LEN - 1` records past `count`. The result is sorted by timestamp.
    pub fn generate_at(&mut self, count: usize, now: DateTime<Utc>) -> LogBatch {
        let mut records = Vec::with_capacity(count + BURST_LEN);
        let mut bursts = 0usize;
        let mut slot = 0;

        while slot < count {
            if self.rng.gen_bool(self.burst_probability) {
                records.extend(self.burst(now));
                bursts += 1;
                slot += BURST_LEN;
            } else {
                let record = self.regular(now);
                records.push(record);
                slot += 1;
            }
        }

        records.sort_by_key(|record| record.timestamp());
        log::debug!(
            "Generated {} synthetic record(s) with {} burst(s)",
            records.len(),
            bursts
        );
        LogBatch::new(records)
    }

    /// Random instant in the window that leaves `span_millis` before `now`
    fn random_instant(&mut self, now: DateTime<Utc>, span_millis: i64) -> DateTime<Utc> {
        let latest = now - Duration::milliseconds(span_millis);
        latest - Duration::milliseconds(self.rng.gen_range(0..WINDOW_MILLIS - span_millis))
    }

    fn burst(&mut self, now: DateTime<Utc>) -> Vec<LogRecord> {
        let span_millis = (BURST_LEN as i64 - 1) * 1000;
        let start = self.random_instant(now, span_millis);
        (0..BURST_LEN as i64)
            .map(|offset| {
                LogRecord::new(start + Duration::seconds(offset), IP_POOL[2], "LOGIN_FAILED")
                    .with_user(USER_POOL[0])
                    .with_event_id(EVENT_LOGON_FAILED)
                    .with_severity("High")
                    .with_message("An account failed to log on.")
            })
            .collect()
    }

    fn regular(&mut self, now: DateTime<Utc>) -> LogRecord {
        let timestamp = self.random_instant(now, 0);
        let ip = IP_POOL[self.rng.gen_range(0..IP_POOL.len())];
        let user = USER_POOL[self.rng.gen_range(0..USER_POOL.len())];
        let action = ACTION_POOL[self.rng.gen_range(0..ACTION_POOL.len())];
        let event_id = if self.rng.gen_bool(0.5) {
            EVENT_LOGON_SUCCESS
        } else {
            EVENT_LOGON_FAILED
        };
        let status_code = if self.rng.gen_bool(FORBIDDEN_PROBABILITY) { 403 } else { 200 };

        LogRecord::new(timestamp, ip, action)
            .with_user(user)
            .with_event_id(event_id)
            .with_status_code(status_code)
            .with_severity("Info")
    }
}

/// Generate a demo batch using the thread-local RNG
pub fn generate(count: usize) -> LogBatch {
    SyntheticLogGenerator::new().generate(count)
}
