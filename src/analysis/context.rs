//! Bounded context for free-form chat questions

use crate::models::LogBatch;

/// Records included ahead of a chat question
pub const MAX_CONTEXT_RECORDS: usize = 50;

pub const CONTEXT_LABEL: &str = "Context Logs:";
pub const QUESTION_LABEL: &str = "User Question:";

/// Prefix `message` with at most the first 50 records of `batch`
pub fn build_context(batch: &LogBatch, message: &str) -> String {
    build_context_with_limit(batch, message, MAX_CONTEXT_RECORDS)
}

/// Prefix `message` with at most `limit` records, serialized as one JSON line
///
/// An empty batch forwards the message unchanged.
pub fn build_context_with_limit(batch: &LogBatch, message: &str, limit: usize) -> String {
    if batch.is_empty() {
        return message.to_string();
    }

    let window = &batch.records()[..batch.len().min(limit)];
    match serde_json::to_string(window) {
        Ok(json) => format!("{}\n{}\n\n{} {}", CONTEXT_LABEL, json, QUESTION_LABEL, message),
        Err(e) => {
            log::warn!("Failed to serialize chat context, sending question alone: {}", e);
            message.to_string()
        }
    }
}
