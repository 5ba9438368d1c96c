//! Preparation of outbound analyzer payloads
//!
//! The raw upload, never the normalized batch, is what the analyzer sees, so
//! a normalization fallback can never block or distort an analysis.

pub mod analyzer;
pub mod context;
pub mod truncator;

pub use analyzer::{Analyzer, AnalyzerError, GeminiAnalyzer};
pub use context::build_context;
pub use truncator::{prepare, Prepared, MAX_PAYLOAD_CHARS, TRUNCATION_NOTICE};

/// Instructions placed ahead of the log payload
pub const ANALYSIS_INSTRUCTIONS: &str = "You are a senior security analyst. Analyze the following security logs. \
Identify suspicious activity such as brute-force attempts, privilege escalation and unusual access patterns. \
Respond in markdown with a summary, a list of findings with severity, affected users and IPs, and recommended actions.";

/// A size-bounded payload ready for the analyzer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub payload: String,
    pub truncated: bool,
}

impl AnalysisRequest {
    /// Bound the raw upload to `max_chars` characters
    pub fn from_raw(raw: &str, max_chars: usize) -> Self {
        let Prepared { payload, was_truncated } = truncator::prepare_with_limit(raw, max_chars);
        AnalysisRequest {
            payload,
            truncated: was_truncated,
        }
    }

    /// Full prompt text sent to the analyzer
    pub fn prompt(&self) -> String {
        format!("{}\n\nLogs:\n{}", ANALYSIS_INSTRUCTIONS, self.payload)
    }
}
