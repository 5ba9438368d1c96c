//! Application state for one interactive analysis session
//!
//! A `Session` owns the current upload, its normalized batch and the chat
//! transcript. Loading new data swaps all of it at once. Analyzer calls are
//! tagged with a `RequestToken`; a response whose token is no longer the
//! latest is dropped instead of being appended out of order.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::analysis::context::build_context_with_limit;
use crate::analysis::{AnalysisRequest, Analyzer, AnalyzerError};
use crate::config::LimitsConfig;
use crate::input::normalize;
use crate::models::LogBatch;
use crate::output::{ExportError, ExportReport};
use crate::stats::{build_timeline_in, compute_stats, Stats, TimelineBucket};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage { role: Role::Assistant, content: content.into() }
    }
}

/// Identifies one analyzer request issued by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

/// What a finished request was for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Analysis,
    Chat,
}

pub struct Session {
    limits: LimitsConfig,
    raw: String,
    batch: LogBatch,
    messages: Vec<ChatMessage>,
    analysis: Option<String>,
    latest: Option<(RequestToken, RequestKind)>,
    next_token: u64,
}

impl Session {
    pub fn new(limits: LimitsConfig) -> Self {
        Session {
            limits,
            raw: String::new(),
            batch: LogBatch::empty(),
            messages: Vec::new(),
            analysis: None,
            latest: None,
            next_token: 0,
        }
    }

    /// Replace the session data with a raw upload
    ///
    /// The raw text is kept as-is for the analyzer; the batch is only used
    /// for local stats and chat context.
    pub fn load_raw(&mut self, raw: impl Into<String>) {
        let raw = raw.into();
        let batch = normalize(&raw);
        log::info!("Loaded {} record(s) from {} character(s) of input", batch.len(), raw.chars().count());
        self.replace(raw, batch);
    }

    /// Replace the session data with an already built batch, such as demo data
    pub fn load_batch(&mut self, batch: LogBatch) {
        let raw = match batch.to_json_pretty() {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to serialize batch for analysis: {}", e);
                String::new()
            }
        };
        log::info!("Loaded batch of {} record(s)", batch.len());
        self.replace(raw, batch);
    }

    fn replace(&mut self, raw: String, batch: LogBatch) {
        self.raw = raw;
        self.batch = batch;
        self.messages.clear();
        self.analysis = None;
        // Responses for the previous data are stale from here on.
        self.latest = None;
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn batch(&self) -> &LogBatch {
        &self.batch
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn analysis(&self) -> Option<&str> {
        self.analysis.as_deref()
    }

    pub fn stats(&self) -> Stats {
        compute_stats(&self.batch)
    }

    pub fn timeline(&self) -> Vec<TimelineBucket> {
        build_timeline_in(&self.batch, &chrono::Local, self.limits.timeline_buckets)
    }

    fn issue(&mut self, kind: RequestKind) -> RequestToken {
        self.next_token += 1;
        let token = RequestToken(self.next_token);
        self.latest = Some((token, kind));
        token
    }

    /// Start a full analysis of the current upload
    pub fn begin_analysis(&mut self) -> (RequestToken, AnalysisRequest) {
        let request = AnalysisRequest::from_raw(&self.raw, self.limits.max_payload_chars);
        if request.truncated {
            log::info!("Analysis payload truncated to {} characters", self.limits.max_payload_chars);
        }
        (self.issue(RequestKind::Analysis), request)
    }

    /// Record a chat question and build the prompt carrying its log context
    pub fn begin_chat(&mut self, message: &str) -> (RequestToken, String) {
        self.messages.push(ChatMessage::user(message));
        let prompt = build_context_with_limit(&self.batch, message, self.limits.context_records);
        (self.issue(RequestKind::Chat), prompt)
    }

    /// Apply an analyzer result; returns false if `token` was superseded
    pub fn complete(&mut self, token: RequestToken, result: Result<String, AnalyzerError>) -> bool {
        let kind = match self.latest {
            Some((latest, kind)) if latest == token => kind,
            _ => {
                log::debug!("Discarding response for superseded request {:?}", token);
                return false;
            }
        };
        self.latest = None;

        match result {
            Ok(report) => {
                if kind == RequestKind::Analysis {
                    self.analysis = Some(report.clone());
                }
                self.messages.push(ChatMessage::assistant(report));
            }
            Err(e) => {
                log::error!("Analyzer request failed: {}", e);
                self.messages.push(ChatMessage::assistant(e.user_message()));
            }
        }
        true
    }

    /// Run a full analysis to completion
    pub async fn analyze<A: Analyzer>(&mut self, analyzer: &A) -> bool {
        let (token, request) = self.begin_analysis();
        let result = analyzer.analyze(&request.prompt()).await;
        self.complete(token, result)
    }

    /// Ask a chat question and wait for the reply
    pub async fn chat<A: Analyzer>(&mut self, analyzer: &A, message: &str) -> bool {
        let (token, prompt) = self.begin_chat(message);
        let result = analyzer.analyze(&prompt).await;
        self.complete(token, result)
    }

    /// Build the export artifact for the latest analysis
    pub fn export(&self) -> Result<ExportReport, ExportError> {
        let analysis = self.analysis.clone().ok_or(ExportError::NothingToExport)?;
        Ok(ExportReport {
            timestamp: Utc::now(),
            analysis,
            logs_analyzed: self.batch.len(),
            stats: self.stats(),
        })
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new(LimitsConfig::default())
    }
}
