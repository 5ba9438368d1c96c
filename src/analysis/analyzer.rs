//! External analyzer client
//!
//! Threat reasoning is delegated entirely to a hosted model. This module
//! defines the seam (`Analyzer`) and an HTTP implementation for the
//! Gemini `generateContent` API.

use crate::config::AnalyzerConfig;
use regex::Regex;
use reqwest::Client;
use std::future::Future;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Shown when the analyzer rejects a payload for size or quota reasons
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str =
    "The log file is still too large for the analyzer even after truncation. Try a smaller file or a narrower time range.";

/// Errors that can occur while calling the analyzer
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Analyzer returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Analyzer returned no report text")]
    EmptyResponse,
}

fn size_limit_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\b(tokens?|counts?)\b").expect("size limit pattern is valid"))
}

impl AnalyzerError {
    /// Whether the failure description points at a token or size limit
    pub fn is_size_limit(&self) -> bool {
        size_limit_pattern().is_match(&self.to_string())
    }

    /// Message suitable for showing to the user as an assistant reply
    pub fn user_message(&self) -> String {
        if self.is_size_limit() {
            PAYLOAD_TOO_LARGE_MESSAGE.to_string()
        } else {
            format!("Analysis failed: {}", self)
        }
    }
}

/// Something that turns a prompt into a textual threat report
pub trait Analyzer {
    fn analyze(&self, prompt: &str) -> impl Future<Output = Result<String, AnalyzerError>> + Send;
}

/// Analyzer backed by the Gemini `generateContent` endpoint
pub struct GeminiAnalyzer {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiAnalyzer {
    pub fn new(config: &AnalyzerConfig, api_key: String) -> Self {
        GeminiAnalyzer {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_seconds))
                .build()
                .unwrap_or_default(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        }
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

impl Analyzer for GeminiAnalyzer {
    async fn analyze(&self, prompt: &str) -> Result<String, AnalyzerError> {
        let payload = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }]
        });

        log::info!("Sending {} character(s) to analyzer model {}", prompt.chars().count(), self.model);

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let body: serde_json::Value = serde_json::from_str(&text).unwrap_or_default();

        if !status.is_success() {
            let message = body["error"]["message"]
                .as_str()
                .map(str::to_string)
                .unwrap_or(text);
            log::error!("Analyzer returned {}: {}", status, message);
            return Err(AnalyzerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        extract_report(&body).ok_or(AnalyzerError::EmptyResponse)
    }
}

/// Concatenate the text parts of the first candidate
fn extract_report(body: &serde_json::Value) -> Option<String> {
    let parts = body["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts.iter().filter_map(|part| part["text"].as_str()).collect();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
