//! Retrieval of example log documents over HTTP

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching sample data
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sample source returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("No sample URL configured")]
    NoUrl,
}

/// Fetches a fixed external JSON document of example records
///
/// Failures are reported to the caller once; nothing is retried.
pub struct SampleFetcher {
    client: Client,
}

impl SampleFetcher {
    pub fn new(timeout: Duration) -> Self {
        SampleFetcher {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// Download the document at `url` and return its body as text
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if url.trim().is_empty() {
            return Err(FetchError::NoUrl);
        }

        log::info!("Fetching sample logs from {}", url);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            log::warn!("Sample source returned non-success status: {}", response.status());
            return Err(FetchError::Status(response.status()));
        }

        let body = response.text().await?;
        log::debug!("Fetched {} byte(s) of sample data", body.len());
        Ok(body)
    }
}

impl Default for SampleFetcher {
    fn default() -> Self {
        SampleFetcher::new(Duration::from_secs(30))
    }
}
