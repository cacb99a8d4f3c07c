//! Plain HTTP helpers used to probe the deployed app.
//!
//! In playback mode every call returns [`PLAYBACK_SENTINEL`] without touching
//! the network.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::error::{AzureError, Result, SampleError};

/// Body returned by every helper call in playback mode.
pub const PLAYBACK_SENTINEL: &str = "[Running in PlaybackMode]";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default connection timeout in seconds.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Fetches raw response bodies.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// GETs `url` and returns the body.
    async fn get(&self, url: &str) -> Result<String>;

    /// POSTs `body` to `url` and returns the response body.
    async fn post(&self, url: &str, body: &str) -> Result<String>;
}

/// `reqwest`-backed fetcher with a playback switch.
#[derive(Debug, Clone)]
pub struct HttpHelper {
    /// HTTP client.
    client: Client,
    /// Whether calls short-circuit to the sentinel.
    playback: bool,
}

impl HttpHelper {
    /// Creates a helper.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(playback: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| SampleError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, playback })
    }

    /// Returns true if calls are short-circuited.
    #[must_use]
    pub const fn is_playback(&self) -> bool {
        self.playback
    }

    async fn read_body(response: reqwest::Response, url: &str) -> Result<String> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AzureError::network(format!("Reading {url} failed: {e}")))?;
        debug!("{url} answered {status}");
        Ok(body)
    }
}

#[async_trait]
impl HttpFetcher for HttpHelper {
    async fn get(&self, url: &str) -> Result<String> {
        if self.playback {
            return Ok(PLAYBACK_SENTINEL.to_string());
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AzureError::network(format!("GET {url} failed: {e}")))?;
        Self::read_body(response, url).await
    }

    async fn post(&self, url: &str, body: &str) -> Result<String> {
        if self.playback {
            return Ok(PLAYBACK_SENTINEL.to_string());
        }

        let response = self
            .client
            .post(url)
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| AzureError::network(format!("POST {url} failed: {e}")))?;
        Self::read_body(response, url).await
    }
}
