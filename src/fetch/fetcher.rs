//! HTTP fetcher implementation
//!
//! This module handles every GET request the pipeline makes to article
//! hosts, including:
//! - Building the HTTP client with a desktop browser user agent
//! - Optional cookie headers for hosts behind a login/age gate
//! - Exponential backoff between retries
//! - Failure classification for logging

use crate::config::FetchConfig;
use crate::fetch::decode::decode_body;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::Client;
use std::time::Duration;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,

    /// HTTP status code
    pub status_code: u16,

    /// Content-Type header value
    pub content_type: Option<String>,

    /// Raw body bytes (already inflated if the transport was gzip-encoded)
    pub body: Vec<u8>,
}

impl FetchedPage {
    /// Body decoded to text, inflating mislabelled gzip payloads first
    pub fn text(&self) -> String {
        decode_body(&self.body, self.content_type.as_deref())
    }
}

/// Result of a fetch with retries
///
/// Exhausted retries are a value, not an error, so callers can classify
/// them as a `request_error`.
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched(FetchedPage),

    Failed {
        /// Description of the last failure
        error: String,
        /// Number of attempts made
        attempts: u32,
    },
}

impl FetchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn page(self) -> Option<FetchedPage> {
        match self {
            Self::Fetched(page) => Some(page),
            Self::Failed { .. } => None,
        }
    }
}

/// Builds an HTTP client for extraction targets
///
/// Certificate verification is off: article hosts are low-trust sources
/// whose availability matters more than their certificate hygiene.
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.timeout())
        .danger_accept_invalid_certs(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Delay after failed attempt `attempt` (0-based): `base * 2^(attempt - 1)`
///
/// With a one second base this is 0.5s, 1s, 2s, ...
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32 << attempt.min(20)) / 2
}

/// Sends GET requests with retry and backoff
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    retry_base_delay: Duration,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
        })
    }

    /// Fetches `url`, retrying up to `max_retries` extra times
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 4xx/5xx | Retry with backoff |
    /// | Timeout | Retry with backoff |
    /// | Connection failure | Retry with backoff |
    /// | Body read failure (bad chunking) | Retry with backoff |
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to fetch
    /// * `max_retries` - Additional attempts after the first one
    /// * `cookie` - Optional `Cookie` header value
    pub async fn fetch(&self, url: &str, max_retries: u32, cookie: Option<&str>) -> FetchOutcome {
        let mut last_error = String::new();

        for attempt in 0..=max_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.retry_base_delay, attempt - 1);
                tracing::debug!(url, attempt, ?delay, "Backing off before retry");
                tokio::time::sleep(delay).await;
            }

            match self.attempt(url, cookie).await {
                Ok(page) => return FetchOutcome::Fetched(page),
                Err(error) => {
                    tracing::debug!(url, attempt, error = %error, "Fetch attempt failed");
                    last_error = error;
                }
            }
        }

        tracing::warn!(url, attempts = max_retries + 1, error = %last_error, "Fetch failed");
        FetchOutcome::Failed {
            error: last_error,
            attempts: max_retries + 1,
        }
    }

    async fn attempt(&self, url: &str, cookie: Option<&str>) -> Result<FetchedPage, String> {
        let mut request = self.client.get(url);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await.map_err(|e| classify_error(&e))?;
        let response = response.error_for_status().map_err(|e| classify_error(&e))?;

        let final_url = response.url().to_string();
        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| format!("Body read failed: {}", e))?
            .to_vec();

        Ok(FetchedPage {
            final_url,
            status_code,
            content_type,
            body,
        })
    }
}

fn classify_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else if let Some(status) = e.status() {
        format!("HTTP {}", status.as_u16())
    } else {
        e.to_string()
    }
}
