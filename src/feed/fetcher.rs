use std::time::Duration;

use futures::StreamExt;
use thiserror::Error;
use url::Url;

use crate::util::{validate_url, UrlValidationError};

const DEFAULT_MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while retrieving a feed over HTTP.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL was refused before any request was made
    #[error("Refused URL: {0}")]
    InvalidUrl(#[from] UrlValidationError),
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Server returned 429 Too Many Requests after max retries
    #[error("Rate limited after {0} retries")]
    RateLimited(u32),
    /// Response body exceeded the configured size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

/// Limits and retry behavior for feed retrieval.
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Per-request timeout
    pub timeout: Duration,
    /// Largest accepted response body, in bytes
    pub max_bytes: usize,
    /// Retries for 429, 5xx and truncated bodies
    pub max_retries: u32,
    /// First backoff delay; doubles on every retry
    pub retry_base_delay: Duration,
    /// Skip the loopback/private-network check
    pub allow_private_hosts: bool,
    pub user_agent: String,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_bytes: DEFAULT_MAX_FEED_SIZE,
            max_retries: 3,
            retry_base_delay: Duration::from_secs(2),
            allow_private_hosts: false,
            user_agent: concat!("feedset/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// HTTP collaborator that turns a feed URL into raw bytes.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    policy: FetchPolicy,
}

impl Fetcher {
    /// Builds a fetcher with its own HTTP client.
    pub fn new(policy: FetchPolicy) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(policy.user_agent.as_str())
            .build()?;
        Ok(Self { client, policy })
    }

    /// Builds a fetcher around an existing client (caller controls configuration).
    pub fn with_client(client: reqwest::Client, policy: FetchPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Retrieves the body at `url`.
    ///
    /// # Behavior
    ///
    /// - The URL is validated first (scheme, and private hosts unless allowed)
    /// - Each request is bounded by the policy timeout
    /// - HTTP 429 and 5xx trigger exponential backoff, up to `max_retries`
    /// - Other non-2xx statuses fail immediately
    /// - Bodies larger than `max_bytes` are rejected; truncated bodies are retried
    ///
    /// # Errors
    ///
    /// Any [`FetchError`] variant; nothing is recovered silently.
    pub async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let url = validate_url(url.as_str(), self.policy.allow_private_hosts)?;
        let mut retry_count = 0;

        loop {
            let request = self.client.get(url.clone()).send();
            let response = tokio::time::timeout(self.policy.timeout, request)
                .await
                .map_err(|_| FetchError::Timeout)?
                .map_err(FetchError::Network)?;

            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                if retry_count >= self.policy.max_retries {
                    return Err(FetchError::RateLimited(self.policy.max_retries));
                }
                let delay = self.backoff(retry_count);
                tracing::warn!(
                    feed = %url,
                    retry = retry_count,
                    delay_ms = delay.as_millis() as u64,
                    "Rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
                retry_count += 1;
                continue;
            }

            if status.is_server_error() {
                if retry_count >= self.policy.max_retries {
                    return Err(FetchError::HttpStatus(status.as_u16()));
                }
                let delay = self.backoff(retry_count);
                tracing::warn!(
                    feed = %url,
                    status = %status,
                    retry = retry_count,
                    delay_ms = delay.as_millis() as u64,
                    "Server error, retrying after delay"
                );
                tokio::time::sleep(delay).await;
                retry_count += 1;
                continue;
            }

            if !status.is_success() {
                return Err(FetchError::HttpStatus(status.as_u16()));
            }

            match read_limited_bytes(response, self.policy.max_bytes).await {
                Ok(bytes) => {
                    tracing::debug!(feed = %url, bytes = bytes.len(), "Fetched feed");
                    return Ok(bytes);
                }
                Err(FetchError::IncompleteResponse { expected, received }) => {
                    if retry_count >= self.policy.max_retries {
                        return Err(FetchError::IncompleteResponse { expected, received });
                    }
                    let delay = self.backoff(retry_count);
                    tracing::debug!(
                        feed = %url,
                        expected = expected,
                        received = received,
                        attempt = retry_count + 1,
                        "Retrying incomplete download"
                    );
                    tokio::time::sleep(delay).await;
                    retry_count += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn backoff(&self, retry_count: u32) -> Duration {
        self.policy
            .retry_base_delay
            .saturating_mul(2u32.saturating_pow(retry_count))
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
