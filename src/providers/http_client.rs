//! Rate-Limited HTTP Client for external OCR and CDN APIs
//!
//! This module provides a rate-limited HTTP client wrapper that respects
//! upstream API quotas and handles retries with exponential backoff.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::{Client, RequestBuilder, Response};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Transport-level errors for outbound requests
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate limited, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },
}

/// Rate-limited HTTP client for API requests
///
/// Clones share the same limiter, so all handles count against one quota.
#[derive(Clone)]
pub struct RateLimitedClient {
    client: Client,
    limiter: Arc<DefaultDirectRateLimiter>,
    rate_limit_per_minute: u32,
    /// Remaining requests (from API response headers)
    remaining_requests: Arc<AtomicU32>,
}

impl RateLimitedClient {
    /// Create a new rate-limited client
    ///
    /// # Arguments
    /// * `rate_limit_per_minute` - Maximum requests allowed per minute
    /// * `timeout` - Per-request timeout
    pub fn new(rate_limit_per_minute: u32, timeout: Duration) -> Result<Self, ClientError> {
        // Ensure at least 1 request per minute
        let rate = NonZeroU32::new(rate_limit_per_minute).unwrap_or(nonzero!(1u32));
        let limiter = RateLimiter::direct(Quota::per_minute(rate));

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("ktp-ocr-api/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(RateLimitedClient {
            client,
            limiter: Arc::new(limiter),
            rate_limit_per_minute: rate.get(),
            remaining_requests: Arc::new(AtomicU32::new(rate.get())),
        })
    }

    /// Configured requests per minute
    pub fn rate_limit(&self) -> u32 {
        self.rate_limit_per_minute
    }

    /// Get remaining requests in current rate limit window
    pub fn remaining_requests(&self) -> Option<u32> {
        let remaining = self.remaining_requests.load(Ordering::Relaxed);
        if remaining > 0 {
            Some(remaining)
        } else {
            None
        }
    }

    /// Build a POST request
    pub fn post(&self, url: &str) -> RateLimitedRequestBuilder<'_> {
        RateLimitedRequestBuilder {
            client: self,
            builder: self.client.post(url),
        }
    }

    /// Wait for rate limit and execute request
    async fn execute(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        self.limiter.until_ready().await;

        debug!("Executing rate-limited request");

        let response = builder.send().await?;

        if let Some(remaining) = response
            .headers()
            .get("X-RateLimit-Remaining")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
        {
            self.remaining_requests.store(remaining, Ordering::Relaxed);
        }

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(60);

            warn!(retry_after_secs = retry_after, "Rate limited by upstream API");

            return Err(ClientError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        Ok(response)
    }

    /// Execute request with retries and exponential backoff
    ///
    /// Requests whose body cannot be cloned (streamed multipart) get a single attempt.
    pub async fn execute_with_retry(
        &self,
        builder: RequestBuilder,
        max_retries: u32,
    ) -> Result<Response, ClientError> {
        let mut backoff = Duration::from_millis(500);
        let mut attempt = 0;

        loop {
            let Some(request) = builder.try_clone() else {
                return self.execute(builder).await;
            };

            match self.execute(request).await {
                Ok(response) => return Ok(response),
                Err(e) if attempt >= max_retries => return Err(e),
                Err(ClientError::RateLimited { retry_after_secs }) => {
                    tokio::time::sleep(Duration::from_secs(retry_after_secs)).await;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Request attempt failed");
                }
            }

            attempt += 1;
            debug!(attempt, backoff_ms = backoff.as_millis() as u64, "Retrying request");
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(Duration::from_secs(30));
        }
    }
}

/// Request builder wrapper that enforces rate limiting
pub struct RateLimitedRequestBuilder<'a> {
    client: &'a RateLimitedClient,
    builder: RequestBuilder,
}

impl<'a> RateLimitedRequestBuilder<'a> {
    /// Add query parameters
    pub fn query<T: serde::Serialize + ?Sized>(mut self, query: &T) -> Self {
        self.builder = self.builder.query(query);
        self
    }

    /// Add JSON body to the request
    pub fn json<T: serde::Serialize + ?Sized>(mut self, json: &T) -> Self {
        self.builder = self.builder.json(json);
        self
    }

    /// Add a url-encoded form body
    pub fn form<T: serde::Serialize + ?Sized>(mut self, form: &T) -> Self {
        self.builder = self.builder.form(form);
        self
    }

    /// Add a multipart body
    pub fn multipart(mut self, form: reqwest::multipart::Form) -> Self {
        self.builder = self.builder.multipart(form);
        self
    }

    /// Add a bearer token header
    pub fn bearer_auth(mut self, token: &str) -> Self {
        self.builder = self.builder.bearer_auth(token);
        self
    }

    /// Send the request (waits for rate limit)
    pub async fn send(self) -> Result<Response, ClientError> {
        self.client.execute(self.builder).await
    }

    /// Send with retries
    pub async fn send_with_retry(self, max_retries: u32) -> Result<Response, ClientError> {
        self.client.execute_with_retry(self.builder, max_retries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_client_creation() {
        let client = RateLimitedClient::new(120, Duration::from_secs(5)).unwrap();
        assert_eq!(client.rate_limit(), 120);
        assert_eq!(client.remaining_requests(), Some(120));
    }

    #[test]
    fn test_zero_rate_is_clamped() {
        let client = RateLimitedClient::new(0, Duration::from_secs(5)).unwrap();
        assert_eq!(client.rate_limit(), 1);
    }

    #[test]
    fn test_clones_share_counters() {
        let client = RateLimitedClient::new(50, Duration::from_secs(5)).unwrap();
        let clone = client.clone();
        client.remaining_requests.store(7, Ordering::Relaxed);
        assert_eq!(clone.remaining_requests(), Some(7));
    }

    #[tokio::test]
    async fn test_retries_surface_the_last_transport_error() {
        let client = RateLimitedClient::new(60, Duration::from_secs(2)).unwrap();

        // Nothing listens on the discard port
        let err = client
            .post("http://127.0.0.1:9/")
            .json(&serde_json::json!({}))
            .send_with_retry(1)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Http(_)), "unexpected error: {err}");
    }
}
