//! Upstream Client Module
//!
//! Issues GET requests against the upstream API with a per-attempt timeout and
//! retries on transient failures. Terminal failures come back as synthetic
//! results, never as errors.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{ProxyError, Result};
use crate::upstream::{Payload, QueryParams, RetryPolicy, UpstreamResult};

// == Upstream Client ==
/// HTTP client bound to the upstream base URL.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: Client,
    base_url: String,
    policy: RetryPolicy,
}

impl UpstreamClient {
    // == Constructor ==
    /// Creates a client for `base_url` with the given per-attempt timeout.
    ///
    /// A server-requested `Retry-After` wait never exceeds `timeout`.
    pub fn new(base_url: &str, timeout: Duration, policy: RetryPolicy) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProxyError::Internal(format!("failed to build HTTP client: {e}")))?;
        let retry_after_cap = timeout.min(policy.max_retry_after);

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            policy: policy.with_max_retry_after(retry_after_cap),
        })
    }

    /// Creates a client from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.base_url,
            config.request_timeout,
            RetryPolicy::new(config.retry_attempts, config.retry_backoff),
        )
    }

    /// Target URL for `path`, leading slashes stripped.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // == Fetch ==
    /// Fetches `path` with `params` as the query string.
    ///
    /// Retries transparently per the policy. On success the body is parsed as
    /// JSON when possible and returned as raw text otherwise. On failure a
    /// synthetic result carrying the error's status and body is returned.
    pub async fn fetch(&self, path: &str, params: &QueryParams) -> UpstreamResult {
        let url = self.url_for(path);
        info!(url = %url, ?params, "Forwarding request upstream");

        match self.fetch_with_retry(&url, params).await {
            Ok(result) => result,
            Err(err) => {
                error!(url = %url, error = %err, "Upstream request failed");
                UpstreamResult::from_error(&err)
            }
        }
    }

    async fn fetch_with_retry(&self, url: &str, params: &QueryParams) -> Result<UpstreamResult> {
        let mut attempt = 1;

        loop {
            let retry_after = match self.http.get(url).query(params).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body = response.text().await.map_err(|e| {
                            ProxyError::Upstream(format!("failed to read response body: {e}"))
                        })?;
                        return Ok(UpstreamResult::success(
                            status.as_u16(),
                            Payload::from_body(body),
                        ));
                    }

                    if !self.policy.is_retryable_status(status.as_u16()) {
                        return Err(http_error(status, response).await);
                    }
                    if !self.policy.has_attempts_left(attempt) {
                        return Err(ProxyError::Upstream(format!(
                            "upstream returned {status} after {attempt} attempts"
                        )));
                    }

                    warn!(url = %url, %status, attempt, "Transient upstream status, retrying");
                    self.policy.retry_after(status.as_u16(), response.headers())
                }
                Err(err) => {
                    if err.is_builder() || !self.policy.has_attempts_left(attempt) {
                        return Err(ProxyError::Upstream(err.to_string()));
                    }

                    warn!(url = %url, error = %err, attempt, "Upstream request failed, retrying");
                    None
                }
            };

            tokio::time::sleep(self.policy.next_delay(attempt, retry_after)).await;
            attempt += 1;
        }
    }
}

/// Converts a non-retryable status into an error carrying upstream's body.
async fn http_error(status: StatusCode, response: reqwest::Response) -> ProxyError {
    let detail = match response.text().await {
        Ok(body) => Payload::from_body(body).into_value(),
        Err(e) => serde_json::Value::String(e.to_string()),
    };

    ProxyError::UpstreamHttp {
        status: status.as_u16(),
        detail,
    }
}
