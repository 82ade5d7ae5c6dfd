//! # HTTP Endpoint Wrapper
//!
//! A thin asynchronous wrapper around `reqwest` for one remote API. It owns
//! the base URL, default headers and the request timeout, and it translates
//! every failure into a classified [`TransportError`]. Retry and pacing do
//! not live here; the endpoint performs exactly one network call per
//! invocation so the retry loop upstairs can count attempts.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::Client;
use serde_json::Value;
use url::Url;

use super::error::{ConfigurationError, TransportError};
use super::retry::parse_retry_after;

/// Default per-request timeout, matching the remote APIs' slower endpoints.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error bodies are truncated to this many bytes in error messages.
const ERROR_BODY_LIMIT: usize = 200;

/// One remote API endpoint with its base URL, headers and timeout.
#[derive(Debug)]
pub struct HttpEndpoint {
    /// The underlying HTTP client.
    inner: Client,
    /// The base URL to which all relative paths are joined.
    base_url: Url,
}

impl HttpEndpoint {
    /// Creates an endpoint with the default timeout and no extra headers.
    ///
    /// # Errors
    /// Returns [`ConfigurationError::InvalidBaseUrl`] when `base_url` is not
    /// an absolute URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigurationError> {
        Self::with_headers(base_url, DEFAULT_TIMEOUT, HeaderMap::new())
    }

    /// Creates an endpoint with a custom request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ConfigurationError> {
        Self::with_headers(base_url, timeout, HeaderMap::new())
    }

    /// Creates an endpoint that sends an API key header on every request.
    ///
    /// `header` must be a static lowercase header name such as
    /// `"x-ebirdapitoken"`.
    pub fn with_api_key(
        base_url: &str,
        timeout: Duration,
        header: &'static str,
        key: &str,
    ) -> Result<Self, ConfigurationError> {
        let mut headers = HeaderMap::new();
        let value =
            HeaderValue::from_str(key).map_err(|_| ConfigurationError::InvalidHeader(header))?;
        headers.insert(HeaderName::from_static(header), value);
        Self::with_headers(base_url, timeout, headers)
    }

    /// The fully configurable constructor the others delegate to.
    pub fn with_headers(
        base_url: &str,
        timeout: Duration,
        headers: HeaderMap,
    ) -> Result<Self, ConfigurationError> {
        // 1. Normalize the base so relative paths append instead of
        //    replacing the last segment.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let url = Url::parse(&normalized)
            .map_err(|e| ConfigurationError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;

        // 2. Build the client with the timeout and default headers baked in.
        let inner = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigurationError::HttpClient(e.to_string()))?;

        Ok(Self {
            inner,
            base_url: url,
        })
    }

    /// The normalized base URL requests are joined against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Performs one GET request and decodes the JSON body.
    ///
    /// Non-2xx statuses become [`TransportError::Status`] carrying the
    /// numeric code, a body excerpt and any `Retry-After` hint; local
    /// failures are classified by [`TransportError::from_reqwest`].
    pub async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, TransportError> {
        // 1. Construct the full URL. A bad path can never succeed, so it is
        //    a malformed request rather than a transient failure.
        let url = self
            .base_url
            .join(path)
            .map_err(|e| TransportError::Malformed(format!("invalid path {:?}: {}", path, e)))?;

        // 2. Dispatch exactly one request.
        let response = self
            .inner
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(TransportError::from_reqwest)?;

        // 3. Capture the status and any Retry-After hint before consuming
        //    the body.
        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(parse_retry_after);
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: excerpt(&body),
                retry_after,
            });
        }

        // 4. Decode the payload.
        response
            .json::<Value>()
            .await
            .map_err(TransportError::from_reqwest)
    }
}

/// Clips an error body for inclusion in error messages and logs.
fn excerpt(body: &str) -> String {
    if body.len() <= ERROR_BODY_LIMIT {
        body.to_string()
    } else {
        let mut end = ERROR_BODY_LIMIT;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    }
}
