//! # Retrieval Error Taxonomy
//!
//! This module defines the failure types used by the rate-limited retrying
//! client. Transport problems are classified once per attempt into a
//! [`RequestOutcome`]; callers of the retry loop only ever observe a final
//! [`DataSourceError`].

use std::time::Duration;

use thiserror::Error;

/// Invalid construction arguments, detected eagerly before any network
/// activity. Fatal to the client instance being built.
#[derive(Debug, Error, Clone)]
pub enum ConfigurationError {
    /// The rate limit was zero; the throttle interval would be undefined.
    #[error("Rate limit must be greater than zero (got {0})")]
    InvalidRateLimit(u32),

    /// The base URL did not parse as an absolute URL.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// A required API key was empty, named by its data source.
    #[error("Missing API key for {0}")]
    MissingApiKey(&'static str),

    /// A credential could not be encoded into the named header.
    #[error("Invalid value for header {0}")]
    InvalidHeader(&'static str),

    /// The underlying HTTP client could not be built.
    #[error("HTTP client setup failed: {0}")]
    HttpClient(String),
}

/// A classified transport-level failure for a single attempt.
///
/// The variants capture the cause the way the remote (or the local stack)
/// reported it; [`TransportError::is_retryable`] encodes the retry rules.
#[derive(Debug, Error, Clone)]
pub enum TransportError {
    /// The request exceeded its deadline.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The connection could not be established or was reset.
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Another transport-level problem while sending or receiving.
    #[error("Transport error: {0}")]
    Io(String),

    /// The remote answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// The numeric HTTP status code.
        status: u16,
        /// An excerpt of the response body.
        body: String,
        /// Delay requested by the remote via the `Retry-After` header.
        retry_after: Option<Duration>,
    },

    /// The response arrived but its body could not be decoded.
    #[error("Response body could not be decoded: {0}")]
    Decode(String),

    /// The request itself was invalid and can never succeed.
    #[error("Malformed request: {0}")]
    Malformed(String),
}

impl TransportError {
    /// Builds a `TransportError` from a `reqwest` failure.
    ///
    /// Timeouts and connection problems are transient; builder and redirect
    /// problems mean the request itself is wrong and will never succeed.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_builder() || err.is_redirect() {
            Self::Malformed(err.to_string())
        } else {
            Self::Io(err.to_string())
        }
    }

    /// Whether the retry loop may re-attempt after this failure.
    ///
    /// Timeouts, connection problems and server-side statuses (5xx and 429)
    /// are transient. Client errors other than 429 and malformed requests
    /// are not. Undecodable bodies are treated as transient truncation.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Connect(_) | Self::Io(_) | Self::Decode(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Malformed(_) => false,
        }
    }

    /// The delay hint carried by the remote's `Retry-After` header, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Status { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// The classification of one attempt, consumed immediately by the retry
/// loop and never persisted.
#[derive(Debug)]
pub enum RequestOutcome<T> {
    /// The attempt produced a payload.
    Success(T),
    /// The attempt failed transiently; the loop may try again.
    RetryableFailure(TransportError),
    /// The attempt failed permanently; the loop must stop.
    FatalFailure(TransportError),
}

impl<T> RequestOutcome<T> {
    /// Sorts one attempt's result into success, retryable or fatal.
    pub fn classify(result: Result<T, TransportError>) -> Self {
        match result {
            Ok(payload) => Self::Success(payload),
            Err(cause) if cause.is_retryable() => Self::RetryableFailure(cause),
            Err(cause) => Self::FatalFailure(cause),
        }
    }
}

/// The only error callers of the retry loop ever see.
///
/// Wraps the final underlying cause and records how many attempts were
/// made before giving up.
#[derive(Debug, Error)]
pub enum DataSourceError {
    /// The retry budget ran out while the failure stayed retryable.
    #[error("Request failed after {attempts} attempts: {source}")]
    Exhausted {
        /// How many times the operation was invoked.
        attempts: u32,
        /// The last retryable failure observed.
        #[source]
        source: TransportError,
    },

    /// A non-retryable failure ended the call immediately.
    #[error("{source}")]
    Fatal {
        /// How many times the operation was invoked.
        attempts: u32,
        /// The failure that ended the call.
        #[source]
        source: TransportError,
    },
}

impl DataSourceError {
    /// How many times the operation was invoked before this error.
    pub fn attempts_made(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } | Self::Fatal { attempts, .. } => *attempts,
        }
    }

    /// The transport failure that ended the call.
    pub fn cause(&self) -> &TransportError {
        match self {
            Self::Exhausted { source, .. } | Self::Fatal { source, .. } => source,
        }
    }
}
