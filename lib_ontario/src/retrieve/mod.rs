//! # Data Retrieval Module
//!
//! This module is the networking core of the `lib_ontario` project. Every
//! remote dataset client in the crate is built out of the pieces defined
//! here rather than talking to `reqwest` directly.
//!
//! ## Purpose:
//! The goal of the `retrieve` module is to offer a consistent and robust way
//! to fetch data from external services, encapsulating common concerns such
//! as request pacing, retry with exponential backoff, failure classification,
//! and HTTP request building. This prevents duplication of networking logic
//! across the dataset clients.
//!
//! ## Contained Modules:
//!
//! - **`pacing`**: The [`pacing::RateBudget`] interval tracker that spaces
//!   request dispatches to honor per-source rate limits.
//! - **`retry`**: The [`retry::RetryPolicy`] exponential backoff schedule
//!   and the `Retry-After` header parser.
//! - **`error`**: The transport, configuration and public error types, plus
//!   the per-attempt outcome classification.
//! - **`client`**: The [`client::SourceClient`] that composes pacing and
//!   retry into a single rate-limited, retrying executor.
//! - **`http`**: The [`http::HttpEndpoint`] wrapper around `reqwest` that
//!   performs exactly one classified request per call.
//!
//! By using the components within this module, the dataset clients can focus
//! on query building and payload handling, delegating the complexities of
//! network communication to this well-tested and resilient layer.

#![doc(html_logo_url = "https://example.com/logo.png")] // Placeholder
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// The rate-limited, retrying request executor and its options.
pub mod client;
/// Transport, configuration and public error types with outcome classification.
pub mod error;
/// A thin `reqwest` wrapper performing one classified request per call.
pub mod http;
/// Fixed-interval dispatch pacing for per-source rate limits.
pub mod pacing;
/// Exponential backoff schedules and `Retry-After` parsing.
pub mod retry;

// --- Public API Re-exports ---
// Make the primary types directly accessible under the `retrieve` namespace.
pub use client::{RateLimited, SourceClient, SourceClientOptions};
pub use error::{ConfigurationError, DataSourceError, RequestOutcome, TransportError};
pub use http::HttpEndpoint;
pub use pacing::RateBudget;
pub use retry::{parse_retry_after, RetryPolicy};
