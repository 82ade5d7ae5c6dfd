//! # Utilities Module
//!
//! This module serves as a collection point for general-purpose helpers that
//! are widely applicable across the `lib_ontario` crate.
//!
//! ## Purpose:
//! The goal is to consolidate common, reusable logic that doesn't belong to a
//! specific dataset client. This promotes code reuse and helps maintain a
//! cleaner structure for the specialized components.
//!
//! ## Contained Modules:
//!
//! - **`geometry`**: Bounding-box extraction from GeoJSON areas of interest,
//!   point-in-bounds checks and spatial filtering of observation records.

#![doc(html_logo_url = "https://example.com/logo.png")] // Placeholder
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Bounding boxes, GeoJSON extraction and spatial filtering helpers.
pub mod geometry;

// --- Public API Re-exports ---
pub use geometry::{BoundingBox, GeometryError};
