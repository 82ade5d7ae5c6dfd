//! # Data Source Clients Module
//!
//! This module serves as the central hub for all dataset clients in the
//! `lib_ontario` project. Each submodule represents a client for a
//! particular Ontario environmental data source, handling the query
//! building and payload reshaping unique to that source.
//!
//! ## Purpose:
//! The primary role of the `sources` module is to abstract the differences
//! between remote APIs (REST pagination, WFS feature queries, ArcGIS layer
//! queries) behind small per-source clients. Every client owns a
//! [`crate::retrieve::SourceClient`] so pacing, retry and failure
//! classification behave identically across sources.
//!
//! ## Contained Modules:
//! - **`biodiversity`**: iNaturalist observations and eBird bird checklists.
//! - **`fire`**: CWFIS historical fire perimeters from the NBAC layer.
//! - **`protected_areas`**: Ontario GeoHub provincial parks and conservation
//!   authority boundaries.
//!
//! This file also re-exports the primary structs (e.g. `INaturalistClient`,
//! `CwfisClient`) to provide a clean public API for other parts of the
//! application, allowing them to be easily accessed via
//! `lib_ontario::sources::...`.

#![doc(html_logo_url = "https://example.com/logo.png")] // Placeholder
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// iNaturalist and eBird biodiversity observation clients.
pub mod biodiversity;
/// The CWFIS historical fire perimeter client.
pub mod fire;
/// The Ontario GeoHub protected areas client.
pub mod protected_areas;

// --- Public API Re-exports ---
// Make the primary client structs directly accessible under the `sources` namespace.
pub use biodiversity::{EBirdClient, INaturalistClient, ObservationQuery};
pub use fire::{CwfisClient, FireScope};
pub use protected_areas::GeoHubClient;
