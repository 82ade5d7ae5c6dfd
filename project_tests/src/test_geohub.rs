//! # GeoHub Client Integration Tests
//!
//! This module contains integration tests for
//! `lib_ontario::sources::protected_areas::GeoHubClient` against the live
//! LIO ArcGIS services. Queries are restricted to the Williams Treaty
//! bounds to keep the extracts small.
//!
//! ## Purpose:
//! The primary goal of these tests is to ensure that the envelope filter,
//! the layer paths and the standardized park records behave against the
//! real service.
//!
//! These tests are executed asynchronously using `tokio::main`.

#![doc(html_logo_url = "https://example.com/logo.png")] // Placeholder for consistency
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use anyhow::Result;
use serde::Deserialize;

use lib_ontario::sources::protected_areas::GeoHubClient;
use lib_ontario::utils::geometry::BoundingBox;

/// # Park Summary Model
///
/// A utility struct to deserialize the standardized park properties,
/// verifying that downstream consumers can rely on the common schema.
#[derive(Debug, Deserialize)]
struct ParkSummary {
    /// The park's display name.
    name: Option<String>,
    /// Who manages the park.
    managing_authority: Option<String>,
}

/// # Main Test Function
///
/// Executes a series of integration tests for the `GeoHubClient` against
/// the live LIO ArcGIS services.
#[tokio::main]
async fn main() -> Result<()> {
    println!("--- Starting GeoHub Module Tests ---");

    // 1. Build the client with default pacing; GeoHub requests already run
    //    with the long layer-extract timeout.
    let client = GeoHubClient::new()?;
    let bounds = BoundingBox::WILLIAMS_TREATY;

    // --- TEST 1: Bounded Provincial Parks ---
    println!("\n[Test 1] Testing bounded provincial parks fetch...");
    let parks = client.get_provincial_parks(Some(&bounds)).await?;
    println!("✅ Fetched {} parks within the Williams Treaty bounds", parks.len());

    // --- TEST 2: Standardized Park Schema ---
    // The standardized properties must deserialize into the summary model.
    println!("\n[Test 2] Testing standardized park schema...");
    if let Some(first) = parks.first() {
        let standardized = GeoHubClient::standardize_park(first);
        let summary: ParkSummary = serde_json::from_value(standardized["properties"].clone())?;
        println!(
            "✅ First park: {:?} managed by {:?}",
            summary.name, summary.managing_authority
        );
    } else {
        println!("✅ No parks in bounds; nothing to standardize");
    }

    // --- TEST 3: Conservation Authorities ---
    println!("\n[Test 3] Testing conservation authorities fetch...");
    let authorities = client.get_conservation_authorities(Some(&bounds)).await?;
    println!(
        "✅ Fetched {} conservation authority boundaries",
        authorities.len()
    );

    println!("\n--- All GeoHub tests passed ---");
    Ok(())
}
