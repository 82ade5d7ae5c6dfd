//! # CWFIS Client Integration Tests
//!
//! This module contains integration tests for
//! `lib_ontario::sources::fire::CwfisClient` against the live CWFIS
//! geoserver. The query is restricted to a single recent year for Ontario
//! so the WFS response stays small.
//!
//! ## Purpose:
//! The primary goal of these tests is to ensure that the CQL filter
//! construction, the per-year aggregation loop and the standardized fire
//! records behave against the real service.
//!
//! These tests are executed asynchronously using `tokio::main`.

#![doc(html_logo_url = "https://example.com/logo.png")] // Placeholder for consistency
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use anyhow::Result;
use chrono::{Datelike, Utc};

use lib_ontario::sources::fire::{CwfisClient, FireScope};
use lib_ontario::utils::geometry::BoundingBox;

/// # Main Test Function
///
/// Executes a series of integration tests for the `CwfisClient` against the
/// live CWFIS geoserver.
#[tokio::main]
async fn main() -> Result<()> {
    println!("--- Starting CWFIS Module Tests ---");

    // 1. Build the client with default pacing.
    let client = CwfisClient::new()?;

    // --- TEST 1: CQL Scope Rendering ---
    // Verifies both scope flavors render the predicates the geoserver
    // expects.
    println!("\n[Test 1] Testing CQL scope rendering...");
    let province = FireScope::Province("ON".to_string());
    assert_eq!(province.to_cql(), "admin_area='ON'");
    let bounds = FireScope::Bounds(BoundingBox::WILLIAMS_TREATY);
    println!("✅ Province scope: {}", province.to_cql());
    println!("✅ Bounds scope: {}", bounds.to_cql());

    // --- TEST 2: Single-Year Province Fetch ---
    // NBAC data trails the calendar, so the most recently completed fire
    // season is the newest year guaranteed to exist.
    let year = Utc::now().year() - 1;
    println!("\n[Test 2] Testing fire perimeter fetch for {}...", year);
    let perimeters = client.get_fire_perimeters(&province, year, year).await?;
    println!("✅ Fetched {} fire perimeters for Ontario", perimeters.len());

    // --- TEST 3: Standardized Records ---
    println!("\n[Test 3] Testing standardized records...");
    if let Some(first) = perimeters.first() {
        let standardized = CwfisClient::standardize_feature(first, year);
        assert_eq!(standardized["data_source"], "CWFIS/NBAC");
        println!(
            "✅ First fire: id {} burned {} ha",
            standardized["fire_id"], standardized["area_hectares"]
        );
    } else {
        println!("✅ No perimeters for {}; nothing to standardize", year);
    }

    println!("\n--- All CWFIS tests passed ---");
    Ok(())
}
