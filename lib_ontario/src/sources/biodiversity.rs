//! # Biodiversity Data Source Clients
//!
//! This module defines the clients for Ontario biodiversity observations:
//! iNaturalist (community science observations, no API key required) and
//! eBird (bird checklists, free API key required).
//!
//! ## Key Features:
//! - **Rate-Limited Fetching**: Every request goes through an owned
//!   [`SourceClient`], so pacing, retry and failure classification are
//!   handled in one place and never duplicated here.
//! - **Cursor Pagination**: `get_observations` walks the iNaturalist result
//!   pages until the requested maximum is reached, the server returns a
//!   short page, or a page comes back empty.
//! - **Query Builder**: [`ObservationQuery`] collects bounds, date range and
//!   quality filters and renders them into API parameters, clamping
//!   `per_page` to the documented server maximum.
//! - **Standardized Records**: Both clients can reshape raw payloads into a
//!   common observation format with GeoJSON point locations, so downstream
//!   consumers never deal with source-specific field names.
//! - **Eager Credential Checks**: The eBird client refuses construction
//!   without an API key instead of failing on the first request.

#![doc(html_logo_url = "https://example.com/logo.png")] // Placeholder
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::retrieve::http::DEFAULT_TIMEOUT;
use crate::retrieve::{
    ConfigurationError, DataSourceError, HttpEndpoint, RateLimited, SourceClient,
    SourceClientOptions,
};
use crate::utils::geometry::BoundingBox;

/// iNaturalist API v1 root.
const INATURALIST_BASE_URL: &str = "https://api.inaturalist.org/v1";

/// eBird API 2.0 root.
const EBIRD_BASE_URL: &str = "https://api.ebird.org/v2";

/// Maximum page size accepted by the iNaturalist observations endpoint.
const INATURALIST_PAGE_LIMIT: u32 = 200;

/// # Observation Query
///
/// The filters applied to an iNaturalist observation fetch. Construct with
/// [`ObservationQuery::within`] for a bounded query or
/// [`ObservationQuery::province_wide`] for all of Ontario, then refine with
/// the builder methods; every filter has a sensible default.
#[derive(Debug, Clone)]
pub struct ObservationQuery {
    bounds: Option<BoundingBox>,
    start_date: Option<String>,
    end_date: Option<String>,
    quality_grade: String,
    per_page: u32,
    max_results: usize,
}

impl ObservationQuery {
    /// Starts a query for observations within the given bounds.
    ///
    /// Defaults: research-grade observations only, pages of 200, at most
    /// 1000 results, no date restriction.
    pub fn within(bounds: BoundingBox) -> Self {
        Self {
            bounds: Some(bounds),
            start_date: None,
            end_date: None,
            quality_grade: "research".to_string(),
            per_page: INATURALIST_PAGE_LIMIT,
            max_results: 1000,
        }
    }

    /// Starts a province-wide query, filtered by the Ontario place id
    /// instead of a bounding box. Same defaults as [`ObservationQuery::within`].
    pub fn province_wide() -> Self {
        Self {
            bounds: None,
            start_date: None,
            end_date: None,
            quality_grade: "research".to_string(),
            per_page: INATURALIST_PAGE_LIMIT,
            max_results: 1000,
        }
    }

    /// Restricts the query to observations on or after this `YYYY-MM-DD` date.
    pub fn start_date(mut self, date: &str) -> Self {
        self.start_date = Some(date.to_string());
        self
    }

    /// Restricts the query to observations on or before this `YYYY-MM-DD` date.
    pub fn end_date(mut self, date: &str) -> Self {
        self.end_date = Some(date.to_string());
        self
    }

    /// Sets the quality filter: `"research"`, `"needs_id"` or `"casual"`.
    pub fn quality_grade(mut self, grade: &str) -> Self {
        self.quality_grade = grade.to_string();
        self
    }

    /// Sets the page size, clamped to 1..=200 (the server maximum).
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.clamp(1, INATURALIST_PAGE_LIMIT);
        self
    }

    /// Sets the maximum total number of observations to fetch.
    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Renders the query into API parameters for one result page.
    ///
    /// A query without bounds filters by the Ontario place id instead.
    fn to_params(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut params = match &self.bounds {
            Some(bounds) => vec![
                ("swlat", bounds.swlat.to_string()),
                ("swlng", bounds.swlng.to_string()),
                ("nelat", bounds.nelat.to_string()),
                ("nelng", bounds.nelng.to_string()),
            ],
            None => vec![(
                "place_id",
                INaturalistClient::ONTARIO_PLACE_ID.to_string(),
            )],
        };
        params.extend([
            ("quality_grade", self.quality_grade.clone()),
            ("geo", "true".to_string()),
            ("photos", "true".to_string()),
            ("per_page", self.per_page.to_string()),
            ("page", page.to_string()),
        ]);
        if let Some(d1) = &self.start_date {
            params.push(("d1", d1.clone()));
        }
        if let Some(d2) = &self.end_date {
            params.push(("d2", d2.clone()));
        }
        params
    }
}

/// # iNaturalist Client
///
/// Client for the iNaturalist API v1, a community science platform with
/// millions of biodiversity observations. Ontario alone carries 100K+
/// research-grade observations. No API key is required; the public rate
/// limit is 60 requests per minute.
pub struct INaturalistClient {
    /// The rate-limited, retrying executor owned by this source.
    client: SourceClient,
    /// The iNaturalist API endpoint.
    endpoint: HttpEndpoint,
}

impl INaturalistClient {
    /// The iNaturalist place id for the province of Ontario.
    pub const ONTARIO_PLACE_ID: u64 = 6942;

    /// Creates a client against the public API with default pacing.
    pub fn new() -> Result<Self, ConfigurationError> {
        Self::with_options(SourceClientOptions::default())
    }

    /// Creates a client with a custom rate limit in requests per minute.
    pub fn with_rate_limit(rate_limit: u32) -> Result<Self, ConfigurationError> {
        Self::with_options(SourceClientOptions {
            rate_limit,
            ..SourceClientOptions::default()
        })
    }

    /// Creates a client with full pacing and retry options.
    pub fn with_options(options: SourceClientOptions) -> Result<Self, ConfigurationError> {
        Self::with_base_url(INATURALIST_BASE_URL, options)
    }

    /// Creates a client against an alternate API root.
    pub fn with_base_url(
        base_url: &str,
        options: SourceClientOptions,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            client: SourceClient::new(options)?,
            endpoint: HttpEndpoint::new(base_url)?,
        })
    }

    /// Fetches observations matching the query, walking result pages.
    ///
    /// Pagination stops when the requested maximum is reached, a page comes
    /// back empty, or a page is shorter than the page size. Any request
    /// failure aborts the whole fetch; partial results are never returned.
    ///
    /// # Arguments
    /// * `query` - Bounds, date range and quality filters.
    ///
    /// # Returns
    /// The raw observation records, truncated to the query maximum.
    pub async fn get_observations(
        &self,
        query: &ObservationQuery,
    ) -> Result<Vec<Value>, DataSourceError> {
        let mut all_observations: Vec<Value> = Vec::new();
        let mut page: u32 = 1;

        while all_observations.len() < query.max_results {
            let params = query.to_params(page);
            let payload = self
                .client
                .execute_with_retry(|| self.endpoint.get_json("observations", &params))
                .await?;

            let results = payload
                .get("results")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            if results.is_empty() {
                break;
            }

            let page_len = results.len();
            all_observations.extend(results);

            // A short page means the server has no further results.
            if page_len < query.per_page as usize {
                break;
            }
            page += 1;
        }

        all_observations.truncate(query.max_results);
        info!(
            "Fetched {} iNaturalist observations",
            all_observations.len()
        );
        Ok(all_observations)
    }

    /// Fetches observations and reshapes each into the standardized format.
    pub async fn fetch_standardized(
        &self,
        query: &ObservationQuery,
    ) -> Result<Vec<Value>, DataSourceError> {
        let observations = self.get_observations(query).await?;
        Ok(observations
            .iter()
            .map(Self::standardize_observation)
            .collect())
    }

    /// Reshapes a raw iNaturalist observation into the standardized format.
    ///
    /// The iNaturalist `location` field is a `"lat,lng"` string; it becomes
    /// a GeoJSON point in `[longitude, latitude]` order. Records missing a
    /// parseable location get a null location.
    pub fn standardize_observation(obs: &Value) -> Value {
        let taxon = obs.get("taxon").cloned().unwrap_or_else(|| json!({}));
        let id = obs.get("id").cloned().unwrap_or(Value::Null);

        let location = obs
            .get("location")
            .and_then(Value::as_str)
            .and_then(|loc| {
                let mut parts = loc.splitn(2, ',');
                let lat: f64 = parts.next()?.trim().parse().ok()?;
                let lng: f64 = parts.next()?.trim().parse().ok()?;
                Some(json!({"type": "Point", "coordinates": [lng, lat]}))
            })
            .unwrap_or(Value::Null);

        let photos: Vec<Value> = obs
            .get("photos")
            .and_then(Value::as_array)
            .map(|photos| {
                photos
                    .iter()
                    .filter_map(|p| p.get("url").cloned())
                    .collect()
            })
            .unwrap_or_default();

        json!({
            "source": "iNaturalist",
            "observation_id": id.to_string(),
            "species_name": taxon.get("name").cloned().unwrap_or(Value::Null),
            "common_name": taxon.get("preferred_common_name").cloned().unwrap_or(json!("")),
            "scientific_name": taxon.get("name").cloned().unwrap_or(Value::Null),
            "taxonomy": {
                "rank": taxon.get("rank").cloned().unwrap_or(Value::Null),
                "iconic_taxon": taxon.get("iconic_taxon_name").cloned().unwrap_or(Value::Null),
                "taxon_id": taxon.get("id").cloned().unwrap_or(Value::Null),
            },
            "observation_date": obs.get("observed_on").cloned().unwrap_or(Value::Null),
            "observation_datetime": obs.get("time_observed_at").cloned().unwrap_or(Value::Null),
            "location": location,
            "accuracy_meters": obs.get("positional_accuracy").cloned().unwrap_or(Value::Null),
            "place_name": obs.get("place_guess").cloned().unwrap_or(Value::Null),
            "quality_grade": obs.get("quality_grade").cloned().unwrap_or(Value::Null),
            "license": obs.get("license").cloned().unwrap_or(Value::Null),
            "observer": obs.pointer("/user/login").cloned().unwrap_or(Value::Null),
            "photos": photos,
            "identifications_count": obs.get("identifications_count").cloned().unwrap_or(json!(0)),
            "url": format!("https://www.inaturalist.org/observations/{}", id),
        })
    }
}

/// # eBird Client
///
/// Client for the eBird API 2.0, a real-time online bird checklist program.
/// A free API key is required; requests carry it in the `x-ebirdapitoken`
/// header.
#[derive(Debug)]
pub struct EBirdClient {
    /// The rate-limited, retrying executor owned by this source.
    client: SourceClient,
    /// The eBird API endpoint with the key header baked in.
    endpoint: HttpEndpoint,
}

impl EBirdClient {
    /// The eBird region code for the province of Ontario.
    pub const ONTARIO_REGION: &'static str = "CA-ON";

    /// Longest supported lookback window in days.
    const MAX_BACK_DAYS: u32 = 30;

    /// Largest result count the recent-observations endpoint accepts.
    const MAX_RESULTS: u32 = 10_000;

    /// Creates a client with default pacing.
    ///
    /// # Errors
    /// Returns [`ConfigurationError::MissingApiKey`] when `api_key` is
    /// empty; no network activity happens before this check.
    pub fn new(api_key: &str) -> Result<Self, ConfigurationError> {
        Self::with_options(api_key, SourceClientOptions::default())
    }

    /// Creates a client with full pacing and retry options.
    pub fn with_options(
        api_key: &str,
        options: SourceClientOptions,
    ) -> Result<Self, ConfigurationError> {
        Self::with_base_url(EBIRD_BASE_URL, api_key, options)
    }

    /// Creates a client against an alternate API root.
    pub fn with_base_url(
        base_url: &str,
        api_key: &str,
        options: SourceClientOptions,
    ) -> Result<Self, ConfigurationError> {
        if api_key.is_empty() {
            return Err(ConfigurationError::MissingApiKey("eBird"));
        }
        Ok(Self {
            client: SourceClient::new(options)?,
            endpoint: HttpEndpoint::with_api_key(
                base_url,
                DEFAULT_TIMEOUT,
                "x-ebirdapitoken",
                api_key,
            )?,
        })
    }

    /// Fetches recent observations for a region.
    ///
    /// # Arguments
    /// * `region_code` - Regional code, defaulting to `CA-ON` for Ontario.
    /// * `back_days` - Lookback window in days, clamped to 30.
    /// * `max_results` - Result cap, clamped to 10000.
    ///
    /// # Returns
    /// The raw observation records. A payload that is not an array is
    /// treated as empty and logged.
    pub async fn get_recent_observations(
        &self,
        region_code: Option<&str>,
        back_days: u32,
        max_results: u32,
    ) -> Result<Vec<Value>, DataSourceError> {
        let region = region_code.unwrap_or(Self::ONTARIO_REGION);
        let path = format!("data/obs/{}/recent", region);
        let params = vec![
            ("back", back_days.min(Self::MAX_BACK_DAYS).to_string()),
            (
                "maxResults",
                max_results.min(Self::MAX_RESULTS).to_string(),
            ),
        ];

        let payload = self
            .client
            .execute_with_retry(|| self.endpoint.get_json(&path, &params))
            .await?;

        let observations = match payload.as_array() {
            Some(observations) => observations.clone(),
            None => {
                warn!("eBird payload was not an observation array");
                Vec::new()
            }
        };
        info!("Fetched {} eBird observations", observations.len());
        Ok(observations)
    }

    /// Fetches recent observations and reshapes each into the standardized
    /// format.
    pub async fn fetch_standardized(
        &self,
        region_code: Option<&str>,
        back_days: u32,
        max_results: u32,
    ) -> Result<Vec<Value>, DataSourceError> {
        let observations = self
            .get_recent_observations(region_code, back_days, max_results)
            .await?;
        Ok(observations
            .iter()
            .map(Self::standardize_observation)
            .collect())
    }

    /// Reshapes a raw eBird observation into the standardized format.
    pub fn standardize_observation(obs: &Value) -> Value {
        let sub_id = obs.get("subId").and_then(Value::as_str).unwrap_or_default();
        json!({
            "source": "eBird",
            "observation_id": sub_id,
            "species_code": obs.get("speciesCode").cloned().unwrap_or(Value::Null),
            "common_name": obs.get("comName").cloned().unwrap_or(Value::Null),
            "scientific_name": obs.get("sciName").cloned().unwrap_or(Value::Null),
            "observation_datetime": obs.get("obsDt").cloned().unwrap_or(Value::Null),
            "location": {
                "type": "Point",
                "coordinates": [
                    obs.get("lng").cloned().unwrap_or(Value::Null),
                    obs.get("lat").cloned().unwrap_or(Value::Null),
                ],
            },
            "location_name": obs.get("locName").cloned().unwrap_or(Value::Null),
            "location_id": obs.get("locId").cloned().unwrap_or(Value::Null),
            "count": obs.get("howMany").cloned().unwrap_or(Value::Null),
            "valid": obs.get("obsValid").cloned().unwrap_or(json!(true)),
            "reviewed": obs.get("obsReviewed").cloned().unwrap_or(json!(false)),
            "url": format!("https://ebird.org/checklist/{}", sub_id),
        })
    }
}
