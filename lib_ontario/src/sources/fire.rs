//! # Fire Data Source Client
//!
//! Client for the Canadian Wildland Fire Information System (CWFIS)
//! geoserver, covering historical fire perimeters from the National Burned
//! Area Composite (NBAC) layer.
//!
//! ## Purpose:
//! The NBAC layer spans 1972-2024 in a single WFS feature type, so perimeter
//! queries are partitioned by year and the results aggregated. Year and
//! spatial filters are combined in one CQL filter because the WFS `bbox`
//! parameter and `CQL_FILTER` are mutually exclusive.

#![doc(html_logo_url = "https://example.com/logo.png")] // Placeholder
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::retrieve::{
    ConfigurationError, DataSourceError, HttpEndpoint, RateLimited, SourceClient,
    SourceClientOptions,
};
use crate::utils::geometry::BoundingBox;

/// CWFIS public geoserver root; the WFS endpoint lives under it.
const CWFIS_BASE_URL: &str = "https://cwfis.cfs.nrcan.gc.ca/geoserver/public";

/// # Fire Query Scope
///
/// The spatial restriction of a fire perimeter query. Province-wide queries
/// should prefer [`FireScope::Province`]: the NBAC geometry is stored in
/// EPSG:3978 and the administrative filter sidesteps CRS mismatches that a
/// degree-based bounding box can hit.
#[derive(Debug, Clone)]
pub enum FireScope {
    /// A two-letter province code such as `ON` or `BC`.
    Province(String),
    /// An explicit bounding box in EPSG:4326 degrees.
    Bounds(BoundingBox),
}

impl FireScope {
    /// Renders the scope as a CQL predicate.
    pub fn to_cql(&self) -> String {
        match self {
            FireScope::Province(code) => format!("admin_area='{}'", code),
            FireScope::Bounds(bounds) => bounds.to_cql_bbox(),
        }
    }
}

/// # CWFIS Client
///
/// Fetches historical fire perimeters over the CWFIS WFS service. No API
/// key is required.
pub struct CwfisClient {
    /// The rate-limited, retrying executor owned by this source.
    client: SourceClient,
    /// The CWFIS geoserver endpoint.
    endpoint: HttpEndpoint,
}

impl CwfisClient {
    /// Creates a client against the public geoserver with default pacing.
    pub fn new() -> Result<Self, ConfigurationError> {
        Self::with_options(SourceClientOptions::default())
    }

    /// Creates a client with full pacing and retry options.
    pub fn with_options(options: SourceClientOptions) -> Result<Self, ConfigurationError> {
        Self::with_base_url(CWFIS_BASE_URL, options)
    }

    /// Creates a client against an alternate geoserver root.
    pub fn with_base_url(
        base_url: &str,
        options: SourceClientOptions,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            client: SourceClient::new(options)?,
            endpoint: HttpEndpoint::new(base_url)?,
        })
    }

    /// Fetches NBAC fire perimeters for a span of years.
    ///
    /// One WFS request is issued per year and the returned GeoJSON features
    /// are aggregated. A failed year aborts the whole fetch; partial results
    /// are never returned.
    ///
    /// # Arguments
    /// * `scope` - Spatial restriction of the query.
    /// * `start_year` - First year to fetch, inclusive.
    /// * `end_year` - Last year to fetch, inclusive.
    ///
    /// # Returns
    /// The GeoJSON feature objects of every fire perimeter found.
    pub async fn get_fire_perimeters(
        &self,
        scope: &FireScope,
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<Value>, DataSourceError> {
        info!("Fetching fire perimeters ({}-{})", start_year, end_year);

        let spatial_filter = scope.to_cql();
        let mut all_perimeters: Vec<Value> = Vec::new();

        for year in start_year..=end_year {
            info!("Fetching fire perimeters for {}", year);
            let cql_filter = format!("year={} AND {}", year, spatial_filter);
            let params = vec![
                ("service", "WFS".to_string()),
                ("version", "2.0.0".to_string()),
                ("request", "GetFeature".to_string()),
                ("typeName", "public:nbac".to_string()),
                ("outputFormat", "application/json".to_string()),
                ("srsName", "EPSG:4326".to_string()),
                ("CQL_FILTER", cql_filter),
            ];

            let payload = self
                .client
                .execute_with_retry(|| self.endpoint.get_json("wfs", &params))
                .await?;

            match payload.get("features").and_then(Value::as_array) {
                Some(features) if features.is_empty() => {
                    info!("No fires found in area of interest for {}", year);
                }
                Some(features) => {
                    info!("Found {} fire perimeters for {}", features.len(), year);
                    all_perimeters.extend(features.iter().cloned());
                }
                None => {
                    warn!("No feature collection in response for {}", year);
                }
            }
        }

        if all_perimeters.is_empty() {
            warn!("No fire perimeter data downloaded");
        } else {
            info!("Total fire perimeters: {}", all_perimeters.len());
        }
        Ok(all_perimeters)
    }

    /// Fetches fire perimeters and reshapes each into the standardized
    /// format.
    pub async fn fetch_standardized(
        &self,
        scope: &FireScope,
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<Value>, DataSourceError> {
        let perimeters = self.get_fire_perimeters(scope, start_year, end_year).await?;
        Ok(perimeters
            .iter()
            .map(|feature| Self::standardize_feature(feature, start_year))
            .collect())
    }

    /// Reshapes a GeoJSON fire perimeter feature into the standardized
    /// format.
    ///
    /// # Arguments
    /// * `feature` - One GeoJSON feature from the NBAC layer.
    /// * `fallback_year` - Year recorded when the feature has none.
    pub fn standardize_feature(feature: &Value, fallback_year: i32) -> Value {
        let props = feature.get("properties").cloned().unwrap_or_else(|| json!({}));
        let year = props.get("year").and_then(Value::as_i64);

        let fire_id = props
            .get("FIRE_ID")
            .cloned()
            .unwrap_or_else(|| json!(year.map(|y| y.to_string()).unwrap_or_default()));

        json!({
            "fire_id": fire_id,
            "fire_year": year.unwrap_or(fallback_year as i64),
            "area_hectares": props.get("AREA_HA").cloned().unwrap_or(Value::Null),
            "cause": props.get("CAUSE").cloned().unwrap_or(json!("")),
            "geometry": feature.get("geometry").cloned().unwrap_or(Value::Null),
            "data_source": "CWFIS/NBAC",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    fn spawn_server(responses: Vec<String>) -> (String, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to random port");
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{}", port);

        let handle = thread::spawn(move || {
            let mut heads = Vec::new();
            for response in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                loop {
                    let n = stream.read(&mut chunk).unwrap();
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                    if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                heads.push(String::from_utf8_lossy(&buf).to_string());
                stream.write_all(response.as_bytes()).unwrap();
                stream.flush().unwrap();
            }
            heads
        });
        (url, handle)
    }

    fn json_response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        )
    }

    fn feature_collection(count: usize, year: i32) -> String {
        let features: Vec<Value> = (0..count)
            .map(|i| {
                json!({
                    "type": "Feature",
                    "properties": {"year": year, "FIRE_ID": format!("{}-{}", year, i)},
                    "geometry": {"type": "Polygon", "coordinates": []}
                })
            })
            .collect();
        json!({"type": "FeatureCollection", "features": features}).to_string()
    }

    fn fast_options() -> SourceClientOptions {
        SourceClientOptions {
            rate_limit: 60_000,
            base_backoff: Duration::from_millis(5),
            ..SourceClientOptions::default()
        }
    }

    #[tokio::test]
    async fn test_perimeters_aggregate_across_years() {
        let (url, handle) = spawn_server(vec![
            json_response("200 OK", &feature_collection(2, 2020)),
            json_response("200 OK", &feature_collection(1, 2021)),
        ]);
        let client = CwfisClient::with_base_url(&url, fast_options()).unwrap();
        let scope = FireScope::Province("ON".to_string());

        let perimeters = client.get_fire_perimeters(&scope, 2020, 2021).await.unwrap();
        let heads = handle.join().unwrap();

        assert_eq!(perimeters.len(), 3);
        assert_eq!(heads.len(), 2);
        assert!(heads[0].contains("service=WFS"));
        assert!(heads[0].contains("request=GetFeature"));
        assert!(heads[0].contains("typeName=public%3Anbac"));
        // The year and province filters travel in one CQL expression.
        assert!(heads[0].contains("year%3D2020+AND+admin_area%3D%27ON%27"));
        assert!(heads[1].contains("year%3D2021+AND+admin_area%3D%27ON%27"));
    }

    #[tokio::test]
    async fn test_empty_years_produce_empty_aggregate() {
        let (url, handle) = spawn_server(vec![
            json_response("200 OK", &feature_collection(0, 2020)),
            json_response("200 OK", &feature_collection(0, 2021)),
        ]);
        let client = CwfisClient::with_base_url(&url, fast_options()).unwrap();
        let scope = FireScope::Bounds(BoundingBox::new(44.0, -79.0, 45.0, -78.0));

        let perimeters = client.get_fire_perimeters(&scope, 2020, 2021).await.unwrap();
        let heads = handle.join().unwrap();

        assert!(perimeters.is_empty());
        assert_eq!(heads.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_year_aborts_the_fetch() {
        let (url, handle) = spawn_server(vec![
            json_response("200 OK", &feature_collection(2, 2020)),
            json_response("500 Internal Server Error", "{}"),
        ]);
        let options = SourceClientOptions {
            max_retries: 0,
            ..fast_options()
        };
        let client = CwfisClient::with_base_url(&url, options).unwrap();
        let scope = FireScope::Province("ON".to_string());

        let err = client.get_fire_perimeters(&scope, 2020, 2021).await.unwrap_err();
        let heads = handle.join().unwrap();

        assert_eq!(err.attempts_made(), 1);
        assert_eq!(heads.len(), 2);
    }

    #[test]
    fn test_scope_renders_cql() {
        let province = FireScope::Province("ON".to_string());
        assert_eq!(province.to_cql(), "admin_area='ON'");

        let bounds = FireScope::Bounds(BoundingBox::new(44.0, -79.0, 45.0, -78.0));
        assert_eq!(bounds.to_cql(), "BBOX(geometry,-79,44,-78,45)");
    }

    #[test]
    fn test_standardize_feature() {
        let feature = json!({
            "type": "Feature",
            "properties": {"year": 2021, "FIRE_ID": "2021-7", "AREA_HA": 152.3, "CAUSE": "L"},
            "geometry": {"type": "Polygon", "coordinates": []}
        });
        let standardized = CwfisClient::standardize_feature(&feature, 2020);

        assert_eq!(standardized["fire_id"], "2021-7");
        assert_eq!(standardized["fire_year"], 2021);
        assert_eq!(standardized["area_hectares"], 152.3);
        assert_eq!(standardized["cause"], "L");
        assert_eq!(standardized["data_source"], "CWFIS/NBAC");
    }

    #[test]
    fn test_standardize_feature_defaults() {
        let feature = json!({"type": "Feature", "properties": {}});
        let standardized = CwfisClient::standardize_feature(&feature, 2019);

        assert_eq!(standardized["fire_id"], "");
        assert_eq!(standardized["fire_year"], 2019);
        assert_eq!(standardized["area_hectares"], Value::Null);
        assert_eq!(standardized["cause"], "");
        assert_eq!(standardized["geometry"], Value::Null);
    }
}
