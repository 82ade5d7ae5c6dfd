//! # Protected Areas Data Source Client
//!
//! Client for Ontario GeoHub / Land Information Ontario (LIO) ArcGIS
//! services, covering provincial parks, conservation reserves and
//! conservation authority boundaries.
//!
//! ## Purpose:
//! Both layers are queried through the standard ArcGIS `query` operation
//! with GeoJSON output. The services are slow for province-wide extracts,
//! so requests run with a five minute timeout instead of the library
//! default.

#![doc(html_logo_url = "https://example.com/logo.png")] // Placeholder
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use std::time::Duration;

use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::retrieve::{
    ConfigurationError, DataSourceError, HttpEndpoint, RateLimited, SourceClient,
    SourceClientOptions,
};
use crate::utils::geometry::BoundingBox;

/// LIO ArcGIS services root.
const GEOHUB_BASE_URL: &str = "https://ws.lioservices.lrc.gov.on.ca/arcgis1071a/rest/services";

/// Ontario Parks layer on the LIO Topographic MapServer.
const PARKS_PATH: &str = "LIO_Cartographic/LIO_Topographic/MapServer/9/query";

/// Conservation Authorities layer on the MOE MapServer.
const CONSERVATION_AUTHORITIES_PATH: &str = "MOE/Conservation_Authorities/MapServer/0/query";

/// Province-wide extracts routinely run for minutes.
const GEOHUB_TIMEOUT: Duration = Duration::from_secs(300);

/// Raw LIO property names and their standardized counterparts.
const PARK_PROPERTY_RENAMES: [(&str, &str); 8] = [
    ("PARK_NAME", "name"),
    ("OFFICIAL_NAME", "official_name"),
    ("ONT_PARK_ID", "park_id"),
    ("REGULATION", "designation"),
    ("AREA_HA", "hectares"),
    ("MANAGEMENT_UNIT", "managing_authority"),
    ("PARK_CLASS", "park_class"),
    ("ZONE_CLASS", "zone_class"),
];

/// # GeoHub Client
///
/// Fetches Ontario government geospatial layers. No API key is required.
pub struct GeoHubClient {
    /// The rate-limited, retrying executor owned by this source.
    client: SourceClient,
    /// The LIO ArcGIS endpoint.
    endpoint: HttpEndpoint,
}

impl GeoHubClient {
    /// Creates a client against the public services with default pacing.
    pub fn new() -> Result<Self, ConfigurationError> {
        Self::with_options(SourceClientOptions::default())
    }

    /// Creates a client with full pacing and retry options.
    pub fn with_options(options: SourceClientOptions) -> Result<Self, ConfigurationError> {
        Self::with_base_url(GEOHUB_BASE_URL, options)
    }

    /// Creates a client against an alternate services root.
    pub fn with_base_url(
        base_url: &str,
        options: SourceClientOptions,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            client: SourceClient::new(options)?,
            endpoint: HttpEndpoint::with_timeout(base_url, GEOHUB_TIMEOUT)?,
        })
    }

    /// Fetches Ontario provincial parks and conservation reserves.
    ///
    /// # Arguments
    /// * `bounds` - Optional bounding box; `None` fetches the whole layer.
    ///
    /// # Returns
    /// The GeoJSON feature objects of every park matched.
    pub async fn get_provincial_parks(
        &self,
        bounds: Option<&BoundingBox>,
    ) -> Result<Vec<Value>, DataSourceError> {
        info!("Fetching Ontario provincial parks from GeoHub");
        let features = self.query_layer(PARKS_PATH, bounds).await?;
        if features.is_empty() {
            warn!("No parks found");
        } else {
            info!("Fetched {} provincial parks", features.len());
        }
        Ok(features)
    }

    /// Fetches Conservation Authority boundaries.
    ///
    /// # Arguments
    /// * `bounds` - Optional bounding box; `None` fetches the whole layer.
    pub async fn get_conservation_authorities(
        &self,
        bounds: Option<&BoundingBox>,
    ) -> Result<Vec<Value>, DataSourceError> {
        info!("Fetching Conservation Authority boundaries from GeoHub");
        let features = self
            .query_layer(CONSERVATION_AUTHORITIES_PATH, bounds)
            .await?;
        if features.is_empty() {
            warn!("No conservation authorities found");
        } else {
            info!(
                "Fetched {} conservation authority boundaries",
                features.len()
            );
        }
        Ok(features)
    }

    /// Runs one ArcGIS query and unwraps the feature collection.
    async fn query_layer(
        &self,
        path: &str,
        bounds: Option<&BoundingBox>,
    ) -> Result<Vec<Value>, DataSourceError> {
        let params = Self::query_params(bounds);
        let payload = self
            .client
            .execute_with_retry(|| self.endpoint.get_json(path, &params))
            .await?;
        Ok(payload
            .get("features")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    /// Builds the ArcGIS query parameters, with the optional envelope filter.
    fn query_params(bounds: Option<&BoundingBox>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("where", "1=1".to_string()),
            ("outFields", "*".to_string()),
            ("f", "geojson".to_string()),
        ];
        if let Some(bounds) = bounds {
            params.push(("geometry", bounds.to_envelope()));
            params.push(("geometryType", "esriGeometryEnvelope".to_string()));
            params.push(("spatialRel", "esriSpatialRelIntersects".to_string()));
        }
        params
    }

    /// Reshapes a raw park feature into the standardized format.
    ///
    /// LIO property names are renamed to the common schema. When no `name`
    /// survives the renames, the first property whose key mentions "name"
    /// is promoted; designation and managing authority fall back to the
    /// provincial defaults.
    pub fn standardize_park(feature: &Value) -> Value {
        let raw = feature
            .get("properties")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let mut props = Map::new();

        for (old, new) in PARK_PROPERTY_RENAMES {
            if let Some(value) = raw.get(old) {
                props.insert(new.to_string(), value.clone());
            }
        }

        if !props.contains_key("name") {
            if let Some((_, value)) = raw.iter().find(|(key, _)| key.to_lowercase().contains("name"))
            {
                props.insert("name".to_string(), value.clone());
            }
        }
        if !props.contains_key("official_name") {
            if let Some(name) = props.get("name").cloned() {
                props.insert("official_name".to_string(), name);
            }
        }
        props
            .entry("designation")
            .or_insert_with(|| json!("Provincial Park"));
        props
            .entry("managing_authority")
            .or_insert_with(|| json!("Ontario Parks"));

        json!({
            "type": "Feature",
            "properties": props,
            "geometry": feature.get("geometry").cloned().unwrap_or(Value::Null),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

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

    fn park_collection(count: usize) -> String {
        let features: Vec<Value> = (0..count)
            .map(|i| {
                json!({
                    "type": "Feature",
                    "properties": {"PARK_NAME": format!("Park {}", i)},
                    "geometry": {"type": "Polygon", "coordinates": []}
                })
            })
            .collect();
        json!({"type": "FeatureCollection", "features": features}).to_string()
    }

    fn fast_options() -> SourceClientOptions {
        SourceClientOptions {
            rate_limit: 60_000,
            ..SourceClientOptions::default()
        }
    }

    #[tokio::test]
    async fn test_parks_query_includes_envelope() {
        let (url, handle) = spawn_server(vec![json_response("200 OK", &park_collection(2))]);
        let client = GeoHubClient::with_base_url(&url, fast_options()).unwrap();

        let parks = client
            .get_provincial_parks(Some(&BoundingBox::WILLIAMS_TREATY))
            .await
            .unwrap();
        let heads = handle.join().unwrap();

        assert_eq!(parks.len(), 2);
        assert!(heads[0].contains("/LIO_Cartographic/LIO_Topographic/MapServer/9/query"));
        assert!(heads[0].contains("where=1%3D1"));
        assert!(heads[0].contains("outFields=*"));
        assert!(heads[0].contains("f=geojson"));
        assert!(heads[0].contains("geometry=-80.2%2C43.8%2C-78%2C45.2"));
        assert!(heads[0].contains("geometryType=esriGeometryEnvelope"));
        assert!(heads[0].contains("spatialRel=esriSpatialRelIntersects"));
    }

    #[tokio::test]
    async fn test_parks_without_bounds_omit_spatial_params() {
        let (url, handle) = spawn_server(vec![json_response("200 OK", &park_collection(1))]);
        let client = GeoHubClient::with_base_url(&url, fast_options()).unwrap();

        client.get_provincial_parks(None).await.unwrap();
        let heads = handle.join().unwrap();

        assert!(!heads[0].contains("geometryType"));
        assert!(!heads[0].contains("spatialRel"));
    }

    #[tokio::test]
    async fn test_conservation_authorities_hit_their_layer() {
        let body = json!({"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"NAME": "Otonabee Conservation"}}
        ]})
        .to_string();
        let (url, handle) = spawn_server(vec![json_response("200 OK", &body)]);
        let client = GeoHubClient::with_base_url(&url, fast_options()).unwrap();

        let authorities = client.get_conservation_authorities(None).await.unwrap();
        let heads = handle.join().unwrap();

        assert_eq!(authorities.len(), 1);
        assert!(heads[0].contains("/MOE/Conservation_Authorities/MapServer/0/query"));
    }

    #[tokio::test]
    async fn test_empty_layer_is_not_an_error() {
        let body = json!({"type": "FeatureCollection", "features": []}).to_string();
        let (url, handle) = spawn_server(vec![json_response("200 OK", &body)]);
        let client = GeoHubClient::with_base_url(&url, fast_options()).unwrap();

        let parks = client.get_provincial_parks(None).await.unwrap();
        handle.join().unwrap();

        assert!(parks.is_empty());
    }

    #[test]
    fn test_standardize_park_renames_properties() {
        let feature = json!({
            "type": "Feature",
            "properties": {
                "PARK_NAME": "Algonquin",
                "OFFICIAL_NAME": "Algonquin Provincial Park",
                "ONT_PARK_ID": 17,
                "REGULATION": "Wilderness",
                "AREA_HA": 772300.0,
                "MANAGEMENT_UNIT": "Ontario Parks",
                "PARK_CLASS": "Natural Environment",
                "ZONE_CLASS": "Access"
            },
            "geometry": {"type": "Polygon", "coordinates": []}
        });
        let park = GeoHubClient::standardize_park(&feature);

        assert_eq!(park["properties"]["name"], "Algonquin");
        assert_eq!(park["properties"]["official_name"], "Algonquin Provincial Park");
        assert_eq!(park["properties"]["park_id"], 17);
        assert_eq!(park["properties"]["designation"], "Wilderness");
        assert_eq!(park["properties"]["hectares"], 772300.0);
        assert_eq!(park["properties"]["park_class"], "Natural Environment");
    }

    #[test]
    fn test_standardize_park_applies_defaults() {
        let feature = json!({
            "type": "Feature",
            "properties": {"SHORT_NAME": "Petroglyphs"},
            "geometry": Value::Null
        });
        let park = GeoHubClient::standardize_park(&feature);

        // The only name-like property is promoted, then copied to the
        // official name.
        assert_eq!(park["properties"]["name"], "Petroglyphs");
        assert_eq!(park["properties"]["official_name"], "Petroglyphs");
        assert_eq!(park["properties"]["designation"], "Provincial Park");
        assert_eq!(park["properties"]["managing_authority"], "Ontario Parks");
    }
}
