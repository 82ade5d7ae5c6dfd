//! Geometry helpers for areas of interest: GeoJSON bounding-box extraction,
//! point-in-bounds checks and spatial filtering of observation records.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
/// # Geometry Error
///
/// Defines the failures that can occur while deriving a bounding box from a
/// GeoJSON area of interest.
pub enum GeometryError {
    /// The geometry `type` is not one of `Polygon`, `MultiPolygon` or `Point`.
    #[error("Unsupported geometry type: {0}")]
    UnsupportedType(String),

    /// The geometry carried no usable coordinate array.
    #[error("Geometry has no usable coordinates: {0}")]
    MissingCoordinates(String),
}

/// Degrees of padding applied around `Point` geometries, roughly 11 km.
const POINT_BUFFER_DEG: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
/// # Geographic Bounding Box
///
/// An axis-aligned latitude/longitude rectangle identified by its southwest
/// and northeast corners. All dataset clients express their spatial filters
/// through this type.
pub struct BoundingBox {
    /// Southwest corner latitude.
    pub swlat: f64,
    /// Southwest corner longitude.
    pub swlng: f64,
    /// Northeast corner latitude.
    pub nelat: f64,
    /// Northeast corner longitude.
    pub nelng: f64,
}

impl BoundingBox {
    /// The full extent of the province of Ontario.
    pub const ONTARIO: BoundingBox = BoundingBox {
        swlat: 41.7,
        swlng: -95.2,
        nelat: 56.9,
        nelng: -74.3,
    };

    /// The Williams Treaty territory in south-central Ontario.
    pub const WILLIAMS_TREATY: BoundingBox = BoundingBox {
        swlat: 43.8,
        swlng: -80.2,
        nelat: 45.2,
        nelng: -78.0,
    };

    /// Creates a bounding box from its corner coordinates.
    pub fn new(swlat: f64, swlng: f64, nelat: f64, nelng: f64) -> Self {
        Self {
            swlat,
            swlng,
            nelat,
            nelng,
        }
    }

    /// Extracts the bounding box of a GeoJSON area of interest.
    ///
    /// The value may be a bare geometry object or any object carrying a
    /// `geometry` key (such as a GeoJSON `Feature`). `Polygon` geometries use
    /// their exterior ring, `MultiPolygon` geometries the exterior ring of
    /// their first polygon, and `Point` geometries are padded by roughly
    /// 11 km in every direction.
    ///
    /// # Arguments
    /// * `aoi` - The area of interest as parsed GeoJSON.
    ///
    /// # Returns
    /// The smallest box enclosing the geometry, or a [`GeometryError`] when
    /// the geometry type is unsupported or its coordinates are unusable.
    pub fn from_geojson(aoi: &Value) -> Result<Self, GeometryError> {
        // Unwrap a Feature-style wrapper down to the bare geometry.
        let geometry = aoi.get("geometry").unwrap_or(aoi);
        let kind = geometry
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("<missing>");

        match kind {
            "Polygon" => {
                let ring = geometry
                    .get("coordinates")
                    .and_then(|c| c.get(0))
                    .ok_or_else(|| GeometryError::MissingCoordinates(kind.to_string()))?;
                Self::from_ring(ring, kind)
            }
            "MultiPolygon" => {
                // The first polygon's exterior ring sets the bounds.
                let ring = geometry
                    .get("coordinates")
                    .and_then(|c| c.get(0))
                    .and_then(|p| p.get(0))
                    .ok_or_else(|| GeometryError::MissingCoordinates(kind.to_string()))?;
                Self::from_ring(ring, kind)
            }
            "Point" => {
                let coords = geometry
                    .get("coordinates")
                    .and_then(Value::as_array)
                    .ok_or_else(|| GeometryError::MissingCoordinates(kind.to_string()))?;
                let (lng, lat) = match (
                    coords.first().and_then(Value::as_f64),
                    coords.get(1).and_then(Value::as_f64),
                ) {
                    (Some(lng), Some(lat)) => (lng, lat),
                    _ => return Err(GeometryError::MissingCoordinates(kind.to_string())),
                };
                Ok(Self::new(
                    lat - POINT_BUFFER_DEG,
                    lng - POINT_BUFFER_DEG,
                    lat + POINT_BUFFER_DEG,
                    lng + POINT_BUFFER_DEG,
                ))
            }
            other => Err(GeometryError::UnsupportedType(other.to_string())),
        }
    }

    /// Computes the bounds of one linear ring of `[lng, lat]` positions.
    fn from_ring(ring: &Value, kind: &str) -> Result<Self, GeometryError> {
        let positions = ring
            .as_array()
            .ok_or_else(|| GeometryError::MissingCoordinates(kind.to_string()))?;

        let mut bounds: Option<BoundingBox> = None;
        for position in positions {
            let lng = position.get(0).and_then(Value::as_f64);
            let lat = position.get(1).and_then(Value::as_f64);
            if let (Some(lng), Some(lat)) = (lng, lat) {
                bounds = Some(match bounds {
                    None => Self::new(lat, lng, lat, lng),
                    Some(b) => Self::new(
                        b.swlat.min(lat),
                        b.swlng.min(lng),
                        b.nelat.max(lat),
                        b.nelng.max(lng),
                    ),
                });
            }
        }
        bounds.ok_or_else(|| GeometryError::MissingCoordinates(kind.to_string()))
    }

    /// Returns true when the point lies within the box, borders included.
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        self.swlat <= lat && lat <= self.nelat && self.swlng <= lng && lng <= self.nelng
    }

    /// Formats the box as an ArcGIS envelope: `swlng,swlat,nelng,nelat`.
    pub fn to_envelope(&self) -> String {
        format!("{},{},{},{}", self.swlng, self.swlat, self.nelng, self.nelat)
    }

    /// Formats the box as an OGC CQL spatial predicate for WFS requests.
    pub fn to_cql_bbox(&self) -> String {
        format!(
            "BBOX(geometry,{},{},{},{})",
            self.swlng, self.swlat, self.nelng, self.nelat
        )
    }

    /// Keeps only the observations whose `lat`/`lng` fields fall inside the
    /// box. Records missing either coordinate are dropped.
    ///
    /// # Arguments
    /// * `observations` - Observation records carrying numeric `lat` and
    ///   `lng` fields.
    ///
    /// # Returns
    /// The retained observations, cloned, in their original order.
    pub fn filter_within(&self, observations: &[Value]) -> Vec<Value> {
        observations
            .iter()
            .filter(|obs| {
                let lat = obs.get("lat").and_then(Value::as_f64);
                let lng = obs.get("lng").and_then(Value::as_f64);
                match (lat, lng) {
                    (Some(lat), Some(lng)) => self.contains(lat, lng),
                    _ => false,
                }
            })
            .cloned()
            .collect()
    }
}
