//! GeoJSON input types for administrative boundaries.
//!
//! Only what region loading needs is modelled: a FeatureCollection of
//! Polygon or MultiPolygon features with free-form properties. Other
//! geometry types deserialize but are rejected when converted.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use wrf_common::{WrfError, WrfResult};

use crate::polygon::{MultiPolygon, Polygon};

/// A GeoJSON FeatureCollection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type")]
    pub type_: String,

    /// Array of features.
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Parse a FeatureCollection from a JSON string.
    pub fn from_json_str(json: &str) -> WrfResult<Self> {
        let collection: Self = serde_json::from_str(json)?;
        if collection.type_ != "FeatureCollection" {
            return Err(WrfError::InvalidGeometry(format!(
                "expected a FeatureCollection, got '{}'",
                collection.type_
            )));
        }
        Ok(collection)
    }
}

/// A GeoJSON Feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    /// Type identifier (always "Feature").
    #[serde(rename = "type")]
    pub type_: String,

    /// Feature properties, e.g. GADM `NAME_1`/`NAME_2`.
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,

    /// The geometry of this feature; null geometries are allowed by GeoJSON.
    pub geometry: Option<Geometry>,
}

impl Feature {
    /// A property rendered as text. Numbers are formatted; null, missing and
    /// empty values give `None`.
    pub fn property(&self, key: &str) -> Option<String> {
        let value = self.properties.as_ref()?.get(key)?;
        let text = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// A GeoJSON position: `[lon, lat]` with an optional ignored altitude.
pub type Position = Vec<f64>;

/// GeoJSON geometry types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    /// A polygon geometry.
    Polygon {
        /// Array of linear rings (first is exterior, rest are holes).
        coordinates: Vec<Vec<Position>>,
    },

    /// A multi-polygon geometry.
    MultiPolygon {
        /// Array of polygons, each an array of linear rings.
        coordinates: Vec<Vec<Vec<Position>>>,
    },

    /// A point geometry (not usable as a region).
    Point {
        coordinates: Position,
    },

    /// A line string geometry (not usable as a region).
    LineString {
        coordinates: Vec<Position>,
    },
}

impl Geometry {
    /// Convert to polygons in (lon, lat) degrees.
    pub fn to_multipolygon(&self) -> WrfResult<MultiPolygon> {
        match self {
            Geometry::Polygon { coordinates } => Ok(MultiPolygon::from(polygon_from_rings(coordinates)?)),
            Geometry::MultiPolygon { coordinates } => {
                let polygons = coordinates
                    .iter()
                    .map(|rings| polygon_from_rings(rings))
                    .collect::<WrfResult<Vec<_>>>()?;
                MultiPolygon::new(polygons)
            }
            Geometry::Point { .. } => Err(WrfError::InvalidGeometry(
                "Point geometry cannot describe a region".to_string(),
            )),
            Geometry::LineString { .. } => Err(WrfError::InvalidGeometry(
                "LineString geometry cannot describe a region".to_string(),
            )),
        }
    }
}

fn polygon_from_rings(rings: &[Vec<Position>]) -> WrfResult<Polygon> {
    let mut converted = rings
        .iter()
        .map(|ring| ring.iter().map(|p| to_lon_lat(p)).collect::<WrfResult<Vec<_>>>())
        .collect::<WrfResult<Vec<_>>>()?;
    if converted.is_empty() {
        return Err(WrfError::InvalidGeometry("Polygon has no rings".to_string()));
    }
    let exterior = converted.remove(0);
    Polygon::new(exterior, converted)
}

fn to_lon_lat(position: &[f64]) -> WrfResult<(f64, f64)> {
    match position {
        [lon, lat, ..] => Ok((*lon, *lat)),
        _ => Err(WrfError::InvalidGeometry(format!(
            "position needs at least 2 values, got {}",
            position.len()
        ))),
    }
}
