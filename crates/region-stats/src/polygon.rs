//! Polygons in geographic (lon, lat) degrees and point membership.

use serde::{Deserialize, Serialize};
use wrf_common::{BoundingBox, WrfError, WrfResult};

/// Distance below which a point counts as lying on an edge.
const EDGE_TOLERANCE: f64 = 1e-9;

/// Where a point lies relative to a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingLocation {
    Inside,
    Boundary,
    Outside,
}

/// Locate `(lon, lat)` relative to a closed or unclosed ring.
///
/// Even-odd ray casting, with an explicit on-edge check first so points on
/// the boundary are classified consistently.
pub fn locate_in_ring(ring: &[(f64, f64)], lon: f64, lat: f64) -> RingLocation {
    let n = ring.len();
    if n < 3 {
        return RingLocation::Outside;
    }

    let mut inside = false;
    let mut j = n - 1;

    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];

        if on_segment((xj, yj), (xi, yi), (lon, lat)) {
            return RingLocation::Boundary;
        }

        if ((yi > lat) != (yj > lat)) && (lon < (xj - xi) * (lat - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }

    if inside {
        RingLocation::Inside
    } else {
        RingLocation::Outside
    }
}

fn on_segment(a: (f64, f64), b: (f64, f64), p: (f64, f64)) -> bool {
    let cross = (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0);
    let len = ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt();
    if len == 0.0 {
        return (p.0 - a.0).abs() <= EDGE_TOLERANCE && (p.1 - a.1).abs() <= EDGE_TOLERANCE;
    }
    if (cross / len).abs() > EDGE_TOLERANCE {
        return false;
    }
    p.0 >= a.0.min(b.0) - EDGE_TOLERANCE
        && p.0 <= a.0.max(b.0) + EDGE_TOLERANCE
        && p.1 >= a.1.min(b.1) - EDGE_TOLERANCE
        && p.1 <= a.1.max(b.1) + EDGE_TOLERANCE
}

/// A polygon with one exterior ring and optional holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub exterior: Vec<(f64, f64)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<(f64, f64)>>,
    bbox: BoundingBox,
}

impl Polygon {
    /// Build a polygon. The exterior needs at least 3 distinct vertices.
    pub fn new(exterior: Vec<(f64, f64)>, holes: Vec<Vec<(f64, f64)>>) -> WrfResult<Self> {
        check_ring(&exterior)?;
        for hole in &holes {
            check_ring(hole)?;
        }
        let bbox = BoundingBox::from_points(exterior.iter())
            .ok_or_else(|| WrfError::InvalidGeometry("empty exterior ring".to_string()))?;
        Ok(Self {
            exterior,
            holes,
            bbox,
        })
    }

    /// An axis-aligned rectangle.
    pub fn rectangle(bbox: BoundingBox) -> WrfResult<Self> {
        Self::new(
            vec![
                (bbox.min_lon, bbox.min_lat),
                (bbox.max_lon, bbox.min_lat),
                (bbox.max_lon, bbox.max_lat),
                (bbox.min_lon, bbox.max_lat),
                (bbox.min_lon, bbox.min_lat),
            ],
            Vec::new(),
        )
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Whether the point lies inside or on the boundary of the polygon.
    ///
    /// A point inside a hole is outside; a point on a hole's edge is on the
    /// polygon boundary and therefore contained.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        if !self.bbox.contains(lon, lat) {
            return false;
        }
        if locate_in_ring(&self.exterior, lon, lat) == RingLocation::Outside {
            return false;
        }
        !self
            .holes
            .iter()
            .any(|hole| locate_in_ring(hole, lon, lat) == RingLocation::Inside)
    }
}

fn check_ring(ring: &[(f64, f64)]) -> WrfResult<()> {
    if let Some((lon, lat)) = ring.iter().find(|(lon, lat)| !lon.is_finite() || !lat.is_finite()) {
        return Err(WrfError::InvalidGeometry(format!(
            "non-finite coordinate ({}, {})",
            lon, lat
        )));
    }

    let mut distinct: Vec<(f64, f64)> = ring.to_vec();
    if distinct.len() > 1 && distinct.first() == distinct.last() {
        distinct.pop();
    }
    if distinct.len() < 3 {
        return Err(WrfError::InvalidGeometry(format!(
            "ring needs at least 3 distinct points, got {}",
            distinct.len()
        )));
    }
    Ok(())
}

/// One or more polygons treated as a single region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiPolygon {
    pub polygons: Vec<Polygon>,
    bbox: BoundingBox,
}

impl MultiPolygon {
    pub fn new(polygons: Vec<Polygon>) -> WrfResult<Self> {
        let bbox = polygons
            .iter()
            .map(|p| *p.bbox())
            .reduce(|a, b| a.union(&b))
            .ok_or_else(|| WrfError::InvalidGeometry("multipolygon has no polygons".to_string()))?;
        Ok(Self { polygons, bbox })
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Whether any member polygon contains the point (boundary inclusive).
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.bbox.contains(lon, lat) && self.polygons.iter().any(|p| p.contains(lon, lat))
    }

    /// Combine with another multipolygon.
    pub fn merge(mut self, other: MultiPolygon) -> Self {
        self.bbox = self.bbox.union(&other.bbox);
        self.polygons.extend(other.polygons);
        self
    }

    /// Parse a WKT POLYGON or MULTIPOLYGON string.
    ///
    /// Accepts formats:
    /// - `POLYGON((lon1 lat1, lon2 lat2, lon3 lat3, lon1 lat1))`
    /// - `POLYGON((outer ring), (hole))`
    /// - `MULTIPOLYGON(((ring1)),((ring2)))`
    pub fn from_wkt(wkt: &str) -> WrfResult<Self> {
        let wkt = wkt.trim();
        let upper = wkt.to_uppercase();

        let (tag_len, nesting) = if upper.starts_with("MULTIPOLYGON") {
            ("MULTIPOLYGON".len(), 3)
        } else if upper.starts_with("POLYGON") {
            ("POLYGON".len(), 2)
        } else {
            return Err(WrfError::InvalidGeometry(
                "Expected POLYGON or MULTIPOLYGON format".to_string(),
            ));
        };

        let body = wkt[tag_len..].trim();
        let groups = split_groups(body)?;
        let polygons = if nesting == 2 {
            vec![polygon_from_rings(&groups)?]
        } else {
            groups
                .iter()
                .map(|g| polygon_from_rings(&split_groups(&format!("({})", g))?))
                .collect::<WrfResult<Vec<_>>>()?
        };

        Self::new(polygons)
    }
}

impl From<Polygon> for MultiPolygon {
    fn from(polygon: Polygon) -> Self {
        let bbox = *polygon.bbox();
        Self {
            polygons: vec![polygon],
            bbox,
        }
    }
}

/// Split `(a),(b),(c)` wrapped in one outer pair of parentheses into the
/// inner texts `a`, `b`, `c`.
fn split_groups(body: &str) -> WrfResult<Vec<String>> {
    let body = body.trim();
    let inner = body
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| WrfError::InvalidGeometry("Missing enclosing parentheses".to_string()))?;

    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();

    for ch in inner.chars() {
        match ch {
            '(' => {
                if depth > 0 {
                    current.push(ch);
                }
                depth += 1;
            }
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| WrfError::InvalidGeometry("Unbalanced parentheses".to_string()))?;
                if depth == 0 {
                    groups.push(current.trim().to_string());
                    current.clear();
                } else {
                    current.push(ch);
                }
            }
            ',' if depth == 0 => {}
            _ => {
                if depth > 0 {
                    current.push(ch);
                } else if !ch.is_whitespace() {
                    return Err(WrfError::InvalidGeometry(format!(
                        "Unexpected '{}' between groups",
                        ch
                    )));
                }
            }
        }
    }

    if depth != 0 {
        return Err(WrfError::InvalidGeometry("Unbalanced parentheses".to_string()));
    }
    if groups.is_empty() {
        return Err(WrfError::InvalidGeometry("Empty geometry".to_string()));
    }
    Ok(groups)
}

fn polygon_from_rings(rings: &[String]) -> WrfResult<Polygon> {
    let mut parsed = rings.iter().map(|r| parse_ring(r)).collect::<WrfResult<Vec<_>>>()?;
    if parsed.is_empty() {
        return Err(WrfError::InvalidGeometry("Polygon has no rings".to_string()));
    }
    let exterior = parsed.remove(0);
    Polygon::new(exterior, parsed)
}

/// Parse `lon lat, lon lat, ...`.
fn parse_ring(coords_str: &str) -> WrfResult<Vec<(f64, f64)>> {
    coords_str
        .split(',')
        .map(|pair| {
            let pair = pair.trim();
            let parts: Vec<&str> = pair.split_whitespace().collect();
            if parts.len() != 2 {
                return Err(WrfError::InvalidGeometry(format!(
                    "Expected 'lon lat' format, got '{}'",
                    pair
                )));
            }

            let lon: f64 = parts[0]
                .parse()
                .map_err(|_| WrfError::InvalidGeometry(format!("Invalid coordinate '{}'", parts[0])))?;
            let lat: f64 = parts[1]
                .parse()
                .map_err(|_| WrfError::InvalidGeometry(format!("Invalid coordinate '{}'", parts[1])))?;
            Ok((lon, lat))
        })
        .collect()
}
