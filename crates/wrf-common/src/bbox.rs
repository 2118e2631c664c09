//! Geographic bounding boxes.

use serde::{Deserialize, Serialize};

/// A lon/lat bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Smallest box enclosing all `(lon, lat)` points, `None` when empty.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a (f64, f64)>,
    {
        let mut iter = points.into_iter();
        let &(lon, lat) = iter.next()?;
        let mut bbox = Self::new(lon, lat, lon, lat);
        for &(lon, lat) in iter {
            bbox.min_lon = bbox.min_lon.min(lon);
            bbox.max_lon = bbox.max_lon.max(lon);
            bbox.min_lat = bbox.min_lat.min(lat);
            bbox.max_lat = bbox.max_lat.max(lat);
        }
        Some(bbox)
    }

    /// Check if a point lies within the box (edges inclusive).
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    /// Smallest box covering both boxes.
    pub fn union(&self, other: &BoundingBox) -> Self {
        Self {
            min_lon: self.min_lon.min(other.min_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lon: self.max_lon.max(other.max_lon),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let points = vec![(36.5, -1.5), (37.2, -0.9), (36.9, -1.8)];
        let bbox = BoundingBox::from_points(&points).unwrap();
        assert_eq!(bbox, BoundingBox::new(36.5, -1.8, 37.2, -0.9));
        assert!(BoundingBox::from_points(&Vec::new()).is_none());
    }

    #[test]
    fn test_contains_edges() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        assert!(bbox.contains(0.0, 0.0));
        assert!(bbox.contains(1.0, 0.5));
        assert!(!bbox.contains(1.01, 0.5));
    }

    #[test]
    fn test_union() {
        let a = BoundingBox::new(0.0, 0.0, 2.0, 2.0);
        let c = BoundingBox::new(5.0, 5.0, 6.0, 6.0);
        assert_eq!(a.union(&c), BoundingBox::new(0.0, 0.0, 6.0, 6.0));
        assert_eq!(c.union(&a), a.union(&c));
    }
}
