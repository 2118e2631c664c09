//! Named regions (counties) with nested sub-regions (sub-counties).

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};
use wrf_common::{BoundingBox, WrfError, WrfResult};

use crate::config::AggregationConfig;
use crate::geojson::FeatureCollection;
use crate::polygon::MultiPolygon;

/// A named area with optional nested sub-regions.
#[derive(Debug, Clone, Serialize)]
pub struct Region {
    pub name: String,
    pub geometry: MultiPolygon,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_regions: Vec<Region>,
}

impl Region {
    pub fn new(name: impl Into<String>, geometry: MultiPolygon) -> Self {
        Self {
            name: name.into(),
            geometry,
            sub_regions: Vec::new(),
        }
    }

    /// Build a region from a WKT POLYGON or MULTIPOLYGON.
    pub fn from_wkt(name: impl Into<String>, wkt: &str) -> WrfResult<Self> {
        Ok(Self::new(name, MultiPolygon::from_wkt(wkt)?))
    }

    pub fn with_sub_region(mut self, sub_region: Region) -> Self {
        self.sub_regions.push(sub_region);
        self
    }

    pub fn bbox(&self) -> &BoundingBox {
        self.geometry.bbox()
    }

    /// Boundary-inclusive point membership.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.geometry.contains(lon, lat)
    }
}

/// The loaded set of regions. Built once and shared read-only.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegionSet {
    regions: Vec<Region>,
}

impl RegionSet {
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    /// Load regions from one or more GeoJSON FeatureCollections.
    ///
    /// Features are grouped by the region name property. A feature that also
    /// carries the sub-region property becomes a sub-region of its region.
    /// A region without a feature of its own takes the union of its
    /// sub-regions as its outline.
    pub fn from_geojson_strs(documents: &[&str], config: &AggregationConfig) -> WrfResult<Self> {
        let mut outlines: BTreeMap<String, (String, Option<MultiPolygon>)> = BTreeMap::new();
        let mut subs: BTreeMap<String, Vec<Region>> = BTreeMap::new();
        let mut order: Vec<String> = Vec::new();
        let mut skipped = 0usize;

        for document in documents {
            let collection = FeatureCollection::from_json_str(document)?;
            for feature in collection.features {
                let Some(name) = feature.property(&config.region_name_property) else {
                    skipped += 1;
                    continue;
                };
                let Some(geometry) = feature.geometry.as_ref() else {
                    skipped += 1;
                    continue;
                };
                let geometry = geometry.to_multipolygon()?;
                let key = name.to_lowercase();

                if !outlines.contains_key(&key) {
                    order.push(key.clone());
                    outlines.insert(key.clone(), (name.clone(), None));
                }

                match feature.property(&config.sub_region_name_property) {
                    Some(sub_name) => {
                        subs.entry(key).or_default().push(Region::new(sub_name, geometry));
                    }
                    None => {
                        if let Some((_, outline)) = outlines.get_mut(&key) {
                            *outline = Some(match outline.take() {
                                Some(existing) => existing.merge(geometry),
                                None => geometry,
                            });
                        }
                    }
                }
            }
        }

        if skipped > 0 {
            warn!(
                skipped = skipped,
                property = %config.region_name_property,
                "Skipped features without a name or geometry"
            );
        }

        let mut regions = Vec::with_capacity(order.len());
        for key in order {
            let Some((name, outline)) = outlines.remove(&key) else {
                continue;
            };
            let sub_regions = subs.remove(&key).unwrap_or_default();
            let geometry = match outline {
                Some(outline) => outline,
                None => union_of(&sub_regions)?,
            };
            regions.push(Region {
                name,
                geometry,
                sub_regions,
            });
        }

        debug!(
            regions = regions.len(),
            sub_regions = regions.iter().map(|r| r.sub_regions.len()).sum::<usize>(),
            "Loaded region set"
        );

        Ok(Self { regions })
    }

    /// Load regions from a single GeoJSON document.
    pub fn from_geojson_str(json: &str, config: &AggregationConfig) -> WrfResult<Self> {
        Self::from_geojson_strs(&[json], config)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Top-level regions in load order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Find a region or sub-region by name, ignoring case. Top-level regions
    /// take precedence over sub-regions of the same name.
    pub fn find(&self, name: &str) -> Option<&Region> {
        let name = name.trim();
        self.regions
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
            .or_else(|| {
                self.regions
                    .iter()
                    .flat_map(|r| r.sub_regions.iter())
                    .find(|s| s.name.eq_ignore_ascii_case(name))
            })
    }

    /// Like [`RegionSet::find`], failing with `RegionNotFound`.
    pub fn get(&self, name: &str) -> WrfResult<&Region> {
        self.find(name)
            .ok_or_else(|| WrfError::RegionNotFound(name.trim().to_string()))
    }

    /// Names of the top-level regions.
    pub fn names(&self) -> Vec<&str> {
        self.regions.iter().map(|r| r.name.as_str()).collect()
    }

    /// Names of the sub-regions of `region`.
    pub fn sub_region_names(&self, region: &str) -> WrfResult<Vec<&str>> {
        Ok(self
            .get(region)?
            .sub_regions
            .iter()
            .map(|s| s.name.as_str())
            .collect())
    }
}

fn union_of(regions: &[Region]) -> WrfResult<MultiPolygon> {
    let polygons = regions
        .iter()
        .flat_map(|r| r.geometry.polygons.iter().cloned())
        .collect();
    MultiPolygon::new(polygons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::regions::{feature_collection, rectangle_feature, synthetic_counties};

    #[test]
    fn test_load_counties() {
        let set = RegionSet::from_geojson_str(&synthetic_counties(), &AggregationConfig::default()).unwrap();
        assert_eq!(set.names(), vec!["Nairobi", "Kajiado"]);
        assert!(set.find("nairobi").is_some());
        assert!(set.find("KAJIADO").unwrap().contains(38.5, -1.0));
    }

    #[test]
    fn test_sub_regions_grouped_under_region() {
        let counties = feature_collection(&[rectangle_feature("Nairobi", None, (36.6, -1.45, 37.1, -1.15))]);
        let sub_counties = feature_collection(&[
            rectangle_feature("Nairobi", Some("Westlands"), (36.6, -1.3, 36.85, -1.15)),
            rectangle_feature("Nairobi", Some("Embakasi"), (36.85, -1.45, 37.1, -1.2)),
            rectangle_feature("Kiambu", Some("Thika"), (37.0, -1.1, 37.2, -0.9)),
        ]);

        let set = RegionSet::from_geojson_strs(&[&counties, &sub_counties], &AggregationConfig::default()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.sub_region_names("Nairobi").unwrap(), vec!["Westlands", "Embakasi"]);

        // Kiambu has no outline feature, so it takes its sub-county's shape.
        let kiambu = set.find("Kiambu").unwrap();
        assert!(kiambu.contains(37.1, -1.0));
        assert_eq!(kiambu.bbox().min_lon, 37.0);

        assert_eq!(set.find("embakasi").unwrap().name, "Embakasi");
    }

    #[test]
    fn test_region_not_found() {
        let set = RegionSet::from_geojson_str(&synthetic_counties(), &AggregationConfig::default()).unwrap();
        assert!(matches!(set.get("Mombasa"), Err(WrfError::RegionNotFound(name)) if name == "Mombasa"));
    }

    #[test]
    fn test_custom_name_property() {
        let json = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"county": "Turkana"},
             "geometry": {"type": "Polygon", "coordinates": [[[35, 2], [36, 2], [36, 3], [35, 2]]]}},
            {"type": "Feature", "properties": {"NAME_1": "Ignored"}, "geometry": null}
        ]}"#;
        let config = AggregationConfig {
            region_name_property: "county".to_string(),
            ..Default::default()
        };
        let set = RegionSet::from_geojson_str(json, &config).unwrap();
        assert_eq!(set.names(), vec!["Turkana"]);
    }

    #[test]
    fn test_region_from_wkt() {
        let region = Region::from_wkt("Square", "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))").unwrap();
        let set = RegionSet::new(vec![region]);
        assert!(set.get("square").unwrap().contains(1.0, 1.0));
    }
}
