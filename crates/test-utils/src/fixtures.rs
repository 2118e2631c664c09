//! Common test fixtures.

/// Region GeoJSON documents shaped like GADM level-1/level-2 exports.
pub mod regions {
    /// Build a rectangular polygon feature with GADM-style properties.
    pub fn rectangle_feature(
        name_1: &str,
        name_2: Option<&str>,
        (min_lon, min_lat, max_lon, max_lat): (f64, f64, f64, f64),
    ) -> String {
        let name_2 = name_2
            .map(|n| format!(r#", "NAME_2": "{}""#, n))
            .unwrap_or_default();
        format!(
            r#"{{"type": "Feature", "properties": {{"NAME_1": "{name_1}"{name_2}}}, "geometry": {{"type": "Polygon", "coordinates": [[[{min_lon}, {min_lat}], [{max_lon}, {min_lat}], [{max_lon}, {max_lat}], [{min_lon}, {max_lat}], [{min_lon}, {min_lat}]]]}}}}"#
        )
    }

    /// Wrap features in a FeatureCollection.
    pub fn feature_collection(features: &[String]) -> String {
        format!(
            r#"{{"type": "FeatureCollection", "features": [{}]}}"#,
            features.join(", ")
        )
    }

    /// Two counties covering the west and east halves of the synthetic grid.
    pub fn synthetic_counties() -> String {
        feature_collection(&[
            rectangle_feature("Nairobi", None, (36.4, -1.6, 37.6, 0.1)),
            rectangle_feature("Kajiado", None, (37.9, -1.6, 39.1, 0.1)),
        ])
    }
}
