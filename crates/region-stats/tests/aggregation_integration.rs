//! Region aggregation over resolved synthetic WRF fields.
//!
//! The synthetic grid has latitudes -1.5..0.0 and longitudes 36.5..39.0 at
//! 0.5° spacing; the two synthetic counties split it into a western and an
//! eastern block of 4x3 points each.

use std::sync::Arc;

use field_resolver::{FieldKind, VariableResolver};
use ndarray::{array, Array2};
use region_stats::{
    classify_temperature_anomaly, AggregationConfig, AnomalyClass, Aggregation, FieldStatistics,
    Region, RegionAggregator, RegionSet,
};
use test_utils::regions::{feature_collection, rectangle_feature, synthetic_counties};
use test_utils::{assert_approx_eq, field_2d, replace_values, SyntheticWrf};
use wrf_common::{Hectopascals, WrfError};

fn counties() -> Arc<RegionSet> {
    Arc::new(RegionSet::from_geojson_str(&synthetic_counties(), &AggregationConfig::default()).unwrap())
}

fn grid(ds: &wrf_common::InMemoryDataset) -> (Array2<f32>, Array2<f32>) {
    VariableResolver::new(ds).accessor().lat_lon(0).unwrap()
}

// =============================================================================
// Basic contract
// =============================================================================

#[test]
fn test_unit_square_corners_are_all_inside() {
    let square = Region::from_wkt("Unit", "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))").unwrap();
    let aggregator = RegionAggregator::new(Arc::new(RegionSet::new(vec![square])));

    let lats = array![[0.0f32, 0.0], [1.0, 1.0]];
    let lons = array![[0.0f32, 1.0], [0.0, 1.0]];
    let values = array![[1.0f32, 2.0], [3.0, 4.0]];

    match aggregator.summarize("UNIT", values.view(), lats.view(), lons.view()).unwrap() {
        Aggregation::Summary(summary) => {
            assert_eq!(summary.mean, 2.5);
            assert_eq!(summary.min, 1.0);
            assert_eq!(summary.max, 4.0);
        }
        other => panic!("expected a summary, got {:?}", other),
    }
}

#[test]
fn test_region_between_grid_points_has_no_samples() {
    let ds = SyntheticWrf::default().build();
    let (lats, lons) = grid(&ds);
    let tiny = Region::from_wkt("Tiny", "POLYGON((36.6 -1.4, 36.9 -1.4, 36.9 -1.1, 36.6 -1.1, 36.6 -1.4))").unwrap();
    let aggregator = RegionAggregator::new(Arc::new(RegionSet::new(vec![tiny])));

    let field = VariableResolver::new(&ds).resolve(FieldKind::SurfaceTemperature, 0, None).unwrap();
    let result = aggregator
        .summarize("tiny", field.values.view(), lats.view(), lons.view())
        .unwrap();
    assert_eq!(
        result,
        Aggregation::NoSamplesFound {
            region: "Tiny".to_string()
        }
    );
}

#[test]
fn test_unknown_region() {
    let ds = SyntheticWrf::default().build();
    let (lats, lons) = grid(&ds);
    let aggregator = RegionAggregator::new(counties());
    let field = Array2::<f32>::zeros(lats.dim());

    let err = aggregator
        .summarize("Atlantis", field.view(), lats.view(), lons.view())
        .unwrap_err();
    assert!(matches!(err, WrfError::RegionNotFound(_)));
    assert!(err.is_request_error());
}

// =============================================================================
// Resolved fields over counties
// =============================================================================

#[test]
fn test_surface_temperature_per_county() {
    let ds = SyntheticWrf::default().build();
    let (lats, lons) = grid(&ds);
    let field = VariableResolver::new(&ds).resolve(FieldKind::SurfaceTemperature, 0, None).unwrap();
    let aggregator = RegionAggregator::new(counties());

    let nairobi = aggregator
        .summarize("nairobi", field.values.view(), lats.view(), lons.view())
        .unwrap();
    let summary = nairobi.summary().unwrap();
    assert_eq!(summary.region, "Nairobi");
    assert_eq!(summary.count, 12);
    assert_approx_eq!(summary.mean, 21.85, 1e-9);

    let anomaly = classify_temperature_anomaly(summary.mean, None).unwrap();
    assert_eq!(anomaly.class, AnomalyClass::Mild);
}

#[test]
fn test_rainfall_gradient_splits_by_county() {
    let mut ds = SyntheticWrf::default().build();
    // Rain grows eastward: RAINNC = column index, RAINC = 0.
    replace_values(&mut ds, "RAINNC", field_2d(2, 4, 6, |_, _, x| x as f32));
    replace_values(&mut ds, "RAINC", field_2d(2, 4, 6, |_, _, _| 0.0));
    let (lats, lons) = grid(&ds);
    let field = VariableResolver::new(&ds).resolve(FieldKind::Rainfall, 1, None).unwrap();

    let results = RegionAggregator::new(counties())
        .summarize_all(field.values.view(), lats.view(), lons.view())
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].region(), "Nairobi");
    let west = results[0].summary().unwrap();
    assert_eq!((west.min, west.max, west.mean), (0.0, 2.0, 1.0));
    let east = results[1].summary().unwrap();
    assert_eq!((east.min, east.max, east.mean), (3.0, 5.0, 4.0));
}

#[test]
fn test_nan_cells_are_skipped() {
    let ds = SyntheticWrf::default().build();
    let (lats, lons) = grid(&ds);
    let mut values = Array2::<f32>::from_elem(lats.dim(), 10.0);
    values[[0, 0]] = f32::NAN;
    values[[1, 1]] = 40.0;

    let agg = RegionAggregator::new(counties())
        .summarize("Nairobi", values.view(), lats.view(), lons.view())
        .unwrap();
    let summary = agg.summary().unwrap();
    assert_eq!(summary.count, 11);
    assert_eq!(summary.max, 40.0);
    assert_eq!(summary.mean, 12.73);
}

#[test]
fn test_interpolated_level_aggregates() {
    let ds = SyntheticWrf::default().build();
    let (lats, lons) = grid(&ds);
    let field = VariableResolver::new(&ds)
        .resolve(FieldKind::Temperature, 0, Some(Hectopascals(850.0)))
        .unwrap();

    let agg = RegionAggregator::new(counties())
        .summarize("Kajiado", field.values.view(), lats.view(), lons.view())
        .unwrap();
    let mean = agg.summary().unwrap().mean;
    assert_approx_eq!(mean, 13.22, 0.011);

    let anomaly = classify_temperature_anomaly(mean, Some(Hectopascals(850.0))).unwrap();
    assert_eq!(anomaly.class, AnomalyClass::Normal);
}

// =============================================================================
// Masks and sub-regions
// =============================================================================

#[test]
fn test_mask_agrees_with_direct_summary() {
    let ds = SyntheticWrf::default().build();
    let (lats, lons) = grid(&ds);
    let aggregator = RegionAggregator::new(counties());
    let mask = aggregator.build_mask("Kajiado", lats.view(), lons.view()).unwrap();
    assert_eq!(mask.cell_count(), 12);

    let resolver = VariableResolver::new(&ds);
    for time in 0..2 {
        let field = resolver.resolve(FieldKind::SurfaceWindSpeed, time, None).unwrap();
        let direct = aggregator
            .summarize("Kajiado", field.values.view(), lats.view(), lons.view())
            .unwrap();
        let masked = mask.summarize(field.values.view(), aggregator.config()).unwrap();
        assert_eq!(direct, masked);
        assert_approx_eq!(masked.summary().unwrap().mean, 5.0, 1e-6);
    }
}

#[test]
fn test_sub_county_lookup() {
    let counties = feature_collection(&[rectangle_feature("Nairobi", None, (36.4, -1.6, 37.6, 0.1))]);
    let sub_counties = feature_collection(&[
        rectangle_feature("Nairobi", Some("Westlands"), (36.4, -1.6, 37.2, 0.1)),
        rectangle_feature("Nairobi", Some("Embakasi"), (37.2, -1.6, 37.6, 0.1)),
    ]);
    let set = RegionSet::from_geojson_strs(&[&counties, &sub_counties], &AggregationConfig::default()).unwrap();
    let aggregator = RegionAggregator::new(Arc::new(set));

    let ds = SyntheticWrf::default().build();
    let (lats, lons) = grid(&ds);
    let values = field_2d(1, 4, 6, |_, _, x| x as f32)
        .into_dimensionality::<ndarray::Ix3>()
        .unwrap()
        .index_axis_move(ndarray::Axis(0), 0);

    let west = aggregator
        .summarize("westlands", values.view(), lats.view(), lons.view())
        .unwrap();
    assert_eq!(west.summary().unwrap().count, 8);
    assert_eq!(west.summary().unwrap().max, 1.0);

    let east = aggregator
        .summarize("EMBAKASI", values.view(), lats.view(), lons.view())
        .unwrap();
    assert_eq!(east.summary().unwrap().mean, 2.0);

    // summarize_all covers top-level regions only.
    let all = aggregator
        .summarize_all(values.view(), lats.view(), lons.view())
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].summary().unwrap().count, 12);
}

#[test]
fn test_field_statistics_of_resolved_field() {
    let ds = SyntheticWrf::default().build();
    let field = VariableResolver::new(&ds).resolve(FieldKind::Rainfall, 0, None).unwrap();
    let stats = FieldStatistics::compute(&field.values).unwrap();
    assert_eq!(stats.valid_count, 24);
    assert_approx_eq!(stats.mean, 3.0, 1e-9);
    assert_approx_eq!(stats.std_dev, 0.0, 1e-9);
}
