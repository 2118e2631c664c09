//! Benchmarks for region aggregation.
//!
//! Run with: cargo bench --package region-stats
//! Or: cargo bench --package region-stats --bench aggregation_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::Array2;
use std::sync::Arc;

use region_stats::{
    AggregationConfig, FieldStatistics, MultiPolygon, RegionAggregator, RegionMask, RegionSet,
};
use test_utils::regions::{feature_collection, rectangle_feature};

/// A Kenya-sized grid at the given spacing with a smooth synthetic field.
fn kenya_grid(spacing: f32) -> (Array2<f32>, Array2<f32>, Array2<f32>) {
    let ny = (10.5 / spacing) as usize;
    let nx = (8.5 / spacing) as usize;
    let lats = Array2::from_shape_fn((ny, nx), |(y, _)| -5.0 + y as f32 * spacing);
    let lons = Array2::from_shape_fn((ny, nx), |(_, x)| 33.5 + x as f32 * spacing);
    let field = Array2::from_shape_fn((ny, nx), |(y, x)| 20.0 + (y as f32 * 0.1).sin() + (x as f32 * 0.05).cos());
    (lats, lons, field)
}

/// A grid of 1°x1° counties covering the domain.
fn county_grid() -> RegionSet {
    let mut features = Vec::new();
    for i in 0..8 {
        for j in 0..10 {
            let min_lon = 33.5 + i as f64;
            let min_lat = -5.0 + j as f64;
            features.push(rectangle_feature(
                &format!("County {}-{}", i, j),
                None,
                (min_lon, min_lat, min_lon + 1.0, min_lat + 1.0),
            ));
        }
    }
    RegionSet::from_geojson_str(&feature_collection(&features), &AggregationConfig::default())
        .expect("county grid loads")
}

// =============================================================================
// POINT IN POLYGON BENCHMARKS
// =============================================================================

fn bench_point_in_polygon(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_in_polygon");

    let square = MultiPolygon::from_wkt("POLYGON((36 -2, 38 -2, 38 0, 36 0, 36 -2))").unwrap();
    group.bench_function("rectangle_inside", |b| {
        b.iter(|| square.contains(black_box(37.0), black_box(-1.0)))
    });
    group.bench_function("rectangle_bbox_reject", |b| {
        b.iter(|| square.contains(black_box(40.0), black_box(3.0)))
    });

    // 360-vertex ring, closer to a real county outline
    let ring: Vec<String> = (0..=360)
        .map(|d| {
            let r = (d as f64).to_radians();
            format!("{} {}", 37.0 + r.cos(), -1.0 + r.sin())
        })
        .collect();
    let circle = MultiPolygon::from_wkt(&format!("POLYGON(({}))", ring.join(", "))).unwrap();
    group.bench_function("circle_360_inside", |b| {
        b.iter(|| circle.contains(black_box(37.2), black_box(-0.8)))
    });

    group.finish();
}

// =============================================================================
// AGGREGATION BENCHMARKS
// =============================================================================

fn bench_summarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarize");
    let aggregator = RegionAggregator::new(Arc::new(county_grid()));

    for spacing in [0.1f32, 0.05] {
        let (lats, lons, field) = kenya_grid(spacing);
        group.throughput(Throughput::Elements(field.len() as u64));

        group.bench_with_input(BenchmarkId::new("single_region", spacing), &spacing, |b, _| {
            b.iter(|| {
                aggregator
                    .summarize(black_box("County 3-4"), field.view(), lats.view(), lons.view())
                    .unwrap()
            })
        });

        group.bench_with_input(BenchmarkId::new("all_80_regions", spacing), &spacing, |b, _| {
            b.iter(|| {
                aggregator
                    .summarize_all(field.view(), lats.view(), lons.view())
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_mask(c: &mut Criterion) {
    let mut group = c.benchmark_group("region_mask");
    let regions = county_grid();
    let region = regions.find("County 3-4").unwrap();
    let config = AggregationConfig::default();
    let (lats, lons, field) = kenya_grid(0.05);

    group.bench_function("build", |b| {
        b.iter(|| RegionMask::build(black_box(region), lats.view(), lons.view()).unwrap())
    });

    let mask = RegionMask::build(region, lats.view(), lons.view()).unwrap();
    group.bench_function("summarize_with_mask", |b| {
        b.iter(|| mask.summarize(black_box(field.view()), &config).unwrap())
    });

    group.finish();
}

// =============================================================================
// FIELD STATISTICS BENCHMARKS
// =============================================================================

fn bench_field_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_statistics");
    let (_, _, field) = kenya_grid(0.05);
    group.throughput(Throughput::Elements(field.len() as u64));

    group.bench_function("compute", |b| {
        b.iter(|| FieldStatistics::compute(black_box(&field)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_point_in_polygon,
    bench_summarize,
    bench_mask,
    bench_field_statistics,
);
criterion_main!(benches);
