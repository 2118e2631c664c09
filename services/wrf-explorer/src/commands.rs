//! Subcommand implementations. Each takes loaded inputs and returns a report.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use field_resolver::{FieldKind, ResolvedField, VariableResolver};
use ndarray::Array2;
use region_stats::{classify_temperature_anomaly, Aggregation, FieldStatistics, RegionAggregator, RegionSet};
use tracing::{debug, info};
use wrf_common::{Dataset, GridPoint, Hectopascals, ModelTime};

use crate::config::ExplorerConfig;
use crate::report::{
    time_label, FieldReport, RegionEntry, RegionsReport, SoundingReport, VariableEntry, VariablesReport,
};

/// List valid times and the variables the dataset can produce.
pub fn variables(dataset: &dyn Dataset, config: &ExplorerConfig) -> VariablesReport {
    let resolver = VariableResolver::with_config(dataset, config.resolver.clone());
    let times = (0..dataset.num_times()).map(|i| time_label(dataset, i)).collect();
    let variables = resolver
        .list_available()
        .into_iter()
        .map(|v| VariableEntry {
            levels_hpa: resolver.available_levels(v.kind).iter().map(|l| l.0).collect(),
            name: v.display_name,
            domain: v.domain,
        })
        .collect();

    VariablesReport { times, variables }
}

/// A `field` request.
#[derive(Debug, Clone, Default)]
pub struct FieldRequest {
    pub variable: String,
    pub time: usize,
    pub level_hpa: Option<f64>,
    /// Regions to summarize over; empty with `all_regions` unset means none.
    pub regions: Vec<String>,
    pub all_regions: bool,
    /// Also report the following time step.
    pub compare_next: bool,
}

/// Resolve a field and summarize it, optionally over regions.
pub fn field(
    dataset: &dyn Dataset,
    config: &ExplorerConfig,
    aggregator: Option<&RegionAggregator>,
    request: &FieldRequest,
) -> Result<FieldReport> {
    let resolver = VariableResolver::with_config(dataset, config.resolver.clone());
    let mut report = field_at(&resolver, aggregator, request, request.time)?;

    if request.compare_next {
        let next_time = request.time + 1;
        if next_time < dataset.num_times() {
            report.next = Some(Box::new(field_at(&resolver, aggregator, request, next_time)?));
        } else {
            info!(time = request.time, "No later time step to compare with");
        }
    }

    Ok(report)
}

fn field_at(
    resolver: &VariableResolver<'_>,
    aggregator: Option<&RegionAggregator>,
    request: &FieldRequest,
    time: usize,
) -> Result<FieldReport> {
    let resolved = resolver
        .resolve_named(&request.variable, time, request.level_hpa.map(Hectopascals))
        .with_context(|| format!("Failed to resolve '{}'", request.variable))?;

    let statistics = FieldStatistics::compute(&resolved.values);
    let anomaly = match (resolved.kind, statistics) {
        (FieldKind::SurfaceTemperature | FieldKind::Temperature, Some(stats)) => {
            classify_temperature_anomaly(stats.mean, resolved.level)
        }
        _ => None,
    };

    let regions = match aggregator {
        Some(aggregator) if request.all_regions || !request.regions.is_empty() => {
            summarize_regions(resolver, aggregator, &resolved, request)?
        }
        _ => Vec::new(),
    };

    debug!(
        variable = %resolved.kind,
        time = time,
        regions = regions.len(),
        "Built field report"
    );

    Ok(FieldReport {
        title: resolved.title(),
        unit: resolved.unit.symbol().to_string(),
        time_index: time,
        time: time_label(resolver.accessor().dataset(), time),
        missing_cells: resolved.missing_count(),
        statistics,
        anomaly,
        regions,
        next: None,
    })
}

fn summarize_regions(
    resolver: &VariableResolver<'_>,
    aggregator: &RegionAggregator,
    resolved: &ResolvedField,
    request: &FieldRequest,
) -> Result<Vec<Aggregation>> {
    let (lats, lons) = resolver.accessor().lat_lon(resolved.time_index)?;
    let field = resolved.values.view();

    if request.regions.is_empty() {
        return Ok(aggregator.summarize_all(field, lats.view(), lons.view())?);
    }

    request
        .regions
        .iter()
        .map(|name| Ok(aggregator.summarize(name, field, lats.view(), lons.view())?))
        .collect()
}

/// File name for an exported field report, e.g.
/// `Temperature_at_850_hPa_20240520_0600.json`. Datasets without time stamps
/// use the index instead (`..._t3.json`).
pub fn export_file_name(report: &FieldReport, dataset: &dyn Dataset) -> String {
    let stamp = dataset
        .times()
        .get(report.time_index)
        .map(ModelTime::file_stamp)
        .unwrap_or_else(|| format!("t{}", report.time_index));
    format!("{}_{}.json", report.title.trim().replace(' ', "_"), stamp)
}

/// Write a field report as JSON into `dir`. Returns the written path.
pub fn export_field(report: &FieldReport, dataset: &dyn Dataset, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create export directory {:?}", dir))?;
    let path = dir.join(export_file_name(report, dataset));
    let json = serde_json::to_string_pretty(report)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {:?}", path))?;
    info!(path = %path.display(), "Exported field report");
    Ok(path)
}

/// Describe the loaded regions.
pub fn regions(set: &RegionSet) -> RegionsReport {
    RegionsReport {
        regions: set
            .regions()
            .iter()
            .map(|r| RegionEntry {
                name: r.name.clone(),
                bbox: *r.bbox(),
                sub_regions: r.sub_regions.iter().map(|s| s.name.clone()).collect(),
            })
            .collect(),
    }
}

/// Where to take a sounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SoundingLocation {
    /// Middle of the grid.
    Center,
    GridPoint(GridPoint),
    /// Grid point nearest to a latitude/longitude.
    Nearest { lat: f64, lon: f64 },
}

/// Build a temperature/dewpoint profile at one location.
pub fn sounding(
    dataset: &dyn Dataset,
    config: &ExplorerConfig,
    time: usize,
    location: SoundingLocation,
) -> Result<SoundingReport> {
    let resolver = VariableResolver::with_config(dataset, config.resolver.clone());
    let (lats, lons) = resolver.accessor().lat_lon(time)?;

    let point = match location {
        SoundingLocation::Center => GridPoint::center_of(&resolver.accessor().grid_shape()?),
        SoundingLocation::GridPoint(point) => point,
        SoundingLocation::Nearest { lat, lon } => nearest_grid_point(&lats, &lons, lat, lon)
            .context("Grid has no valid coordinates")?,
    };

    let profile = resolver
        .profile(time, point)
        .with_context(|| format!("Failed to build sounding at {}", point))?;
    let lcl = profile.lcl();
    let parcel_c = profile.parcel_profile();
    let convective = profile.cape_cin();

    Ok(SoundingReport {
        time: time_label(dataset, time),
        latitude: lats.get((point.row, point.col)).copied().unwrap_or(f32::NAN) as f64,
        longitude: lons.get((point.row, point.col)).copied().unwrap_or(f32::NAN) as f64,
        profile,
        parcel_c,
        lcl,
        convective,
    })
}

/// Grid point whose coordinates are closest (in degrees) to `lat`/`lon`.
pub fn nearest_grid_point(lats: &Array2<f32>, lons: &Array2<f32>, lat: f64, lon: f64) -> Option<GridPoint> {
    lats.indexed_iter()
        .zip(lons.iter())
        .filter(|((_, la), lo)| la.is_finite() && lo.is_finite())
        .map(|(((row, col), la), lo)| {
            let d = (*la as f64 - lat).powi(2) + (*lo as f64 - lon).powi(2);
            (GridPoint::new(row, col), d)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(point, _)| point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use test_utils::SyntheticWrf;

    #[test]
    fn test_nearest_grid_point() {
        let lats = array![[0.0f32, 0.0], [1.0, 1.0]];
        let lons = array![[10.0f32, 11.0], [10.0, 11.0]];
        assert_eq!(nearest_grid_point(&lats, &lons, 0.9, 10.8), Some(GridPoint::new(1, 1)));
        assert_eq!(nearest_grid_point(&lats, &lons, -5.0, 0.0), Some(GridPoint::new(0, 0)));

        let nan = array![[f32::NAN]];
        assert_eq!(nearest_grid_point(&nan, &nan, 0.0, 0.0), None);
    }

    #[test]
    fn test_export_file_name() {
        let ds = SyntheticWrf::default().build().with_times(vec![
            ModelTime::parse("2024-05-20_00:00:00").unwrap(),
            ModelTime::parse("2024-05-20_06:00:00").unwrap(),
        ]);
        let config = ExplorerConfig::default();
        let request = FieldRequest {
            variable: "Temperature".to_string(),
            time: 1,
            level_hpa: Some(850.0),
            ..Default::default()
        };
        let report = field(&ds, &config, None, &request).unwrap();
        assert_eq!(export_file_name(&report, &ds), "Temperature_at_850_hPa_20240520_0600.json");

        let untimed = SyntheticWrf::default().build();
        assert_eq!(export_file_name(&report, &untimed), "Temperature_at_850_hPa_t1.json");
    }
}
