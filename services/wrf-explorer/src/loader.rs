//! Dataset and region file loading.
//!
//! Datasets are read fully into an [`InMemoryDataset`]. Two formats are
//! supported: JSON snapshots (always) and `wrfout` NetCDF files (with the
//! `netcdf` feature).

use anyhow::{Context, Result};
use region_stats::{AggregationConfig, RegionSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use wrf_common::{Dataset, InMemoryDataset};

/// WRF variables the resolver can use. Everything else in a `wrfout` file is
/// skipped at load time.
pub const WRF_VARIABLES: [&str; 16] = [
    "XLAT", "XLONG", "T2", "Q2", "RH2", "U10", "V10", "RAINC", "RAINNC", "P", "PB", "T", "QVAPOR",
    "RH", "U", "V",
];

/// Input format of a dataset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    JsonSnapshot,
    NetCdf,
}

impl DatasetFormat {
    /// Guess the format from the file name. `wrfout_d01_2024-05-20_00:00:00`
    /// files often have no extension and are treated as NetCDF.
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DatasetFormat::JsonSnapshot,
            _ => DatasetFormat::NetCdf,
        }
    }
}

/// Load a dataset file.
pub fn load_dataset(path: &Path) -> Result<InMemoryDataset> {
    let dataset = match DatasetFormat::detect(path) {
        DatasetFormat::JsonSnapshot => load_json_snapshot(path)?,
        DatasetFormat::NetCdf => load_netcdf(path)?,
    };

    info!(
        path = %path.display(),
        variables = dataset.len(),
        times = dataset.num_times(),
        "Loaded dataset"
    );

    Ok(dataset)
}

fn load_json_snapshot(path: &Path) -> Result<InMemoryDataset> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset snapshot from {:?}", path))?;
    InMemoryDataset::from_json_str(&content)
        .with_context(|| format!("Failed to parse dataset snapshot {:?}", path))
}

#[cfg(feature = "netcdf")]
fn load_netcdf(path: &Path) -> Result<InMemoryDataset> {
    wrfout::read(path)
}

#[cfg(not(feature = "netcdf"))]
fn load_netcdf(path: &Path) -> Result<InMemoryDataset> {
    anyhow::bail!(
        "{:?} looks like a NetCDF file; rebuild with `--features netcdf` or convert it to a JSON snapshot",
        path
    )
}

/// Load regions from one or more GeoJSON files.
pub fn load_regions(paths: &[PathBuf], config: &AggregationConfig) -> Result<RegionSet> {
    anyhow::ensure!(!paths.is_empty(), "No region files given");

    let documents = paths
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("Failed to read region file {:?}", p)))
        .collect::<Result<Vec<_>>>()?;
    let refs: Vec<&str> = documents.iter().map(String::as_str).collect();

    let regions = RegionSet::from_geojson_strs(&refs, config)
        .with_context(|| format!("Failed to load regions from {:?}", paths))?;

    info!(files = paths.len(), regions = regions.len(), "Loaded regions");
    Ok(regions)
}

#[cfg(feature = "netcdf")]
mod wrfout {
    use anyhow::{Context, Result};
    use chrono::Duration;
    use ndarray::{ArrayD, IxDyn};
    use std::path::Path;
    use tracing::debug;
    use wrf_common::{InMemoryDataset, ModelTime, RawVariable};

    use super::WRF_VARIABLES;

    /// Read the resolver's variables and the valid times from a `wrfout` file.
    pub fn read(path: &Path) -> Result<InMemoryDataset> {
        let file = netcdf::open(path).with_context(|| format!("Failed to open NetCDF file {:?}", path))?;
        let mut dataset = InMemoryDataset::new();

        for name in WRF_VARIABLES {
            let Some(var) = file.variable(name) else {
                debug!(variable = name, "Variable not in file");
                continue;
            };
            let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
            let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
            let values: Vec<f32> = var
                .get_values(..)
                .with_context(|| format!("Failed to read {}", name))?;
            let data = ArrayD::from_shape_vec(IxDyn(&shape), values)
                .with_context(|| format!("{} does not match its dimensions", name))?;

            let mut raw = RawVariable::new(dims, data)?;
            if let Some(units) = string_attr(var.attribute("units")) {
                raw = raw.with_units(units);
            }
            dataset.insert(name, raw);
        }

        Ok(dataset.with_times(read_times(&file)))
    }

    /// Valid times from the simulation start date plus `XTIME` minutes.
    fn read_times(file: &netcdf::File) -> Vec<ModelTime> {
        let Some(start) = string_attr(file.attribute("SIMULATION_START_DATE"))
            .or_else(|| string_attr(file.attribute("START_DATE")))
            .and_then(|s| ModelTime::parse(&s).ok())
        else {
            return Vec::new();
        };
        let Some(minutes) = file
            .variable("XTIME")
            .and_then(|v| v.get_values::<f64, _>(..).ok())
        else {
            return vec![start];
        };
        minutes
            .into_iter()
            .map(|m| ModelTime(start.0 + Duration::seconds((m * 60.0).round() as i64)))
            .collect()
    }

    fn string_attr(attr: Option<netcdf::Attribute>) -> Option<String> {
        match attr?.value().ok()? {
            netcdf::AttributeValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use test_utils::regions::synthetic_counties;
    use test_utils::SyntheticWrf;

    #[test]
    fn test_detect_format() {
        assert_eq!(DatasetFormat::detect(Path::new("run.json")), DatasetFormat::JsonSnapshot);
        assert_eq!(DatasetFormat::detect(Path::new("wrfout_d01.nc")), DatasetFormat::NetCdf);
        assert_eq!(
            DatasetFormat::detect(Path::new("wrfout_d01_2024-05-20_00:00:00")),
            DatasetFormat::NetCdf
        );
    }

    #[test]
    fn test_load_json_snapshot() {
        let ds = SyntheticWrf::default().build();
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(ds.to_json_string().unwrap().as_bytes()).unwrap();

        let loaded = load_dataset(file.path()).unwrap();
        assert_eq!(loaded.len(), ds.len());
        assert_eq!(loaded.num_times(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_dataset(Path::new("/nonexistent/run.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read dataset snapshot"));
    }

    #[test]
    fn test_load_regions_from_files() {
        let dir = test_utils::temp_test_dir_with_prefix("regions");
        let path = dir.path().join("counties.geojson");
        fs::write(&path, synthetic_counties()).unwrap();

        let regions = load_regions(&[path], &AggregationConfig::default()).unwrap();
        assert_eq!(regions.names(), vec!["Nairobi", "Kajiado"]);
    }

    #[test]
    fn test_load_regions_requires_files() {
        assert!(load_regions(&[], &AggregationConfig::default()).is_err());
    }

    #[cfg(feature = "netcdf")]
    #[test]
    fn test_read_real_wrfout() {
        let path = test_utils::require_test_file!("wrfout_d01_sample.nc");
        let ds = load_dataset(&path).unwrap();
        assert!(ds.has_variable("XLAT"));
        assert!(ds.has_variable("T2"));
        assert_eq!(ds.times().len(), ds.num_times());
    }
}
