//! Summary statistics of a 2-D field over named regions.

use std::sync::Arc;

use ndarray::{ArrayView2, Zip};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;
use wrf_common::{WrfError, WrfResult};

use crate::config::AggregationConfig;
use crate::mask::RegionMask;
use crate::region::{Region, RegionSet};

/// Mean, minimum and maximum of the samples inside a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub region: String,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Number of finite samples that fell inside the region.
    pub count: usize,
}

/// Outcome of aggregating a field over one region.
///
/// A region that contains no grid samples (too small for the grid spacing,
/// or outside the domain) is a normal result, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Aggregation {
    Summary(RegionSummary),
    NoSamplesFound { region: String },
}

impl Aggregation {
    pub fn region(&self) -> &str {
        match self {
            Aggregation::Summary(summary) => &summary.region,
            Aggregation::NoSamplesFound { region } => region,
        }
    }

    pub fn summary(&self) -> Option<&RegionSummary> {
        match self {
            Aggregation::Summary(summary) => Some(summary),
            Aggregation::NoSamplesFound { .. } => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Aggregation::NoSamplesFound { .. })
    }
}

/// Running sum/min/max over accepted samples.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SampleAccumulator {
    sum: f64,
    min: f64,
    max: f64,
    count: usize,
}

impl Default for SampleAccumulator {
    fn default() -> Self {
        Self {
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            count: 0,
        }
    }
}

impl SampleAccumulator {
    /// Add a sample. Non-finite values are ignored.
    pub(crate) fn push(&mut self, value: f32) {
        if !value.is_finite() {
            return;
        }
        let value = value as f64;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.count += 1;
    }

    pub(crate) fn finish(self, region: &str, config: &AggregationConfig) -> Aggregation {
        if self.count == 0 {
            debug!(region = %region, "No grid samples inside region");
            return Aggregation::NoSamplesFound {
                region: region.to_string(),
            };
        }
        Aggregation::Summary(RegionSummary {
            region: region.to_string(),
            mean: config.round(self.sum / self.count as f64),
            min: config.round(self.min),
            max: config.round(self.max),
            count: self.count,
        })
    }
}

/// Check that a field and its coordinate arrays share one grid.
pub(crate) fn check_grid(
    field: &ArrayView2<f32>,
    lats: &ArrayView2<f32>,
    lons: &ArrayView2<f32>,
) -> WrfResult<()> {
    if field.dim() != lats.dim() || field.dim() != lons.dim() {
        return Err(WrfError::shape_mismatch(format!(
            "field {:?}, latitudes {:?}, longitudes {:?}",
            field.dim(),
            lats.dim(),
            lons.dim()
        )));
    }
    Ok(())
}

/// Aggregates 2-D fields over the regions of a shared [`RegionSet`].
#[derive(Debug, Clone)]
pub struct RegionAggregator {
    regions: Arc<RegionSet>,
    config: AggregationConfig,
}

impl RegionAggregator {
    pub fn new(regions: Arc<RegionSet>) -> Self {
        Self::with_config(regions, AggregationConfig::default())
    }

    pub fn with_config(regions: Arc<RegionSet>, config: AggregationConfig) -> Self {
        Self { regions, config }
    }

    pub fn regions(&self) -> &RegionSet {
        &self.regions
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Summarize `field` over the region or sub-region called `region_name`
    /// (case-insensitive).
    pub fn summarize(
        &self,
        region_name: &str,
        field: ArrayView2<f32>,
        lats: ArrayView2<f32>,
        lons: ArrayView2<f32>,
    ) -> WrfResult<Aggregation> {
        let region = self.regions.get(region_name)?;
        check_grid(&field, &lats, &lons)?;
        Ok(self.summarize_region(region, &field, &lats, &lons))
    }

    /// Summarize `field` over every top-level region, in region order.
    pub fn summarize_all(
        &self,
        field: ArrayView2<f32>,
        lats: ArrayView2<f32>,
        lons: ArrayView2<f32>,
    ) -> WrfResult<Vec<Aggregation>> {
        check_grid(&field, &lats, &lons)?;

        let results: Vec<Aggregation> = self
            .regions
            .regions()
            .par_iter()
            .map(|region| self.summarize_region(region, &field, &lats, &lons))
            .collect();

        debug!(
            regions = results.len(),
            empty = results.iter().filter(|a| a.is_empty()).count(),
            "Summarized all regions"
        );

        Ok(results)
    }

    /// Rasterize a region's membership on this grid for repeated use.
    pub fn build_mask(
        &self,
        region_name: &str,
        lats: ArrayView2<f32>,
        lons: ArrayView2<f32>,
    ) -> WrfResult<RegionMask> {
        let region = self.regions.get(region_name)?;
        RegionMask::build(region, lats, lons)
    }

    fn summarize_region(
        &self,
        region: &Region,
        field: &ArrayView2<f32>,
        lats: &ArrayView2<f32>,
        lons: &ArrayView2<f32>,
    ) -> Aggregation {
        let mut acc = SampleAccumulator::default();
        Zip::from(field).and(lats).and(lons).for_each(|&value, &lat, &lon| {
            if region.contains(lon as f64, lat as f64) {
                acc.push(value);
            }
        });
        acc.finish(&region.name, &self.config)
    }
}
