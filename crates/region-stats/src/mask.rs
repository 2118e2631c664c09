//! Pre-rasterized region membership.
//!
//! Point-in-polygon tests dominate aggregation cost. A [`RegionMask`] runs
//! them once for a region on a given grid, then summarizes any number of
//! fields (time steps, variables) on that grid with a plain masked fold.

use ndarray::{Array2, ArrayView2, Zip};
use serde::Serialize;
use tracing::debug;
use wrf_common::{WrfError, WrfResult};

use crate::aggregate::{check_grid, Aggregation, SampleAccumulator};
use crate::config::AggregationConfig;
use crate::region::Region;

/// Membership of each grid cell in one region.
#[derive(Debug, Clone, Serialize)]
pub struct RegionMask {
    region: String,
    #[serde(skip)]
    inside: Array2<bool>,
    cells: usize,
}

impl RegionMask {
    /// Test every (lat, lon) grid point against `region`, in parallel.
    pub fn build(region: &Region, lats: ArrayView2<f32>, lons: ArrayView2<f32>) -> WrfResult<Self> {
        if lats.dim() != lons.dim() {
            return Err(WrfError::shape_mismatch(format!(
                "latitudes {:?}, longitudes {:?}",
                lats.dim(),
                lons.dim()
            )));
        }

        let inside = Zip::from(&lats)
            .and(&lons)
            .par_map_collect(|&lat, &lon| region.contains(lon as f64, lat as f64));
        let cells = inside.iter().filter(|&&m| m).count();

        debug!(
            region = %region.name,
            cells = cells,
            grid = ?inside.dim(),
            "Built region mask"
        );

        Ok(Self {
            region: region.name.clone(),
            inside,
            cells,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Number of grid cells inside the region.
    pub fn cell_count(&self) -> usize {
        self.cells
    }

    pub fn dim(&self) -> (usize, usize) {
        self.inside.dim()
    }

    pub fn is_inside(&self, row: usize, col: usize) -> bool {
        self.inside.get((row, col)).copied().unwrap_or(false)
    }

    /// Summarize a field on the grid this mask was built for.
    pub fn summarize(&self, field: ArrayView2<f32>, config: &AggregationConfig) -> WrfResult<Aggregation> {
        if field.dim() != self.inside.dim() {
            return Err(WrfError::shape_mismatch(format!(
                "field {:?}, mask {:?}",
                field.dim(),
                self.inside.dim()
            )));
        }

        let mut acc = SampleAccumulator::default();
        Zip::from(&field).and(&self.inside).for_each(|&value, &inside| {
            if inside {
                acc.push(value);
            }
        });
        Ok(acc.finish(&self.region, config))
    }

    /// Summarize a field with its coordinates, checking the grid matches.
    pub fn summarize_on(
        &self,
        field: ArrayView2<f32>,
        lats: ArrayView2<f32>,
        lons: ArrayView2<f32>,
        config: &AggregationConfig,
    ) -> WrfResult<Aggregation> {
        check_grid(&field, &lats, &lons)?;
        self.summarize(field, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn left_half() -> Region {
        Region::from_wkt("Left", "POLYGON((0 0, 1 0, 1 2, 0 2, 0 0))").unwrap()
    }

    #[test]
    fn test_mask_matches_point_tests() {
        let lats = array![[0.5f32, 0.5, 0.5], [1.5, 1.5, 1.5]];
        let lons = array![[0.5f32, 1.0, 1.5], [0.5, 1.0, 1.5]];
        let mask = RegionMask::build(&left_half(), lats.view(), lons.view()).unwrap();

        assert_eq!(mask.cell_count(), 4);
        assert!(mask.is_inside(0, 1));
        assert!(!mask.is_inside(1, 2));
        assert!(!mask.is_inside(5, 5));
    }

    #[test]
    fn test_mask_reused_across_fields() {
        let lats = array![[0.5f32, 0.5], [1.5, 1.5]];
        let lons = array![[0.5f32, 1.5], [0.5, 1.5]];
        let mask = RegionMask::build(&left_half(), lats.view(), lons.view()).unwrap();
        let config = AggregationConfig::default();

        let first = mask.summarize(array![[1.0f32, 100.0], [3.0, 100.0]].view(), &config).unwrap();
        let second = mask.summarize(array![[10.0f32, 0.0], [f32::NAN, 0.0]].view(), &config).unwrap();

        assert_eq!(first.summary().unwrap().mean, 2.0);
        assert_eq!(second.summary().unwrap().count, 1);
        assert_eq!(second.summary().unwrap().max, 10.0);
    }

    #[test]
    fn test_empty_mask() {
        let lats = array![[5.0f32]];
        let lons = array![[5.0f32]];
        let mask = RegionMask::build(&left_half(), lats.view(), lons.view()).unwrap();
        let agg = mask.summarize(array![[1.0f32]].view(), &AggregationConfig::default()).unwrap();
        assert!(agg.is_empty());
    }

    #[test]
    fn test_field_shape_must_match_mask() {
        let lats = array![[0.5f32]];
        let lons = array![[0.5f32]];
        let mask = RegionMask::build(&left_half(), lats.view(), lons.view()).unwrap();
        let err = mask
            .summarize(array![[1.0f32, 2.0]].view(), &AggregationConfig::default())
            .unwrap_err();
        assert!(matches!(err, WrfError::ShapeMismatch(_)));
    }
}
