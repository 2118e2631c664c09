//! Typed slice access over a WRF dataset.

use ndarray::{Array2, Array3, ArrayD, Axis, Ix2, Ix3, Zip};
use tracing::debug;
use wrf_common::{Dataset, GridShape, Pascals, RawVariable, Stagger, WrfError, WrfResult};

use crate::destagger::StaggeredField;
use crate::variables::{AvailableVariable, FieldKind};

/// Read-only view of a dataset that extracts per-time, per-level slices.
///
/// The accessor borrows the caller's dataset; it never caches or owns data.
#[derive(Clone, Copy)]
pub struct GridAccessor<'a> {
    dataset: &'a dyn Dataset,
}

impl<'a> GridAccessor<'a> {
    pub fn new(dataset: &'a dyn Dataset) -> Self {
        Self { dataset }
    }

    pub fn dataset(&self) -> &'a dyn Dataset {
        self.dataset
    }

    /// Number of time steps in the dataset.
    pub fn num_times(&self) -> usize {
        self.dataset.num_times()
    }

    /// Fail with `TimeIndexOutOfRange` unless `time` is a valid step.
    pub fn check_time(&self, time: usize) -> WrfResult<()> {
        let len = self.num_times();
        if time >= len {
            return Err(WrfError::TimeIndexOutOfRange { index: time, len });
        }
        Ok(())
    }

    fn raw(&self, name: &str) -> WrfResult<&'a RawVariable> {
        self.dataset
            .variable(name)
            .ok_or_else(|| WrfError::missing_variable(name))
    }

    /// Extract one time step of `name`, optionally reduced to one model level.
    ///
    /// Variables without a `Time` dimension are returned whole regardless of
    /// `time`. A level index on a variable with no vertical dimension fails
    /// with `LevelIndexOutOfRange`.
    pub fn slice(&self, name: &str, time: usize, level: Option<usize>) -> WrfResult<ArrayD<f32>> {
        let var = self.raw(name)?;
        let mut view = var.data.view();
        let mut dims: &[String] = var.dims.as_slice();

        if var.is_time_varying() {
            let len = view.len_of(Axis(0));
            if time >= len {
                return Err(WrfError::TimeIndexOutOfRange { index: time, len });
            }
            view = view.index_axis_move(Axis(0), time);
            dims = &dims[1..];
        }

        if let Some(k) = level {
            let axis = vertical_axis(dims).ok_or_else(|| WrfError::LevelIndexOutOfRange {
                variable: name.to_string(),
                index: k,
                len: 0,
            })?;
            let len = view.len_of(Axis(axis));
            if k >= len {
                return Err(WrfError::LevelIndexOutOfRange {
                    variable: name.to_string(),
                    index: k,
                    len,
                });
            }
            view = view.index_axis_move(Axis(axis), k);
        }

        Ok(view.to_owned())
    }

    /// A 2-D `(south_north, west_east)` slice.
    pub fn slice2d(&self, name: &str, time: usize) -> WrfResult<Array2<f32>> {
        let data = self.slice(name, time, None)?;
        let ndim = data.ndim();
        data.into_dimensionality::<Ix2>().map_err(|_| {
            WrfError::shape_mismatch(format!("'{}' has {} spatial dimensions, expected 2", name, ndim))
        })
    }

    /// A 3-D `(bottom_top, south_north, west_east)` slice, still on the
    /// variable's native (possibly staggered) grid.
    pub fn slice3d(&self, name: &str, time: usize) -> WrfResult<Array3<f32>> {
        let data = self.slice(name, time, None)?;
        let ndim = data.ndim();
        data.into_dimensionality::<Ix3>().map_err(|_| {
            WrfError::shape_mismatch(format!("'{}' has {} spatial dimensions, expected 3", name, ndim))
        })
    }

    /// A staggered 3-D slice, usable only after destaggering.
    pub fn staggered3d(&self, name: &str, time: usize) -> WrfResult<StaggeredField> {
        let stagger = self.stagger_of(name)?;
        let data = self.slice3d(name, time)?;
        StaggeredField::new(name, data, stagger)
    }

    /// A 3-D slice on the mass grid, destaggered if the variable is staggered.
    pub fn mass3d(&self, name: &str, time: usize) -> WrfResult<Array3<f32>> {
        if self.stagger_of(name)?.is_staggered() {
            debug!(variable = name, "Destaggering to mass grid");
            return self.staggered3d(name, time)?.destagger();
        }
        self.slice3d(name, time)
    }

    /// Which axis `name` is staggered along.
    ///
    /// Dimension names decide when they carry a `_stag` suffix; otherwise the
    /// spatial shape is compared against the mass grid.
    pub fn stagger_of(&self, name: &str) -> WrfResult<Stagger> {
        let var = self.raw(name)?;
        let by_name = Stagger::from_dimension_names(var.dims.as_slice());
        if by_name.is_staggered() {
            return Ok(by_name);
        }

        let spatial: Vec<usize> = if var.is_time_varying() {
            var.shape()[1..].to_vec()
        } else {
            var.shape().to_vec()
        };
        if spatial.len() != 3 {
            return Ok(Stagger::None);
        }

        let grid = match self.grid_shape() {
            Ok(grid) => grid,
            Err(_) => return Ok(Stagger::None),
        };
        let stagger = [Stagger::WestEast, Stagger::SouthNorth, Stagger::BottomTop]
            .into_iter()
            .find(|s| grid.nz > 0 && spatial == grid.staggered(*s))
            .unwrap_or(Stagger::None);
        Ok(stagger)
    }

    /// Shape of the mass-point grid, taken from `T` or, for surface-only
    /// datasets, from `XLAT`/`T2` with no vertical levels.
    pub fn grid_shape(&self) -> WrfResult<GridShape> {
        if let Some(var) = self.dataset.variable("T") {
            if let [.., nz, ny, nx] = var.shape() {
                return Ok(GridShape::new(*nz, *ny, *nx));
            }
        }

        for name in ["XLAT", "T2"] {
            if let Some(var) = self.dataset.variable(name) {
                if let [.., ny, nx] = var.shape() {
                    return Ok(GridShape::new(0, *ny, *nx));
                }
            }
        }

        Err(WrfError::missing_variable("XLAT"))
    }

    /// Full pressure `P + PB` in hPa on the mass grid.
    pub fn pressure_hpa(&self, time: usize) -> WrfResult<Array3<f32>> {
        let perturbation = self.slice3d("P", time)?;
        let base = self.slice3d("PB", time)?;
        if perturbation.dim() != base.dim() {
            return Err(WrfError::shape_mismatch(format!(
                "P {:?} and PB {:?} differ in shape",
                perturbation.dim(),
                base.dim()
            )));
        }

        Ok(Zip::from(&perturbation)
            .and(&base)
            .map_collect(|&p, &pb| Pascals((p + pb) as f64).to_hectopascals().value() as f32))
    }

    /// Latitude and longitude of every mass point.
    pub fn lat_lon(&self, time: usize) -> WrfResult<(Array2<f32>, Array2<f32>)> {
        let lats = self.slice2d("XLAT", time)?;
        let lons = self.slice2d("XLONG", time)?;
        if lats.dim() != lons.dim() {
            return Err(WrfError::shape_mismatch(format!(
                "XLAT {:?} and XLONG {:?} differ in shape",
                lats.dim(),
                lons.dim()
            )));
        }
        Ok((lats, lons))
    }

    /// Every variable the dataset can produce, in listing order.
    pub fn list_available(&self) -> Vec<AvailableVariable> {
        FieldKind::ALL
            .iter()
            .filter(|kind| kind.is_available(self.dataset))
            .map(|&kind| AvailableVariable::from(kind))
            .collect()
    }
}

/// Index of the vertical dimension within `dims` (time already removed).
fn vertical_axis(dims: &[String]) -> Option<usize> {
    dims.iter().position(|d| d.starts_with("bottom_top"))
}
