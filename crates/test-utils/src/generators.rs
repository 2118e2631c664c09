//! Synthetic WRF datasets for tests.
//!
//! [`SyntheticWrf`] produces an [`InMemoryDataset`] with the variable names,
//! dimension names and staggering of real `wrfout` files, filled with simple
//! predictable values so expected results can be computed by hand.

use ndarray::{Array, ArrayD, IxDyn};
use wrf_common::{InMemoryDataset, RawVariable};

/// Dimension names of a time-varying 2-D mass-point field.
pub const DIMS_2D: [&str; 3] = ["Time", "south_north", "west_east"];

/// Dimension names of a time-varying 3-D mass-point field.
pub const DIMS_3D: [&str; 4] = ["Time", "bottom_top", "south_north", "west_east"];

/// Dimension names of U (west_east staggered).
pub const DIMS_U: [&str; 4] = ["Time", "bottom_top", "south_north", "west_east_stag"];

/// Dimension names of V (south_north staggered).
pub const DIMS_V: [&str; 4] = ["Time", "bottom_top", "south_north_stag", "west_east"];

/// Builder for a small synthetic WRF domain.
///
/// Defaults:
/// - lat/lon grid starting at (-1.5, 36.5) with 0.5° spacing
/// - full pressure decreasing linearly from 1000 hPa to 200 hPa, identical
///   in every column
/// - θ perturbation 0 (θ = 300 K everywhere)
/// - U = 3 m/s, V = 4 m/s on all levels and at 10 m
/// - T2 = 295 K, Q2 = 0.012 kg/kg, RAINC = 1 mm, RAINNC = 2 mm
/// - RH = 80 - 5k %, QVAPOR = 0.01·(1 - k/nz) kg/kg
#[derive(Debug, Clone)]
pub struct SyntheticWrf {
    pub nt: usize,
    pub nz: usize,
    pub ny: usize,
    pub nx: usize,
    pub lat0: f32,
    pub lon0: f32,
    pub spacing: f32,
    pub surface_pressure_pa: f32,
    pub top_pressure_pa: f32,
    pub theta_perturbation: f32,
    pub u: f32,
    pub v: f32,
    omitted: Vec<String>,
}

impl Default for SyntheticWrf {
    fn default() -> Self {
        Self {
            nt: 2,
            nz: 5,
            ny: 4,
            nx: 6,
            lat0: -1.5,
            lon0: 36.5,
            spacing: 0.5,
            surface_pressure_pa: 100_000.0,
            top_pressure_pa: 20_000.0,
            theta_perturbation: 0.0,
            u: 3.0,
            v: 4.0,
            omitted: Vec::new(),
        }
    }
}

impl SyntheticWrf {
    pub fn new(nt: usize, nz: usize, ny: usize, nx: usize) -> Self {
        Self {
            nt,
            nz,
            ny,
            nx,
            ..Self::default()
        }
    }

    /// Leave a variable out of the generated dataset.
    pub fn without(mut self, name: &str) -> Self {
        self.omitted.push(name.to_string());
        self
    }

    /// Set the potential temperature perturbation (θ - 300 K).
    pub fn with_theta_perturbation(mut self, value: f32) -> Self {
        self.theta_perturbation = value;
        self
    }

    /// Set the wind components used for both 10 m and model levels.
    pub fn with_wind(mut self, u: f32, v: f32) -> Self {
        self.u = u;
        self.v = v;
        self
    }

    /// Set the pressure range of every column.
    pub fn with_pressure_range(mut self, surface_pa: f32, top_pa: f32) -> Self {
        self.surface_pressure_pa = surface_pa;
        self.top_pressure_pa = top_pa;
        self
    }

    /// Full pressure (Pa) at model level `k`.
    pub fn pressure_at_level(&self, k: usize) -> f32 {
        if self.nz < 2 {
            return self.surface_pressure_pa;
        }
        let frac = k as f32 / (self.nz - 1) as f32;
        self.surface_pressure_pa - (self.surface_pressure_pa - self.top_pressure_pa) * frac
    }

    /// Build the dataset.
    pub fn build(&self) -> InMemoryDataset {
        let (nt, nz, ny, nx) = (self.nt, self.nz, self.ny, self.nx);
        let mut ds = InMemoryDataset::new();

        let lat0 = self.lat0;
        let lon0 = self.lon0;
        let spacing = self.spacing;
        self.put(&mut ds, "XLAT", &DIMS_2D, field_2d(nt, ny, nx, |_, j, _| lat0 + j as f32 * spacing), "degree_north");
        self.put(&mut ds, "XLONG", &DIMS_2D, field_2d(nt, ny, nx, |_, _, i| lon0 + i as f32 * spacing), "degree_east");

        self.put(&mut ds, "T2", &DIMS_2D, field_2d(nt, ny, nx, |_, _, _| 295.0), "K");
        self.put(&mut ds, "Q2", &DIMS_2D, field_2d(nt, ny, nx, |_, _, _| 0.012), "kg kg-1");
        self.put(&mut ds, "U10", &DIMS_2D, field_2d(nt, ny, nx, |_, _, _| self.u), "m s-1");
        self.put(&mut ds, "V10", &DIMS_2D, field_2d(nt, ny, nx, |_, _, _| self.v), "m s-1");
        self.put(&mut ds, "RAINC", &DIMS_2D, field_2d(nt, ny, nx, |_, _, _| 1.0), "mm");
        self.put(&mut ds, "RAINNC", &DIMS_2D, field_2d(nt, ny, nx, |_, _, _| 2.0), "mm");

        let pressures: Vec<f32> = (0..nz).map(|k| self.pressure_at_level(k)).collect();
        self.put(&mut ds, "PB", &DIMS_3D, field_3d(nt, nz, ny, nx, |_, k, _, _| pressures[k]), "Pa");
        self.put(&mut ds, "P", &DIMS_3D, field_3d(nt, nz, ny, nx, |_, _, _, _| 0.0), "Pa");

        let theta = self.theta_perturbation;
        self.put(&mut ds, "T", &DIMS_3D, field_3d(nt, nz, ny, nx, |_, _, _, _| theta), "K");
        self.put(
            &mut ds,
            "QVAPOR",
            &DIMS_3D,
            field_3d(nt, nz, ny, nx, |_, k, _, _| 0.01 * (1.0 - k as f32 / nz as f32)),
            "kg kg-1",
        );
        self.put(&mut ds, "RH", &DIMS_3D, field_3d(nt, nz, ny, nx, |_, k, _, _| 80.0 - 5.0 * k as f32), "%");

        self.put(&mut ds, "U", &DIMS_U, field_3d(nt, nz, ny, nx + 1, |_, _, _, _| self.u), "m s-1");
        self.put(&mut ds, "V", &DIMS_V, field_3d(nt, nz, ny + 1, nx, |_, _, _, _| self.v), "m s-1");

        ds
    }

    fn put(&self, ds: &mut InMemoryDataset, name: &str, dims: &[&str], data: ArrayD<f32>, units: &str) {
        if self.omitted.iter().any(|n| n == name) {
            return;
        }
        let variable = RawVariable::new(dims.to_vec(), data)
            .expect("synthetic variable dims match rank")
            .with_units(units);
        ds.insert(name, variable);
    }
}

/// Build a `(Time, south_north, west_east)` array from a generator.
pub fn field_2d(
    nt: usize,
    ny: usize,
    nx: usize,
    f: impl Fn(usize, usize, usize) -> f32,
) -> ArrayD<f32> {
    Array::from_shape_fn(IxDyn(&[nt, ny, nx]), |idx| f(idx[0], idx[1], idx[2]))
}

/// Build a `(Time, bottom_top, south_north, west_east)` array from a generator.
pub fn field_3d(
    nt: usize,
    nz: usize,
    ny: usize,
    nx: usize,
    f: impl Fn(usize, usize, usize, usize) -> f32,
) -> ArrayD<f32> {
    Array::from_shape_fn(IxDyn(&[nt, nz, ny, nx]), |idx| {
        f(idx[0], idx[1], idx[2], idx[3])
    })
}

/// Replace a variable's values while keeping its dimension names.
pub fn replace_values(ds: &mut InMemoryDataset, name: &str, data: ArrayD<f32>) {
    use wrf_common::Dataset;
    let dims = ds
        .variable(name)
        .map(|v| v.dims.clone())
        .expect("variable to replace exists");
    let variable = RawVariable::new(dims, data).expect("replacement dims match rank");
    ds.insert(name, variable);
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrf_common::Dataset;

    #[test]
    fn test_default_shapes() {
        let ds = SyntheticWrf::new(2, 5, 4, 6).build();
        assert_eq!(ds.variable("T").unwrap().shape(), &[2, 5, 4, 6]);
        assert_eq!(ds.variable("U").unwrap().shape(), &[2, 5, 4, 7]);
        assert_eq!(ds.variable("V").unwrap().shape(), &[2, 5, 5, 6]);
        assert_eq!(ds.variable("XLAT").unwrap().shape(), &[2, 4, 6]);
        assert_eq!(ds.num_times(), 2);
    }

    #[test]
    fn test_without_variable() {
        let ds = SyntheticWrf::default().without("V10").build();
        assert!(ds.has_variable("U10"));
        assert!(!ds.has_variable("V10"));
    }

    #[test]
    fn test_pressure_levels_decrease() {
        let synth = SyntheticWrf::new(1, 5, 2, 2);
        assert_eq!(synth.pressure_at_level(0), 100_000.0);
        assert_eq!(synth.pressure_at_level(4), 20_000.0);
        assert_eq!(synth.pressure_at_level(1), 80_000.0);
    }
}
