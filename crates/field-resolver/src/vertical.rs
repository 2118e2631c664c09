//! Interpolation of 3-D model-level fields onto a pressure surface.
//!
//! WRF levels are terrain-following, so a pressure surface cuts through
//! different model levels in different columns. Every column is therefore
//! interpolated against its own pressure profile.

use ndarray::{s, Array2, ArrayView1, ArrayView3, Axis, Zip};
use serde::{Deserialize, Serialize};
use wrf_common::{Hectopascals, WrfError, WrfResult};

/// Interpolation between the two model levels that bracket the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalMethod {
    /// Linear in pressure.
    #[default]
    Linear,
    /// Linear in ln(pressure).
    LogPressure,
}

impl VerticalMethod {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "log" | "logp" | "log_pressure" | "log-pressure" => Self::LogPressure,
            _ => Self::Linear,
        }
    }
}

impl std::fmt::Display for VerticalMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::LogPressure => write!(f, "log_pressure"),
        }
    }
}

/// Interpolate `field` onto the `level` pressure surface.
///
/// `field` and `pressure` are `(bottom_top, south_north, west_east)` arrays of
/// the same shape, with `pressure` in hPa. Every column must hold finite,
/// strictly monotonic pressures, and `level` must lie within the overall
/// pressure range. Columns whose own range does not contain `level` (below
/// ground or above the model top) yield NaN.
pub fn interpolate_to_level(
    field: ArrayView3<'_, f32>,
    pressure: ArrayView3<'_, f32>,
    level: Hectopascals,
    method: VerticalMethod,
) -> WrfResult<Array2<f32>> {
    if field.shape() != pressure.shape() {
        return Err(WrfError::shape_mismatch(format!(
            "field shape {:?} does not match pressure shape {:?}",
            field.shape(),
            pressure.shape()
        )));
    }

    let (nz, ny, nx) = field.dim();
    if nz == 0 {
        return Err(WrfError::shape_mismatch("field has no vertical levels"));
    }

    for row in 0..ny {
        for col in 0..nx {
            check_column(pressure.slice(s![.., row, col]), method)
                .map_err(|reason| WrfError::invalid_profile(row, col, reason))?;
        }
    }

    let (min, max) = pressure
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &p| {
            (lo.min(p as f64), hi.max(p as f64))
        });

    let target = level.value();
    if !target.is_finite() || target < min || target > max {
        return Err(WrfError::LevelOutOfRange {
            level_hpa: target,
            min_hpa: min,
            max_hpa: max,
        });
    }

    let mut out = Array2::<f32>::from_elem((ny, nx), f32::NAN);
    Zip::from(&mut out)
        .and(field.lanes(Axis(0)))
        .and(pressure.lanes(Axis(0)))
        .par_for_each(|cell, values, pressures| {
            *cell = interpolate_column(values, pressures, target, method);
        });

    Ok(out)
}

/// Interpolate a single column to `target` (hPa).
///
/// Returns NaN when no pair of adjacent levels brackets the target.
pub fn interpolate_column(
    values: ArrayView1<'_, f32>,
    pressures: ArrayView1<'_, f32>,
    target: f64,
    method: VerticalMethod,
) -> f32 {
    let n = pressures.len().min(values.len());
    if n == 1 && pressures[0] as f64 == target {
        return values[0];
    }

    for k in 0..n.saturating_sub(1) {
        let p0 = pressures[k] as f64;
        let p1 = pressures[k + 1] as f64;
        let (lo, hi) = if p0 <= p1 { (p0, p1) } else { (p1, p0) };
        if target < lo || target > hi {
            continue;
        }

        let v0 = values[k] as f64;
        let v1 = values[k + 1] as f64;
        if target == p0 {
            return values[k];
        }
        if target == p1 {
            return values[k + 1];
        }

        let weight = match method {
            VerticalMethod::Linear => (target - p0) / (p1 - p0),
            VerticalMethod::LogPressure => (target.ln() - p0.ln()) / (p1.ln() - p0.ln()),
        };
        return (v0 + (v1 - v0) * weight) as f32;
    }

    f32::NAN
}

/// Check that a column's pressures are finite and strictly monotonic.
fn check_column(column: ArrayView1<'_, f32>, method: VerticalMethod) -> Result<(), String> {
    if let Some(k) = column.iter().position(|p| !p.is_finite()) {
        return Err(format!("non-finite pressure at level {}", k));
    }

    if method == VerticalMethod::LogPressure {
        if let Some(k) = column.iter().position(|&p| p <= 0.0) {
            return Err(format!("non-positive pressure at level {}", k));
        }
    }

    if column.len() < 2 {
        return Ok(());
    }

    let decreasing = column[1] < column[0];
    for k in 1..column.len() {
        let ok = if decreasing {
            column[k] < column[k - 1]
        } else {
            column[k] > column[k - 1]
        };
        if !ok {
            return Err(format!(
                "pressure not strictly monotonic between levels {} and {}",
                k - 1,
                k
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array3};

    /// A 5-level column of identical pressures in every cell.
    fn uniform_pressure(ny: usize, nx: usize) -> Array3<f32> {
        let levels = [1000.0f32, 900.0, 800.0, 600.0, 400.0];
        Array3::from_shape_fn((levels.len(), ny, nx), |(k, _, _)| levels[k])
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!(VerticalMethod::from_str("LOG"), VerticalMethod::LogPressure);
        assert_eq!(VerticalMethod::from_str("log_pressure"), VerticalMethod::LogPressure);
        assert_eq!(VerticalMethod::from_str("linear"), VerticalMethod::Linear);
        assert_eq!(VerticalMethod::from_str("whatever"), VerticalMethod::Linear);
    }

    #[test]
    fn test_linear_exact_value() {
        let pressure = uniform_pressure(2, 3);
        let field = Array3::from_shape_fn(pressure.dim(), |(k, _, _)| 10.0 * k as f32);

        let out = interpolate_to_level(field.view(), pressure.view(), Hectopascals(850.0), VerticalMethod::Linear)
            .unwrap();
        assert_eq!(out.dim(), (2, 3));
        for &v in out.iter() {
            assert!((v - 15.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_result_bounded_by_bracketing_levels() {
        let pressure = uniform_pressure(1, 1);
        let values = [3.0f32, -7.5, 12.25, 0.5, 40.0];
        let field = Array3::from_shape_fn(pressure.dim(), |(k, _, _)| values[k]);
        let column: Vec<f32> = pressure.iter().copied().collect();

        for method in [VerticalMethod::Linear, VerticalMethod::LogPressure] {
            let mut level = 999.0;
            while level > 401.0 {
                let out = interpolate_to_level(field.view(), pressure.view(), Hectopascals(level), method).unwrap();
                let k = column
                    .windows(2)
                    .position(|w| (w[1] as f64) <= level && level <= w[0] as f64)
                    .unwrap();
                let lo = values[k].min(values[k + 1]);
                let hi = values[k].max(values[k + 1]);
                let v = out[[0, 0]];
                assert!(v >= lo && v <= hi, "{} not in [{}, {}] at {} hPa", v, lo, hi, level);
                level -= 7.3;
            }
        }
    }

    #[test]
    fn test_level_at_model_level_returns_that_value() {
        let pressure = uniform_pressure(1, 2);
        let field = Array3::from_shape_fn(pressure.dim(), |(k, _, c)| (k * 100 + c) as f32);
        let out = interpolate_to_level(field.view(), pressure.view(), Hectopascals(800.0), VerticalMethod::Linear)
            .unwrap();
        assert_eq!(out[[0, 0]], 200.0);
        assert_eq!(out[[0, 1]], 201.0);
    }

    #[test]
    fn test_log_pressure_differs_from_linear() {
        let pressure = uniform_pressure(1, 1);
        let field = Array3::from_shape_fn(pressure.dim(), |(k, _, _)| k as f32);
        let linear = interpolate_to_level(field.view(), pressure.view(), Hectopascals(500.0), VerticalMethod::Linear)
            .unwrap()[[0, 0]];
        let log = interpolate_to_level(field.view(), pressure.view(), Hectopascals(500.0), VerticalMethod::LogPressure)
            .unwrap()[[0, 0]];
        assert!((linear - 3.5).abs() < 1e-6);
        let expected = 3.0 + ((500f64.ln() - 600f64.ln()) / (400f64.ln() - 600f64.ln())) as f32;
        assert!((log - expected).abs() < 1e-5);
        assert!(log != linear);
    }

    #[test]
    fn test_level_out_of_range() {
        let pressure = uniform_pressure(2, 2);
        let field = Array3::zeros(pressure.dim());

        for level in [1013.0, 250.0] {
            let err = interpolate_to_level(field.view(), pressure.view(), Hectopascals(level), VerticalMethod::Linear)
                .unwrap_err();
            match err {
                WrfError::LevelOutOfRange { level_hpa, min_hpa, max_hpa } => {
                    assert_eq!(level_hpa, level);
                    assert_eq!(min_hpa, 400.0);
                    assert_eq!(max_hpa, 1000.0);
                }
                other => panic!("expected LevelOutOfRange, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_non_finite_level_rejected() {
        let pressure = uniform_pressure(2, 2);
        let field = Array3::zeros(pressure.dim());

        for level in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = interpolate_to_level(field.view(), pressure.view(), Hectopascals(level), VerticalMethod::Linear)
                .unwrap_err();
            match err {
                WrfError::LevelOutOfRange { min_hpa, max_hpa, .. } => {
                    assert_eq!(min_hpa, 400.0);
                    assert_eq!(max_hpa, 1000.0);
                }
                other => panic!("expected LevelOutOfRange, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_non_monotonic_column_rejected() {
        let mut pressure = uniform_pressure(2, 2);
        pressure[[2, 1, 0]] = 950.0;
        let field = Array3::zeros(pressure.dim());

        let err = interpolate_to_level(field.view(), pressure.view(), Hectopascals(850.0), VerticalMethod::Linear)
            .unwrap_err();
        assert!(matches!(err, WrfError::InvalidPressureProfile { row: 1, col: 0, .. }));
    }

    #[test]
    fn test_nan_pressure_rejected() {
        let mut pressure = uniform_pressure(2, 2);
        pressure[[0, 0, 1]] = f32::NAN;
        let field = Array3::zeros(pressure.dim());

        let err = interpolate_to_level(field.view(), pressure.view(), Hectopascals(850.0), VerticalMethod::Linear)
            .unwrap_err();
        assert!(matches!(err, WrfError::InvalidPressureProfile { row: 0, col: 1, .. }));
    }

    #[test]
    fn test_column_not_bracketing_is_nan() {
        // Column (0, 1) sits on high terrain: its surface pressure is 800 hPa.
        let mut pressure = uniform_pressure(1, 2);
        for (k, p) in [800.0f32, 700.0, 600.0, 500.0, 400.0].iter().enumerate() {
            pressure[[k, 0, 1]] = *p;
        }
        let field = Array3::from_elem(pressure.dim(), 1.0f32);

        let out = interpolate_to_level(field.view(), pressure.view(), Hectopascals(950.0), VerticalMethod::Linear)
            .unwrap();
        assert_eq!(out[[0, 0]], 1.0);
        assert!(out[[0, 1]].is_nan());
    }

    #[test]
    fn test_increasing_pressure_order() {
        let levels = [400.0f32, 600.0, 800.0];
        let pressure = Array3::from_shape_fn((3, 1, 1), |(k, _, _)| levels[k]);
        let field = Array3::from_shape_fn((3, 1, 1), |(k, _, _)| k as f32);
        let out = interpolate_to_level(field.view(), pressure.view(), Hectopascals(700.0), VerticalMethod::Linear)
            .unwrap();
        assert!((out[[0, 0]] - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_shape_mismatch() {
        let pressure = uniform_pressure(2, 2);
        let field = Array3::<f32>::zeros((5, 2, 3));
        assert!(matches!(
            interpolate_to_level(field.view(), pressure.view(), Hectopascals(850.0), VerticalMethod::Linear),
            Err(WrfError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_interpolate_column_outside_returns_nan() {
        let values = arr1(&[1.0f32, 2.0]);
        let pressures = arr1(&[900.0f32, 800.0]);
        assert!(interpolate_column(values.view(), pressures.view(), 950.0, VerticalMethod::Linear).is_nan());
        assert_eq!(
            interpolate_column(values.view(), pressures.view(), 850.0, VerticalMethod::Linear),
            1.5
        );
    }
}
