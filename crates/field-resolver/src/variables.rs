//! The catalogue of physical variables the resolver can produce.
//!
//! Each [`FieldKind`] carries its display name, vertical domain, the raw
//! variables it needs and its derivation. A request is mapped to a kind once;
//! everything after that dispatches on the enum.

use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use wrf_common::{
    kg_per_kg_to_g_per_kg, Dataset, Hectopascals, Kelvin, Unit, VerticalDomain, WrfError,
    WrfResult,
};

use crate::accessor::GridAccessor;
use crate::config::ResolverConfig;
use crate::vertical::interpolate_to_level;

/// A physical variable at a specific vertical domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// 10 m wind speed from U10/V10.
    SurfaceWindSpeed,
    /// 2 m temperature from T2.
    SurfaceTemperature,
    /// Accumulated convective plus non-convective precipitation.
    Rainfall,
    /// 2 m humidity: RH2 when present, else Q2 as g/kg.
    SurfaceHumidity,
    /// Wind speed on a pressure surface.
    WindSpeed,
    /// Air temperature on a pressure surface.
    Temperature,
    /// Relative humidity on a pressure surface.
    RelativeHumidity,
}

/// Raw variables a kind needs: every name in `all_of`, and at least one of
/// `any_of` when it is non-empty.
#[derive(Debug, Clone, Copy)]
pub struct Requirement {
    pub all_of: &'static [&'static str],
    pub any_of: &'static [&'static str],
}

impl Requirement {
    pub fn is_met(&self, dataset: &dyn Dataset) -> bool {
        self.all_of.iter().all(|name| dataset.has_variable(name))
            && (self.any_of.is_empty() || self.any_of.iter().any(|name| dataset.has_variable(name)))
    }
}

/// Values and unit produced by a derivation.
pub type Derived = (Array2<f32>, Unit);

pub type SurfaceFn = fn(&GridAccessor<'_>, &ResolverConfig, usize) -> WrfResult<Derived>;
pub type PressureFn = fn(&GridAccessor<'_>, &ResolverConfig, usize, Hectopascals) -> WrfResult<Derived>;

/// How a kind is computed. Pressure derivations take the level as a
/// required argument.
#[derive(Clone, Copy)]
pub enum Derivation {
    Surface(SurfaceFn),
    Pressure(PressureFn),
}

impl FieldKind {
    /// All kinds in listing order.
    pub const ALL: [FieldKind; 7] = [
        FieldKind::SurfaceWindSpeed,
        FieldKind::SurfaceTemperature,
        FieldKind::Rainfall,
        FieldKind::SurfaceHumidity,
        FieldKind::WindSpeed,
        FieldKind::Temperature,
        FieldKind::RelativeHumidity,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            FieldKind::SurfaceWindSpeed => "Wind Speed (10m)",
            FieldKind::SurfaceTemperature => "Temperature (2m)",
            FieldKind::Rainfall => "Rainfall",
            FieldKind::SurfaceHumidity => "Humidity (2m)",
            FieldKind::WindSpeed => "Wind Speed",
            FieldKind::Temperature => "Temperature",
            FieldKind::RelativeHumidity => "Relative Humidity",
        }
    }

    pub fn domain(&self) -> VerticalDomain {
        match self {
            FieldKind::SurfaceWindSpeed
            | FieldKind::SurfaceTemperature
            | FieldKind::Rainfall
            | FieldKind::SurfaceHumidity => VerticalDomain::Surface,
            FieldKind::WindSpeed | FieldKind::Temperature | FieldKind::RelativeHumidity => {
                VerticalDomain::Pressure
            }
        }
    }

    pub fn requirement(&self) -> Requirement {
        match self {
            FieldKind::SurfaceWindSpeed => Requirement {
                all_of: &["U10", "V10"],
                any_of: &[],
            },
            FieldKind::SurfaceTemperature => Requirement {
                all_of: &["T2"],
                any_of: &[],
            },
            FieldKind::Rainfall => Requirement {
                all_of: &[],
                any_of: &["RAINNC", "RAINC"],
            },
            FieldKind::SurfaceHumidity => Requirement {
                all_of: &[],
                any_of: &["RH2", "Q2"],
            },
            FieldKind::WindSpeed => Requirement {
                all_of: &["U", "V", "P", "PB"],
                any_of: &[],
            },
            FieldKind::Temperature => Requirement {
                all_of: &["T", "P", "PB"],
                any_of: &[],
            },
            FieldKind::RelativeHumidity => Requirement {
                all_of: &["RH", "P", "PB"],
                any_of: &[],
            },
        }
    }

    /// Whether `dataset` holds the raw inputs for this kind.
    pub fn is_available(&self, dataset: &dyn Dataset) -> bool {
        self.requirement().is_met(dataset)
    }

    pub fn derivation(&self) -> Derivation {
        match self {
            FieldKind::SurfaceWindSpeed => Derivation::Surface(surface_wind_speed),
            FieldKind::SurfaceTemperature => Derivation::Surface(surface_temperature),
            FieldKind::Rainfall => Derivation::Surface(rainfall),
            FieldKind::SurfaceHumidity => Derivation::Surface(surface_humidity),
            FieldKind::WindSpeed => Derivation::Pressure(wind_speed),
            FieldKind::Temperature => Derivation::Pressure(temperature),
            FieldKind::RelativeHumidity => Derivation::Pressure(relative_humidity),
        }
    }

    /// Look up a kind by its exact display name (case-insensitive).
    pub fn from_display_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.display_name().eq_ignore_ascii_case(name))
    }

    /// Map a requested variable and domain to a kind.
    ///
    /// Generic names (`Temperature`, `Humidity`, `Wind Speed`, `Rainfall`)
    /// pick the surface or pressure variant by `domain`; full display names
    /// such as `Temperature (2m)` are accepted as-is.
    pub fn lookup(variable: &str, domain: VerticalDomain) -> WrfResult<Self> {
        let key = variable.trim().to_lowercase();
        let generic = match (key.as_str(), domain) {
            ("temperature", VerticalDomain::Surface) => Some(FieldKind::SurfaceTemperature),
            ("temperature", VerticalDomain::Pressure) => Some(FieldKind::Temperature),
            ("humidity", VerticalDomain::Surface) => Some(FieldKind::SurfaceHumidity),
            ("humidity", VerticalDomain::Pressure) => Some(FieldKind::RelativeHumidity),
            ("wind speed", VerticalDomain::Surface) => Some(FieldKind::SurfaceWindSpeed),
            ("wind speed", VerticalDomain::Pressure) => Some(FieldKind::WindSpeed),
            ("rainfall", VerticalDomain::Surface) => Some(FieldKind::Rainfall),
            ("rainfall", VerticalDomain::Pressure) => {
                return Err(WrfError::UnsupportedVariable(format!(
                    "{} is not available on pressure levels",
                    variable.trim()
                )))
            }
            _ => None,
        };

        generic
            .or_else(|| Self::from_display_name(variable))
            .ok_or_else(|| WrfError::UnsupportedVariable(variable.trim().to_string()))
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One entry of the available-variable listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableVariable {
    pub kind: FieldKind,
    pub display_name: String,
    pub domain: VerticalDomain,
}

impl From<FieldKind> for AvailableVariable {
    fn from(kind: FieldKind) -> Self {
        Self {
            kind,
            display_name: kind.display_name().to_string(),
            domain: kind.domain(),
        }
    }
}

// ============================================================================
// Derivations
// ============================================================================

fn optional2d(accessor: &GridAccessor<'_>, name: &str, time: usize) -> WrfResult<Option<Array2<f32>>> {
    if accessor.dataset().has_variable(name) {
        accessor.slice2d(name, time).map(Some)
    } else {
        Ok(None)
    }
}

fn check_same_shape(a: &Array2<f32>, b: &Array2<f32>, what: &str) -> WrfResult<()> {
    if a.dim() != b.dim() {
        return Err(WrfError::shape_mismatch(format!(
            "{} components differ in shape: {:?} vs {:?}",
            what,
            a.dim(),
            b.dim()
        )));
    }
    Ok(())
}

fn speed(u: &Array2<f32>, v: &Array2<f32>) -> Array2<f32> {
    Zip::from(u).and(v).map_collect(|&u, &v| u.hypot(v))
}

fn surface_wind_speed(accessor: &GridAccessor<'_>, _: &ResolverConfig, time: usize) -> WrfResult<Derived> {
    let (u10, v10) = surface_wind_components(accessor, time)?;
    Ok((speed(&u10, &v10), Unit::MetersPerSecond))
}

fn surface_temperature(accessor: &GridAccessor<'_>, _: &ResolverConfig, time: usize) -> WrfResult<Derived> {
    let t2 = accessor.slice2d("T2", time)?;
    let celsius = t2.mapv(|k| Kelvin(k as f64).to_celsius().0 as f32);
    Ok((celsius, Unit::Celsius))
}

fn rainfall(accessor: &GridAccessor<'_>, _: &ResolverConfig, time: usize) -> WrfResult<Derived> {
    let convective = optional2d(accessor, "RAINC", time)?;
    let non_convective = optional2d(accessor, "RAINNC", time)?;

    let total = match (convective, non_convective) {
        (Some(c), Some(nc)) => {
            check_same_shape(&c, &nc, "RAINC/RAINNC")?;
            c + &nc
        }
        (Some(only), None) | (None, Some(only)) => only,
        (None, None) => return Err(WrfError::missing_variable("RAINNC")),
    };
    Ok((total, Unit::Millimeters))
}

fn surface_humidity(accessor: &GridAccessor<'_>, _: &ResolverConfig, time: usize) -> WrfResult<Derived> {
    if let Some(rh2) = optional2d(accessor, "RH2", time)? {
        return Ok((rh2, Unit::Percent));
    }
    let q2 = accessor.slice2d("Q2", time)?;
    Ok((q2.mapv(kg_per_kg_to_g_per_kg), Unit::GramsPerKilogram))
}

fn temperature(
    accessor: &GridAccessor<'_>,
    config: &ResolverConfig,
    time: usize,
    level: Hectopascals,
) -> WrfResult<Derived> {
    let pressure = accessor.pressure_hpa(time)?;
    let base_theta = config.base_theta().0 as f32;
    let theta = accessor.mass3d("T", time)?.mapv(|t| t + base_theta);

    let theta_at_level = interpolate_to_level(theta.view(), pressure.view(), level, config.vertical_method)?;
    let celsius = theta_at_level.mapv(|theta| {
        Kelvin::from_potential(Kelvin(theta as f64), level, config.kappa)
            .to_celsius()
            .0 as f32
    });
    Ok((celsius, Unit::Celsius))
}

fn relative_humidity(
    accessor: &GridAccessor<'_>,
    config: &ResolverConfig,
    time: usize,
    level: Hectopascals,
) -> WrfResult<Derived> {
    let pressure = accessor.pressure_hpa(time)?;
    let rh = accessor.mass3d("RH", time)?;
    let values = interpolate_to_level(rh.view(), pressure.view(), level, config.vertical_method)?;
    Ok((values, Unit::Percent))
}

fn wind_speed(
    accessor: &GridAccessor<'_>,
    config: &ResolverConfig,
    time: usize,
    level: Hectopascals,
) -> WrfResult<Derived> {
    let (u, v) = wind_components_at(accessor, config, time, level)?;
    Ok((speed(&u, &v), Unit::MetersPerSecond))
}

/// Destaggered U and V interpolated to `level`.
pub(crate) fn wind_components_at(
    accessor: &GridAccessor<'_>,
    config: &ResolverConfig,
    time: usize,
    level: Hectopascals,
) -> WrfResult<(Array2<f32>, Array2<f32>)> {
    let pressure = accessor.pressure_hpa(time)?;
    let u = accessor.staggered3d("U", time)?.destagger()?;
    let v = accessor.staggered3d("V", time)?.destagger()?;

    let u = interpolate_to_level(u.view(), pressure.view(), level, config.vertical_method)?;
    let v = interpolate_to_level(v.view(), pressure.view(), level, config.vertical_method)?;
    Ok((u, v))
}

/// U10 and V10.
pub(crate) fn surface_wind_components(
    accessor: &GridAccessor<'_>,
    time: usize,
) -> WrfResult<(Array2<f32>, Array2<f32>)> {
    let u10 = accessor.slice2d("U10", time)?;
    let v10 = accessor.slice2d("V10", time)?;
    check_same_shape(&u10, &v10, "U10/V10")?;
    Ok((u10, v10))
}
