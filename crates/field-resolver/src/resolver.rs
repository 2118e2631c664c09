//! Request-level entry point: from a variable name, time and level to a
//! physical 2-D field.

use ndarray::{Array2, Zip};
use serde::Serialize;
use tracing::{debug, warn};
use wrf_common::{Dataset, GridPoint, Hectopascals, Unit, VerticalDomain, WrfError, WrfResult};

use crate::accessor::GridAccessor;
use crate::config::ResolverConfig;
use crate::profile::{build_profile, SoundingProfile};
use crate::variables::{
    surface_wind_components, wind_components_at, AvailableVariable, Derivation, FieldKind,
};

/// A resolved 2-D field in physical units.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedField {
    pub kind: FieldKind,
    pub values: Array2<f32>,
    pub unit: Unit,
    /// Pressure level for pressure-domain kinds.
    pub level: Option<Hectopascals>,
    pub time_index: usize,
}

impl ResolvedField {
    /// Human-readable title such as `Temperature at 850 hPa`.
    pub fn title(&self) -> String {
        match self.level {
            Some(level) => format!("{} at {}", self.kind.display_name(), level),
            None => self.kind.display_name().to_string(),
        }
    }

    /// Number of cells with no value (NaN).
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }
}

/// Destaggered wind components on the mass grid, for barb rendering.
#[derive(Debug, Clone, Serialize)]
pub struct WindComponents {
    pub u: Array2<f32>,
    pub v: Array2<f32>,
    /// `None` for 10 m winds.
    pub level: Option<Hectopascals>,
}

impl WindComponents {
    pub fn speed(&self) -> Array2<f32> {
        Zip::from(&self.u).and(&self.v).map_collect(|&u, &v| u.hypot(v))
    }

    /// Meteorological direction the wind blows from, degrees clockwise from north.
    pub fn direction_deg(&self) -> Array2<f32> {
        Zip::from(&self.u).and(&self.v).map_collect(|&u, &v| {
            let deg = (-u).atan2(-v).to_degrees();
            if deg < 0.0 {
                deg + 360.0
            } else {
                deg
            }
        })
    }
}

/// Resolves variables from a borrowed dataset.
pub struct VariableResolver<'a> {
    accessor: GridAccessor<'a>,
    config: ResolverConfig,
}

impl<'a> VariableResolver<'a> {
    /// Create a resolver with the default configuration.
    pub fn new(dataset: &'a dyn Dataset) -> Self {
        Self::with_config(dataset, ResolverConfig::default())
    }

    pub fn with_config(dataset: &'a dyn Dataset, config: ResolverConfig) -> Self {
        Self {
            accessor: GridAccessor::new(dataset),
            config,
        }
    }

    pub fn accessor(&self) -> &GridAccessor<'a> {
        &self.accessor
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Variables the dataset can produce, in listing order.
    pub fn list_available(&self) -> Vec<AvailableVariable> {
        self.accessor.list_available()
    }

    /// Levels offered for `kind`; empty for surface kinds.
    pub fn available_levels(&self, kind: FieldKind) -> Vec<Hectopascals> {
        match kind {
            FieldKind::WindSpeed => self.config.wind_levels(),
            _ if kind.domain() == VerticalDomain::Pressure => self.config.standard_levels(),
            _ => Vec::new(),
        }
    }

    /// Resolve a variable by name.
    ///
    /// The level, when given, selects the pressure-level variant of generic
    /// names such as `Temperature`.
    pub fn resolve_named(
        &self,
        name: &str,
        time: usize,
        level: Option<Hectopascals>,
    ) -> WrfResult<ResolvedField> {
        let domain = if level.is_some() {
            VerticalDomain::Pressure
        } else {
            VerticalDomain::Surface
        };
        let kind = FieldKind::lookup(name, domain)?;
        self.resolve(kind, time, level)
    }

    /// Resolve `kind` at `time`. Pressure kinds require `level`; surface
    /// kinds ignore it.
    pub fn resolve(
        &self,
        kind: FieldKind,
        time: usize,
        level: Option<Hectopascals>,
    ) -> WrfResult<ResolvedField> {
        self.accessor.check_time(time)?;

        let ((values, unit), level) = match kind.derivation() {
            Derivation::Surface(derive) => (derive(&self.accessor, &self.config, time)?, None),
            Derivation::Pressure(derive) => {
                let level = level.ok_or_else(|| WrfError::MissingLevel {
                    variable: kind.display_name().to_string(),
                })?;
                (derive(&self.accessor, &self.config, time, level)?, Some(level))
            }
        };

        let field = ResolvedField {
            kind,
            values,
            unit,
            level,
            time_index: time,
        };

        let missing = field.missing_count();
        if missing > 0 {
            warn!(
                variable = kind.display_name(),
                level = ?level.map(Hectopascals::value),
                time = time,
                missing_cells = missing,
                total_cells = field.values.len(),
                "Columns do not bracket the requested level"
            );
        }

        debug!(
            variable = kind.display_name(),
            unit = unit.symbol(),
            time = time,
            shape = ?field.values.dim(),
            "Resolved field"
        );

        Ok(field)
    }

    /// U and V on the mass grid: 10 m winds without a level, destaggered and
    /// interpolated model winds with one.
    pub fn resolve_wind(&self, time: usize, level: Option<Hectopascals>) -> WrfResult<WindComponents> {
        self.accessor.check_time(time)?;
        let (u, v) = match level {
            Some(level) => wind_components_at(&self.accessor, &self.config, time, level)?,
            None => surface_wind_components(&self.accessor, time)?,
        };
        Ok(WindComponents { u, v, level })
    }

    /// Sounding at `point` for time step `time`.
    pub fn profile(&self, time: usize, point: GridPoint) -> WrfResult<SoundingProfile> {
        build_profile(&self.accessor, &self.config, time, point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{assert_approx_eq, SyntheticWrf};

    #[test]
    fn test_title() {
        let field = ResolvedField {
            kind: FieldKind::Temperature,
            values: Array2::zeros((1, 1)),
            unit: Unit::Celsius,
            level: Some(Hectopascals(850.0)),
            time_index: 0,
        };
        assert_eq!(field.title(), "Temperature at 850 hPa");
    }

    #[test]
    fn test_available_levels() {
        let ds = SyntheticWrf::default().build();
        let resolver = VariableResolver::new(&ds);
        assert_eq!(resolver.available_levels(FieldKind::WindSpeed).len(), 3);
        assert_eq!(resolver.available_levels(FieldKind::Temperature).len(), 6);
        assert!(resolver.available_levels(FieldKind::Rainfall).is_empty());
    }

    #[test]
    fn test_pressure_kind_needs_level() {
        let ds = SyntheticWrf::default().build();
        let resolver = VariableResolver::new(&ds);
        assert!(matches!(
            resolver.resolve(FieldKind::RelativeHumidity, 0, None),
            Err(WrfError::MissingLevel { .. })
        ));
    }

    #[test]
    fn test_surface_kind_ignores_level() {
        let ds = SyntheticWrf::default().build();
        let resolver = VariableResolver::new(&ds);
        let field = resolver
            .resolve(FieldKind::SurfaceTemperature, 0, Some(Hectopascals(500.0)))
            .unwrap();
        assert!(field.level.is_none());
        assert_approx_eq!(field.values[[0, 0]], 21.85, 1e-4);
    }

    #[test]
    fn test_time_out_of_range() {
        let ds = SyntheticWrf::new(2, 3, 2, 2).build();
        let resolver = VariableResolver::new(&ds);
        assert!(matches!(
            resolver.resolve(FieldKind::Rainfall, 2, None),
            Err(WrfError::TimeIndexOutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_wind_direction() {
        let wind = WindComponents {
            u: ndarray::arr2(&[[0.0f32, 5.0, 0.0]]),
            v: ndarray::arr2(&[[-5.0f32, 0.0, 5.0]]),
            level: None,
        };
        let dir = wind.direction_deg();
        // Northerly, westerly and southerly winds.
        assert_approx_eq!(dir[[0, 0]], 0.0, 1e-4);
        assert_approx_eq!(dir[[0, 1]], 270.0, 1e-4);
        assert_approx_eq!(dir[[0, 2]], 180.0, 1e-4);
        assert_eq!(wind.speed()[[0, 1]], 5.0);
    }
}
