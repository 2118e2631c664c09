//! WRF Field Resolution
//!
//! This crate turns raw WRF model arrays into named physical fields at a
//! requested time step and vertical level. It handles:
//!
//! - **Destaggering**: U and V live on cell faces and are averaged onto the
//!   mass grid before they are combined or interpolated
//! - **Pressure-level interpolation**: each column is interpolated against
//!   its own pressure profile, never extrapolated
//! - **Thermodynamics**: potential to actual temperature (Poisson's
//!   equation), dewpoint from specific humidity, LCL
//!
//! # Architecture
//!
//! ```text
//! resolve_named("Temperature", t, Some(850 hPa))
//!      │
//!      ▼
//! FieldKind::lookup ──► FieldKind::Temperature
//!      │
//!      ▼
//! Derivation::Pressure(temperature)
//!      │
//!      ├─► GridAccessor::pressure_hpa(t)      (P + PB) / 100
//!      │
//!      ├─► GridAccessor::mass3d("T", t)       θ = T + 300 K
//!      │
//!      ├─► interpolate_to_level(θ, p, 850)    per column
//!      │
//!      └─► Kelvin::from_potential → °C
//!               │
//!               ▼
//!          ResolvedField
//! ```
//!
//! # Example
//!
//! ```ignore
//! use field_resolver::VariableResolver;
//! use wrf_common::Hectopascals;
//!
//! let resolver = VariableResolver::new(&dataset);
//! for var in resolver.list_available() {
//!     println!("{} ({})", var.display_name, var.domain);
//! }
//!
//! let field = resolver.resolve_named("Wind Speed", 0, Some(Hectopascals(850.0)))?;
//! println!("{}: {:?}", field.title(), field.values.dim());
//! ```

pub mod accessor;
pub mod config;
pub mod destagger;
pub mod profile;
pub mod resolver;
pub mod variables;
pub mod vertical;

// Re-export commonly used types at crate root
pub use accessor::GridAccessor;
pub use config::{ResolverConfig, STANDARD_PRESSURE_LEVELS, WIND_PRESSURE_LEVELS};
pub use destagger::{destagger, StaggeredField};
pub use profile::{
    build_profile, dewpoint_from_specific_humidity, dewpoint_from_vapor_pressure,
    saturation_vapor_pressure, ConvectiveEnergy, LiftingCondensationLevel, SoundingProfile,
};
pub use resolver::{ResolvedField, VariableResolver, WindComponents};
pub use variables::{AvailableVariable, Derivation, FieldKind, Requirement};
pub use vertical::{interpolate_column, interpolate_to_level, VerticalMethod};
