//! Typed physical quantities.
//!
//! Derivation code converts between these types instead of applying bare
//! offsets, so a value already in Celsius cannot be converted a second time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Offset between the Kelvin and Celsius scales.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Reference pressure for potential temperature.
pub const REFERENCE_PRESSURE: Hectopascals = Hectopascals(1000.0);

/// Temperature in Kelvin.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Kelvin(pub f64);

/// Temperature in degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Celsius(pub f64);

/// Pressure in Pascals (native WRF unit).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Pascals(pub f64);

/// Pressure in hectopascals (millibars).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Hectopascals(pub f64);

impl Kelvin {
    pub fn to_celsius(self) -> Celsius {
        Celsius(self.0 - KELVIN_OFFSET)
    }

    /// Actual temperature of a parcel with this potential temperature at
    /// `pressure` (Poisson's equation, T = θ·(p/p0)^κ).
    pub fn from_potential(theta: Kelvin, pressure: Hectopascals, kappa: f64) -> Kelvin {
        Kelvin(theta.0 * (pressure.0 / REFERENCE_PRESSURE.0).powf(kappa))
    }
}

impl Celsius {
    pub fn to_kelvin(self) -> Kelvin {
        Kelvin(self.0 + KELVIN_OFFSET)
    }
}

impl Pascals {
    pub fn to_hectopascals(self) -> Hectopascals {
        Hectopascals(self.0 / 100.0)
    }
}

impl Hectopascals {
    pub fn to_pascals(self) -> Pascals {
        Pascals(self.0 * 100.0)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Hectopascals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} hPa", self.0)
    }
}

/// Convert a specific humidity (kg/kg) to g/kg.
pub fn kg_per_kg_to_g_per_kg(q: f32) -> f32 {
    q * 1000.0
}

/// Unit label attached to a resolved field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Celsius,
    Millimeters,
    Percent,
    GramsPerKilogram,
    MetersPerSecond,
}

impl Unit {
    /// Display symbol for the unit.
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Celsius => "°C",
            Unit::Millimeters => "mm",
            Unit::Percent => "%",
            Unit::GramsPerKilogram => "g/kg",
            Unit::MetersPerSecond => "m/s",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
