//! Configuration for field resolution.

use serde::{Deserialize, Serialize};
use wrf_common::{Hectopascals, Kelvin, WrfError, WrfResult};

use crate::vertical::VerticalMethod;

/// WRF's base state potential temperature; the `T` variable is θ minus this.
pub const DEFAULT_BASE_THETA: f64 = 300.0;

/// Poisson constant Rd/cp.
pub const DEFAULT_KAPPA: f64 = 0.286;

/// Pressure levels offered for pressure-domain variables (hPa).
pub const STANDARD_PRESSURE_LEVELS: [f64; 6] = [1000.0, 850.0, 700.0, 500.0, 300.0, 250.0];

/// Subset of levels offered for wind speed (hPa).
pub const WIND_PRESSURE_LEVELS: [f64; 3] = [850.0, 700.0, 300.0];

/// Configuration for the variable resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Base potential temperature added to the `T` perturbation (K).
    pub base_theta_k: f64,

    /// Exponent of Poisson's equation.
    pub kappa: f64,

    /// Interpolation used between bracketing model levels.
    pub vertical_method: VerticalMethod,

    /// Levels offered for pressure-domain variables.
    pub standard_levels_hpa: Vec<f64>,

    /// Levels offered for wind speed.
    pub wind_levels_hpa: Vec<f64>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_theta_k: DEFAULT_BASE_THETA,
            kappa: DEFAULT_KAPPA,
            vertical_method: VerticalMethod::Linear,
            standard_levels_hpa: STANDARD_PRESSURE_LEVELS.to_vec(),
            wind_levels_hpa: WIND_PRESSURE_LEVELS.to_vec(),
        }
    }
}

impl ResolverConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Overwrite each field whose `WRF_*` environment variable is set and
    /// parses. Fields without a variable keep their current value.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("WRF_BASE_THETA") {
            if let Ok(theta) = val.parse() {
                self.base_theta_k = theta;
            }
        }

        if let Ok(val) = std::env::var("WRF_KAPPA") {
            if let Ok(kappa) = val.parse() {
                self.kappa = kappa;
            }
        }

        if let Ok(val) = std::env::var("WRF_VERTICAL_METHOD") {
            self.vertical_method = VerticalMethod::from_str(&val);
        }

        if let Ok(val) = std::env::var("WRF_STANDARD_LEVELS") {
            if let Some(levels) = parse_level_list(&val) {
                self.standard_levels_hpa = levels;
            }
        }

        if let Ok(val) = std::env::var("WRF_WIND_LEVELS") {
            if let Some(levels) = parse_level_list(&val) {
                self.wind_levels_hpa = levels;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> WrfResult<()> {
        if !(self.base_theta_k > 0.0) {
            return Err(WrfError::InvalidConfig(
                "base_theta_k must be > 0".to_string(),
            ));
        }

        if !(self.kappa > 0.0 && self.kappa < 1.0) {
            return Err(WrfError::InvalidConfig(
                "kappa must be between 0 and 1".to_string(),
            ));
        }

        for level in self.standard_levels_hpa.iter().chain(&self.wind_levels_hpa) {
            if !(*level > 0.0) {
                return Err(WrfError::InvalidConfig(format!(
                    "pressure level {} must be > 0 hPa",
                    level
                )));
            }
        }

        Ok(())
    }

    /// Base potential temperature as a typed quantity.
    pub fn base_theta(&self) -> Kelvin {
        Kelvin(self.base_theta_k)
    }

    pub fn standard_levels(&self) -> Vec<Hectopascals> {
        self.standard_levels_hpa.iter().copied().map(Hectopascals).collect()
    }

    pub fn wind_levels(&self) -> Vec<Hectopascals> {
        self.wind_levels_hpa.iter().copied().map(Hectopascals).collect()
    }
}

/// Parse a comma-separated list of levels such as `"1000,850,500"`.
fn parse_level_list(s: &str) -> Option<Vec<f64>> {
    let levels: Result<Vec<f64>, _> = s
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::parse)
        .collect();
    levels.ok().filter(|l| !l.is_empty())
}
