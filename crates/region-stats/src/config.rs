//! Configuration for regional aggregation.

use serde::{Deserialize, Serialize};
use wrf_common::{WrfError, WrfResult};

/// Configuration for region loading and summary statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Decimal places kept in mean/min/max.
    pub precision: u32,

    /// Feature property holding the region (county) name.
    pub region_name_property: String,

    /// Feature property holding the sub-region (sub-county) name.
    pub sub_region_name_property: String,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            precision: 2,
            region_name_property: "NAME_1".to_string(),
            sub_region_name_property: "NAME_2".to_string(),
        }
    }
}

impl AggregationConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Overwrite each field whose `WRF_*` environment variable is set.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("WRF_AGG_PRECISION") {
            if let Ok(precision) = val.parse() {
                self.precision = precision;
            }
        }

        if let Ok(val) = std::env::var("WRF_REGION_NAME_PROPERTY") {
            self.region_name_property = val;
        }

        if let Ok(val) = std::env::var("WRF_SUBREGION_NAME_PROPERTY") {
            self.sub_region_name_property = val;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> WrfResult<()> {
        if self.precision > 10 {
            return Err(WrfError::InvalidConfig(format!(
                "precision {} is more than 10 decimal places",
                self.precision
            )));
        }
        if self.region_name_property.trim().is_empty() {
            return Err(WrfError::InvalidConfig(
                "region_name_property must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Round `value` to the configured number of decimals.
    pub fn round(&self, value: f64) -> f64 {
        round_to(value, self.precision)
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AggregationConfig::default();
        assert_eq!(config.precision, 2);
        assert_eq!(config.region_name_property, "NAME_1");
        assert_eq!(config.sub_region_name_property, "NAME_2");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(2.345678, 2), 2.35);
        assert_eq!(round_to(-1.005001, 2), -1.01);
        assert_eq!(round_to(7.0, 0), 7.0);
    }

    #[test]
    fn test_invalid_precision() {
        let config = AggregationConfig {
            precision: 12,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
