//! Whole-field statistics and temperature anomaly classification.

use serde::{Deserialize, Serialize};
use wrf_common::Hectopascals;

/// Surface temperature climatology used for anomaly classification (°C).
pub const SURFACE_CLIMATOLOGY_C: f64 = 25.0;

/// 850 hPa temperature climatology used for anomaly classification (°C).
pub const CLIMATOLOGY_850_HPA_C: f64 = 12.5;

/// Absolute anomaly above which a mean is classed as extreme (°C).
pub const EXTREME_THRESHOLD_C: f64 = 5.0;

/// Absolute anomaly above which a mean is classed as mild (°C).
pub const MILD_THRESHOLD_C: f64 = 2.0;

/// Descriptive statistics over the finite values of a field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub valid_count: usize,
}

impl FieldStatistics {
    /// Compute statistics, ignoring NaN and infinite values.
    ///
    /// Returns `None` when no value is finite.
    pub fn compute<'a, I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a f32>,
    {
        // Welford's online mean/variance
        let mut count = 0usize;
        let mut mean = 0.0f64;
        let mut m2 = 0.0f64;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for &v in values {
            if !v.is_finite() {
                continue;
            }
            let v = v as f64;
            count += 1;
            let delta = v - mean;
            mean += delta / count as f64;
            m2 += delta * (v - mean);
            min = min.min(v);
            max = max.max(v);
        }

        if count == 0 {
            return None;
        }

        Some(Self {
            min,
            max,
            mean,
            std_dev: (m2 / count as f64).sqrt(),
            valid_count: count,
        })
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// Severity of a temperature anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyClass {
    Normal,
    Mild,
    Extreme,
}

impl AnomalyClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyClass::Normal => "normal",
            AnomalyClass::Mild => "mild",
            AnomalyClass::Extreme => "extreme",
        }
    }
}

/// A mean temperature compared with its climatology.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureAnomaly {
    pub climatology_c: f64,
    /// Signed deviation of the mean from climatology.
    pub anomaly_c: f64,
    pub class: AnomalyClass,
}

/// Classify a mean temperature (°C) against climatology.
///
/// `level` is `None` for the surface. Only the surface and 850 hPa have a
/// climatology; other levels return `None`.
pub fn classify_temperature_anomaly(mean_c: f64, level: Option<Hectopascals>) -> Option<TemperatureAnomaly> {
    let climatology_c = match level {
        None => SURFACE_CLIMATOLOGY_C,
        Some(Hectopascals(hpa)) if (hpa - 850.0).abs() < 1e-6 => CLIMATOLOGY_850_HPA_C,
        Some(_) => return None,
    };
    if !mean_c.is_finite() {
        return None;
    }

    let anomaly_c = mean_c - climatology_c;
    let class = if anomaly_c.abs() > EXTREME_THRESHOLD_C {
        AnomalyClass::Extreme
    } else if anomaly_c.abs() > MILD_THRESHOLD_C {
        AnomalyClass::Mild
    } else {
        AnomalyClass::Normal
    };

    Some(TemperatureAnomaly {
        climatology_c,
        anomaly_c,
        class,
    })
}
