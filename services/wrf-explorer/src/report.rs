//! Command output: serializable reports with a plain-text rendering.

use std::fmt::{self, Write};

use anyhow::Result;
use clap::ValueEnum;
use field_resolver::{ConvectiveEnergy, LiftingCondensationLevel, SoundingProfile};
use region_stats::{Aggregation, FieldStatistics, TemperatureAnomaly};
use serde::Serialize;
use wrf_common::{BoundingBox, Dataset, VerticalDomain};

/// How reports are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// A command result that can be printed as text or JSON.
pub trait Report: Serialize {
    fn write_text(&self, out: &mut String) -> fmt::Result;

    fn to_text(&self) -> Result<String> {
        let mut out = String::new();
        self.write_text(&mut out)?;
        Ok(out)
    }

    fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Text => self.to_text(),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

/// Display label for a time index, e.g. `2024-05-20 06:00`. Falls back to
/// the index when the dataset carries no time stamps.
pub fn time_label(dataset: &dyn Dataset, index: usize) -> String {
    dataset
        .times()
        .get(index)
        .map(|t| t.display_label())
        .unwrap_or_else(|| format!("t={}", index))
}

// ============================================================================
// variables
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct VariableEntry {
    pub name: String,
    pub domain: VerticalDomain,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub levels_hpa: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariablesReport {
    pub times: Vec<String>,
    pub variables: Vec<VariableEntry>,
}

impl Report for VariablesReport {
    fn write_text(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "Times ({}):", self.times.len())?;
        for (i, t) in self.times.iter().enumerate() {
            writeln!(out, "  [{}] {}", i, t)?;
        }
        writeln!(out, "Variables ({}):", self.variables.len())?;
        for v in &self.variables {
            if v.levels_hpa.is_empty() {
                writeln!(out, "  {:<22} {}", v.name, v.domain.as_str())?;
            } else {
                let levels: Vec<String> = v.levels_hpa.iter().map(|l| format!("{}", l)).collect();
                writeln!(
                    out,
                    "  {:<22} {} [{}] hPa",
                    v.name,
                    v.domain.as_str(),
                    levels.join(", ")
                )?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// field
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct FieldReport {
    pub title: String,
    pub unit: String,
    pub time_index: usize,
    pub time: String,
    pub missing_cells: usize,
    pub statistics: Option<FieldStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<TemperatureAnomaly>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<Aggregation>,
    /// The same field at the following time step, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<FieldReport>>,
}

impl FieldReport {
    fn write_step(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "{} [{}] at {}", self.title, self.unit, self.time)?;
        match &self.statistics {
            Some(s) => {
                writeln!(
                    out,
                    "  min {:.2}  max {:.2}  mean {:.2}  std {:.2}  ({} cells)",
                    s.min, s.max, s.mean, s.std_dev, s.valid_count
                )?;
            }
            None => {
                writeln!(out, "  no valid values")?;
            }
        }
        if self.missing_cells > 0 {
            writeln!(out, "  {} cells without a value", self.missing_cells)?;
        }
        if let Some(a) = &self.anomaly {
            writeln!(
                out,
                "  anomaly {:+.1} °C vs climatology {:.1} °C: {}",
                a.anomaly_c,
                a.climatology_c,
                a.class.as_str()
            )?;
        }
        for agg in &self.regions {
            match agg {
                Aggregation::Summary(s) => {
                    writeln!(
                        out,
                        "  {:<20} mean {:>8.2}  min {:>8.2}  max {:>8.2}  n={}",
                        s.region, s.mean, s.min, s.max, s.count
                    )?;
                }
                Aggregation::NoSamplesFound { region } => {
                    writeln!(out, "  {:<20} no grid points inside region", region)?;
                }
            }
        }
        Ok(())
    }
}

impl Report for FieldReport {
    fn write_text(&self, out: &mut String) -> fmt::Result {
        self.write_step(out)?;
        if let Some(next) = &self.next {
            out.push_str("Next:\n");
            next.write_step(out)?;
        }
        Ok(())
    }
}

// ============================================================================
// regions
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RegionEntry {
    pub name: String,
    pub bbox: BoundingBox,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_regions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionsReport {
    pub regions: Vec<RegionEntry>,
}

impl Report for RegionsReport {
    fn write_text(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "Regions ({}):", self.regions.len())?;
        for r in &self.regions {
            writeln!(
                out,
                "  {:<20} lon {:.2}..{:.2}  lat {:.2}..{:.2}",
                r.name, r.bbox.min_lon, r.bbox.max_lon, r.bbox.min_lat, r.bbox.max_lat
            )?;
            for s in &r.sub_regions {
                writeln!(out, "    - {}", s)?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// sounding
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SoundingReport {
    pub time: String,
    pub latitude: f64,
    pub longitude: f64,
    pub profile: SoundingProfile,
    /// Temperature (°C) of the lifted surface parcel at each profile level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parcel_c: Option<Vec<f64>>,
    pub lcl: Option<LiftingCondensationLevel>,
    pub convective: Option<ConvectiveEnergy>,
}

impl Report for SoundingReport {
    fn write_text(&self, out: &mut String) -> fmt::Result {
        writeln!(
            out,
            "Sounding at grid point {} ({:.3}°, {:.3}°), {}",
            self.profile.grid_point, self.latitude, self.longitude, self.time
        )?;
        writeln!(
            out,
            "  {:>9} {:>9} {:>9} {:>10}",
            "p (hPa)", "T (°C)", "Td (°C)", "Tp (°C)"
        )?;
        for i in 0..self.profile.len() {
            let parcel = self
                .parcel_c
                .as_ref()
                .and_then(|p| p.get(i))
                .map(|t| format!("{:.1}", t))
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                out,
                "  {:>9.1} {:>9.1} {:>9.1} {:>10}",
                self.profile.pressure_hpa[i], self.profile.temperature_c[i], self.profile.dewpoint_c[i], parcel
            )?;
        }
        if let Some(lcl) = &self.lcl {
            writeln!(
                out,
                "  LCL {:.1} hPa, {:.1} °C",
                lcl.pressure_hpa, lcl.temperature_c
            )?;
        }
        if let Some(energy) = &self.convective {
            writeln!(
                out,
                "  CAPE {:.0} J/kg, CIN {:.0} J/kg",
                energy.cape_j_kg, energy.cin_j_kg
            )?;
        }
        Ok(())
    }
}
