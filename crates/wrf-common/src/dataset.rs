//! Dataset abstraction over already-loaded model output.
//!
//! The resolver never opens files. A loader (NetCDF, JSON snapshot, test
//! builder) materializes variables in memory and hands the resolver a
//! `&dyn Dataset`; the caller owns its lifetime.

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{WrfError, WrfResult};
use crate::time::ModelTime;

/// Name of the record dimension in WRF output.
pub const TIME_DIMENSION: &str = "Time";

/// A raw model variable with its dimension names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawVariable {
    /// Dimension names, outermost first (e.g. `Time, bottom_top, south_north, west_east_stag`)
    pub dims: Vec<String>,
    /// Values in model units
    pub data: ArrayD<f32>,
    /// Units attribute, if the source carried one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

impl RawVariable {
    /// Create a variable, checking that dimension names match the array rank.
    pub fn new<S: Into<String>>(dims: Vec<S>, data: ArrayD<f32>) -> WrfResult<Self> {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        if dims.len() != data.ndim() {
            return Err(WrfError::shape_mismatch(format!(
                "{} dimension names for a {}-dimensional array",
                dims.len(),
                data.ndim()
            )));
        }
        Ok(Self {
            dims,
            data,
            units: None,
        })
    }

    /// Attach a units attribute.
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Whether the outermost dimension is time.
    pub fn is_time_varying(&self) -> bool {
        self.dims.first().map(|d| d == TIME_DIMENSION).unwrap_or(false)
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }
}

/// Read access to named variables of an opened dataset.
pub trait Dataset: Send + Sync {
    /// Look up a variable by its exact name.
    fn variable(&self, name: &str) -> Option<&RawVariable>;

    /// Names of all variables in the catalog.
    fn variable_names(&self) -> Vec<&str>;

    /// Number of entries along the time dimension.
    fn num_times(&self) -> usize;

    /// Valid times, when the source provided them.
    fn times(&self) -> &[ModelTime] {
        &[]
    }

    fn has_variable(&self, name: &str) -> bool {
        self.variable(name).is_some()
    }
}

/// Dataset held entirely in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryDataset {
    #[serde(default)]
    variables: BTreeMap<String, RawVariable>,
    #[serde(default)]
    times: Vec<ModelTime>,
}

impl InMemoryDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a variable.
    pub fn insert(&mut self, name: impl Into<String>, variable: RawVariable) {
        self.variables.insert(name.into(), variable);
    }

    /// Builder-style insert.
    pub fn with_variable(mut self, name: impl Into<String>, variable: RawVariable) -> Self {
        self.insert(name, variable);
        self
    }

    /// Set the valid times.
    pub fn with_times(mut self, times: Vec<ModelTime>) -> Self {
        self.times = times;
        self
    }

    /// Remove a variable, returning it if present.
    pub fn remove(&mut self, name: &str) -> Option<RawVariable> {
        self.variables.remove(name)
    }

    /// Parse a JSON snapshot.
    pub fn from_json_str(json: &str) -> WrfResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to a JSON snapshot.
    pub fn to_json_string(&self) -> WrfResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

impl Dataset for InMemoryDataset {
    fn variable(&self, name: &str) -> Option<&RawVariable> {
        self.variables.get(name)
    }

    fn variable_names(&self) -> Vec<&str> {
        self.variables.keys().map(String::as_str).collect()
    }

    fn num_times(&self) -> usize {
        if !self.times.is_empty() {
            return self.times.len();
        }
        self.variables
            .values()
            .filter(|v| v.is_time_varying())
            .map(|v| v.shape()[0])
            .max()
            .unwrap_or(0)
    }

    fn times(&self) -> &[ModelTime] {
        &self.times
    }
}
