//! Error types for WRF field resolution and aggregation.

use thiserror::Error;

/// Result type alias using WrfError.
pub type WrfResult<T> = Result<T, WrfError>;

/// Primary error type for field resolution and regional aggregation.
///
/// An empty aggregation is not represented here: a region that contains no
/// grid samples is a valid outcome and is reported through the aggregation
/// result type instead.
#[derive(Debug, Error)]
pub enum WrfError {
    // === Request Errors ===
    #[error("Unsupported variable: {0}")]
    UnsupportedVariable(String),

    #[error("Variable '{variable}' needs a pressure level")]
    MissingLevel { variable: String },

    #[error("Pressure level {level_hpa} hPa is outside the model range [{min_hpa:.1}, {max_hpa:.1}] hPa")]
    LevelOutOfRange {
        level_hpa: f64,
        min_hpa: f64,
        max_hpa: f64,
    },

    #[error("Time index {index} out of range (dataset has {len} times)")]
    TimeIndexOutOfRange { index: usize, len: usize },

    #[error("Level index {index} out of range for '{variable}' ({len} levels)")]
    LevelIndexOutOfRange {
        variable: String,
        index: usize,
        len: usize,
    },

    #[error("Grid point ({row}, {col}) outside grid of {rows}x{cols}")]
    GridPointOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Region not found: {0}")]
    RegionNotFound(String),

    // === Data Errors ===
    #[error("Missing variable in dataset: {name}")]
    MissingVariable { name: String },

    #[error("Invalid pressure profile at column ({row}, {col}): {reason}")]
    InvalidPressureProfile {
        row: usize,
        col: usize,
        reason: String,
    },

    #[error("Insufficient profile data at ({row}, {col}): {finite_levels} usable levels, need at least 2")]
    InsufficientProfileData {
        row: usize,
        col: usize,
        finite_levels: usize,
    },

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Failed to read data: {0}")]
    DataReadError(String),

    // === Configuration Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl WrfError {
    /// Create a MissingVariable error.
    pub fn missing_variable(name: impl Into<String>) -> Self {
        Self::MissingVariable { name: name.into() }
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    /// Create an InvalidPressureProfile error.
    pub fn invalid_profile(row: usize, col: usize, reason: impl Into<String>) -> Self {
        Self::InvalidPressureProfile {
            row,
            col,
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            WrfError::UnsupportedVariable(_) => "UnsupportedVariable",
            WrfError::MissingLevel { .. } => "MissingLevel",
            WrfError::LevelOutOfRange { .. } => "LevelOutOfRange",
            WrfError::TimeIndexOutOfRange { .. } => "TimeIndexOutOfRange",
            WrfError::LevelIndexOutOfRange { .. } => "LevelIndexOutOfRange",
            WrfError::GridPointOutOfRange { .. } => "GridPointOutOfRange",
            WrfError::RegionNotFound(_) => "RegionNotFound",
            WrfError::MissingVariable { .. } => "MissingVariable",
            WrfError::InvalidPressureProfile { .. } => "InvalidPressureProfile",
            WrfError::InsufficientProfileData { .. } => "InsufficientProfileData",
            WrfError::ShapeMismatch(_) => "ShapeMismatch",
            WrfError::InvalidGeometry(_) => "InvalidGeometry",
            WrfError::DataReadError(_) => "DataReadError",
            WrfError::InvalidConfig(_) => "InvalidConfig",
        }
    }

    /// Whether the error was caused by the request parameters rather than
    /// by the dataset or configuration.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            WrfError::UnsupportedVariable(_)
                | WrfError::MissingLevel { .. }
                | WrfError::LevelOutOfRange { .. }
                | WrfError::TimeIndexOutOfRange { .. }
                | WrfError::LevelIndexOutOfRange { .. }
                | WrfError::GridPointOutOfRange { .. }
                | WrfError::RegionNotFound(_)
        )
    }
}

impl From<ndarray::ShapeError> for WrfError {
    fn from(err: ndarray::ShapeError) -> Self {
        WrfError::ShapeMismatch(err.to_string())
    }
}

impl From<serde_json::Error> for WrfError {
    fn from(err: serde_json::Error) -> Self {
        WrfError::DataReadError(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_out_of_range_message_has_context() {
        let err = WrfError::LevelOutOfRange {
            level_hpa: 1050.0,
            min_hpa: 95.0,
            max_hpa: 1012.5,
        };
        let msg = err.to_string();
        assert!(msg.contains("1050"));
        assert!(msg.contains("1012.5"));
        assert_eq!(err.error_code(), "LevelOutOfRange");
        assert!(err.is_request_error());
    }

    #[test]
    fn test_data_errors_are_not_request_errors() {
        assert!(!WrfError::missing_variable("U10").is_request_error());
        assert!(!WrfError::invalid_profile(1, 2, "not monotonic").is_request_error());
    }
}
