//! WRF time stamps.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Format WRF writes into its `Times` variable.
pub const WRF_TIME_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

/// Format used for display labels.
pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Error)]
pub enum TimeParseError {
    #[error("Invalid WRF time format: {0}")]
    InvalidFormat(String),
}

/// A model valid time read from the dataset's `Times` variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModelTime(pub NaiveDateTime);

impl ModelTime {
    /// Parse a WRF time stamp such as `2024-05-20_06:00:00`.
    ///
    /// ISO-style `2024-05-20T06:00:00` and `2024-05-20 06:00:00` are accepted
    /// too, since converted datasets often rewrite the separator.
    pub fn parse(s: &str) -> Result<Self, TimeParseError> {
        let trimmed = s.trim().trim_end_matches('\0');
        for format in [WRF_TIME_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(Self(dt));
            }
        }
        Err(TimeParseError::InvalidFormat(s.to_string()))
    }

    /// Label used by time selectors, e.g. `2024-05-20 06:00`.
    pub fn display_label(&self) -> String {
        self.0.format(DISPLAY_TIME_FORMAT).to_string()
    }

    /// Compact form for file names, e.g. `20240520_0600`.
    pub fn file_stamp(&self) -> String {
        self.0.format("%Y%m%d_%H%M").to_string()
    }
}

impl fmt::Display for ModelTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(WRF_TIME_FORMAT))
    }
}
