//! Explorer configuration.
//!
//! Loaded from an optional YAML file with `${VAR}` and `${VAR:-default}`
//! substitution, then overlaid with environment variables. Every section has
//! defaults so an empty file (or no file) is valid.

use anyhow::{Context, Result};
use field_resolver::ResolverConfig;
use region_stats::AggregationConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration (explorer.yaml).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub logging: LoggingConfig,
    pub data: DataConfig,
    pub resolver: ResolverConfig,
    pub aggregation: AggregationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Default input locations, used when a command does not name them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Dataset file (`.json` snapshot, or `wrfout` NetCDF with the `netcdf` feature).
    pub dataset: Option<PathBuf>,

    /// GeoJSON region files, e.g. county and sub-county boundaries.
    pub regions: Vec<PathBuf>,
}

impl ExplorerConfig {
    /// Load from `path` when given, else defaults; then apply environment
    /// overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => load_config_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML content after environment substitution.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;
        if expanded.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&expanded).context("Failed to parse explorer config YAML")
    }

    /// Overlay `WRF_*` environment variables on top of file values.
    pub fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("WRF_DATASET") {
            self.data.dataset = Some(PathBuf::from(path));
        }
        if let Ok(paths) = std::env::var("WRF_REGION_FILES") {
            self.data.regions = paths
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .collect();
        }
        self.resolver.apply_env();
        self.aggregation.apply_env();
    }

    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        anyhow::ensure!(
            valid_levels.contains(&self.logging.level.as_str()),
            "Invalid log level: {}. Must be one of: {:?}",
            self.logging.level,
            valid_levels
        );

        let valid_formats = ["json", "pretty"];
        anyhow::ensure!(
            valid_formats.contains(&self.logging.format.as_str()),
            "Invalid log format: {}. Must be one of: {:?}",
            self.logging.format,
            valid_formats
        );

        self.resolver.validate().context("Invalid resolver config")?;
        self.aggregation.validate().context("Invalid aggregation config")?;
        Ok(())
    }
}

fn load_config_file(path: &Path) -> Result<ExplorerConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read explorer config from {:?}", path))?;
    ExplorerConfig::from_yaml_str(&content).with_context(|| format!("Invalid config file {:?}", path))
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand `${VAR}` and `${VAR:-default}` references. Errors name the
/// config line and, when there is one, the YAML key it sets.
pub fn expand_env_vars(content: &str) -> Result<String> {
    let mut out = String::with_capacity(content.len());
    for (idx, line) in content.split_inclusive('\n').enumerate() {
        expand_line(line, &mut out).with_context(|| match yaml_key(line) {
            Some(key) => format!("config line {} ({})", idx + 1, key),
            None => format!("config line {}", idx + 1),
        })?;
    }
    Ok(out)
}

fn expand_line(line: &str, out: &mut String) -> Result<()> {
    let mut rest = line;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let expr = &rest[start + 2..];
        let end = expr
            .find('}')
            .with_context(|| format!("unclosed substitution ${{{}", expr.trim_end()))?;
        out.push_str(&lookup_var(&expr[..end])?);
        rest = &expr[end + 1..];
    }
    out.push_str(rest);
    Ok(())
}

/// Value for `NAME` or `NAME:-default`. An empty variable takes the default.
fn lookup_var(expr: &str) -> Result<String> {
    let (name, default) = match expr.split_once(":-") {
        Some((name, default)) => (name.trim(), Some(default)),
        None => (expr.trim(), None),
    };
    match (std::env::var(name), default) {
        (Ok(val), None) => Ok(val),
        (Ok(val), Some(_)) if !val.is_empty() => Ok(val),
        (_, Some(default)) => Ok(default.to_string()),
        (Err(_), None) => anyhow::bail!("environment variable {} is not set", name),
    }
}

/// Key of a `key: value` line, ignoring list markers.
fn yaml_key(line: &str) -> Option<&str> {
    let (key, _) = line.trim_start().trim_start_matches("- ").split_once(':')?;
    let key = key.trim();
    (!key.is_empty() && !key.contains("${")).then_some(key)
}
