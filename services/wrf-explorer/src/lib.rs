//! WRF Explorer
//!
//! Command-line front end over the field resolver and region statistics
//! crates: dataset and region loading, configuration and report output.

pub mod commands;
pub mod config;
pub mod loader;
pub mod report;

pub use config::ExplorerConfig;
pub use report::{OutputFormat, Report};
