//! WRF explorer CLI.
//!
//! Lists the variables in a WRF output file, resolves fields at a time step
//! and pressure level, summarizes them over county boundaries and prints
//! soundings.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use region_stats::RegionAggregator;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use wrf_common::GridPoint;

use wrf_explorer::commands::{self, FieldRequest, SoundingLocation};
use wrf_explorer::loader::{load_dataset, load_regions};
use wrf_explorer::{ExplorerConfig, OutputFormat, Report};

#[derive(Parser, Debug)]
#[command(name = "wrf-explorer")]
#[command(about = "Explore WRF model output: fields, county statistics and soundings")]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "WRF_EXPLORER_CONFIG")]
    config: Option<PathBuf>,

    /// Dataset file (JSON snapshot, or wrfout NetCDF with the netcdf feature)
    #[arg(short, long, global = true)]
    dataset: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Log level (overrides the config file; RUST_LOG takes precedence)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List valid times and available variables
    Variables,

    /// Resolve a variable and print its statistics
    Field {
        /// Variable name, e.g. "Temperature" or "Wind Speed (10m)"
        variable: String,

        /// Time index
        #[arg(short, long, default_value_t = 0)]
        time: usize,

        /// Pressure level in hPa (selects the pressure-level variant)
        #[arg(short, long)]
        level: Option<f64>,

        /// Summarize over this region or sub-region (repeatable)
        #[arg(short, long = "region")]
        regions: Vec<String>,

        /// Summarize over every loaded region
        #[arg(long, conflicts_with = "regions")]
        all_regions: bool,

        /// GeoJSON region files (default: from config)
        #[arg(long = "regions-file")]
        region_files: Vec<PathBuf>,

        /// Also report the next time step
        #[arg(long)]
        compare_next: bool,

        /// Write the report as JSON into this directory
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// List regions loaded from GeoJSON files
    Regions {
        /// GeoJSON region files (default: from config)
        files: Vec<PathBuf>,
    },

    /// Print a temperature/dewpoint sounding
    Sounding {
        /// Time index
        #[arg(short, long, default_value_t = 0)]
        time: usize,

        /// Grid row (south_north index)
        #[arg(long, requires = "col", conflicts_with_all = ["lat", "lon"])]
        row: Option<usize>,

        /// Grid column (west_east index)
        #[arg(long, requires = "row")]
        col: Option<usize>,

        /// Latitude of the nearest grid point to use
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude of the nearest grid point to use
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
    },
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = ExplorerConfig::load(args.config.as_deref())?;
    init_tracing(&config, args.log_level.as_deref());

    info!(command = ?args.command, "Starting wrf-explorer");

    let output = match args.command {
        Command::Variables => {
            let dataset = load_dataset(&dataset_path(&args.dataset, &config)?)?;
            commands::variables(&dataset, &config).render(args.format)?
        }
        Command::Field {
            variable,
            time,
            level,
            regions,
            all_regions,
            region_files,
            compare_next,
            export,
        } => {
            let dataset = load_dataset(&dataset_path(&args.dataset, &config)?)?;
            let aggregator = if all_regions || !regions.is_empty() {
                let files = region_paths(region_files, &config);
                let set = load_regions(&files, &config.aggregation)?;
                Some(RegionAggregator::with_config(Arc::new(set), config.aggregation.clone()))
            } else {
                None
            };
            let request = FieldRequest {
                variable,
                time,
                level_hpa: level,
                regions,
                all_regions,
                compare_next,
            };
            let report = commands::field(&dataset, &config, aggregator.as_ref(), &request)?;
            if let Some(dir) = export {
                commands::export_field(&report, &dataset, &dir)?;
            }
            report.render(args.format)?
        }
        Command::Regions { files } => {
            let set = load_regions(&region_paths(files, &config), &config.aggregation)?;
            commands::regions(&set).render(args.format)?
        }
        Command::Sounding {
            time,
            row,
            col,
            lat,
            lon,
        } => {
            let dataset = load_dataset(&dataset_path(&args.dataset, &config)?)?;
            let location = match (row, col, lat, lon) {
                (Some(row), Some(col), _, _) => SoundingLocation::GridPoint(GridPoint::new(row, col)),
                (_, _, Some(lat), Some(lon)) => SoundingLocation::Nearest { lat, lon },
                _ => SoundingLocation::Center,
            };
            commands::sounding(&dataset, &config, time, location)?.render(args.format)?
        }
    };

    println!("{}", output.trim_end());
    Ok(())
}

fn init_tracing(config: &ExplorerConfig, log_level: Option<&str>) {
    let level = log_level.unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr so report output stays clean on stdout.
    if config.logging.format == "json" {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn dataset_path(arg: &Option<PathBuf>, config: &ExplorerConfig) -> Result<PathBuf> {
    arg.clone()
        .or_else(|| config.data.dataset.clone())
        .context("No dataset given; pass --dataset or set data.dataset in the config")
}

fn region_paths(files: Vec<PathBuf>, config: &ExplorerConfig) -> Vec<PathBuf> {
    if files.is_empty() {
        config.data.regions.clone()
    } else {
        files
    }
}
