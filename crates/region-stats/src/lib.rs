//! Regional Aggregation
//!
//! Polygon regions (counties and sub-counties) and summary statistics of
//! gridded 2-D fields over them.
//!
//! - **Regions**: loaded from GeoJSON FeatureCollections (GADM-style
//!   `NAME_1`/`NAME_2` properties) or WKT
//! - **Membership**: boundary-inclusive ray casting with a bounding-box
//!   prefilter; holes are excluded
//! - **Aggregation**: mean/min/max over the grid samples inside a region,
//!   with "no samples" as an ordinary outcome
//!
//! # Architecture
//!
//! ```text
//! GeoJSON / WKT ──► RegionSet (Arc, read-only)
//!                        │
//!   field, lats, lons    │
//!          │             ▼
//!          └────► RegionAggregator::summarize("nairobi", ...)
//!                        │
//!                        ├─► RegionSet::get        case-insensitive
//!                        ├─► MultiPolygon::contains per sample
//!                        └─► mean / min / max, rounded
//!                                 │
//!                                 ▼
//!              Aggregation::Summary | Aggregation::NoSamplesFound
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use region_stats::{AggregationConfig, RegionAggregator, RegionSet};
//!
//! let regions = RegionSet::from_geojson_str(&geojson, &AggregationConfig::default())?;
//! let aggregator = RegionAggregator::new(Arc::new(regions));
//! let result = aggregator.summarize("Nairobi", field.view(), lats.view(), lons.view())?;
//! ```

pub mod aggregate;
pub mod config;
pub mod geojson;
pub mod mask;
pub mod polygon;
pub mod region;
pub mod stats;

pub use aggregate::{Aggregation, RegionAggregator, RegionSummary};
pub use config::{round_to, AggregationConfig};
pub use geojson::{Feature, FeatureCollection, Geometry};
pub use mask::RegionMask;
pub use polygon::{locate_in_ring, MultiPolygon, Polygon, RingLocation};
pub use region::{Region, RegionSet};
pub use stats::{classify_temperature_anomaly, AnomalyClass, FieldStatistics, TemperatureAnomaly};
