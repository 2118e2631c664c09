//! Common types shared across the WRF explorer workspace.

pub mod bbox;
pub mod dataset;
pub mod error;
pub mod grid;
pub mod time;
pub mod units;

pub use bbox::BoundingBox;
pub use dataset::{Dataset, InMemoryDataset, RawVariable};
pub use error::{WrfError, WrfResult};
pub use grid::{GridPoint, GridShape, Stagger, VerticalDomain};
pub use time::ModelTime;
pub use units::{kg_per_kg_to_g_per_kg, Celsius, Hectopascals, Kelvin, Pascals, Unit};
