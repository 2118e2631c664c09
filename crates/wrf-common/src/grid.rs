//! Grid geometry for WRF model output.
//!
//! WRF arrays are laid out `(bottom_top, south_north, west_east)` once the
//! time dimension has been removed. Some variables live on staggered grids
//! with one extra point along a single axis.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{WrfError, WrfResult};

/// Dimensions of the unstaggered (mass-point) grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridShape {
    /// Number of vertical (bottom_top) levels
    pub nz: usize,
    /// Number of rows (south_north)
    pub ny: usize,
    /// Number of columns (west_east)
    pub nx: usize,
}

impl GridShape {
    pub fn new(nz: usize, ny: usize, nx: usize) -> Self {
        Self { nz, ny, nx }
    }

    /// Horizontal shape as `(rows, cols)`.
    pub fn horizontal(&self) -> (usize, usize) {
        (self.ny, self.nx)
    }

    /// Expected 3-D shape of a variable on the given stagger.
    pub fn staggered(&self, stagger: Stagger) -> [usize; 3] {
        let mut shape = [self.nz, self.ny, self.nx];
        if let Some(axis) = stagger.axis_3d() {
            shape[axis] += 1;
        }
        shape
    }

    /// Total number of horizontal points.
    pub fn len(&self) -> usize {
        self.ny * self.nx
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.ny == 0 || self.nx == 0
    }

    /// Validate a horizontal grid point against this shape.
    pub fn check_point(&self, point: GridPoint) -> WrfResult<()> {
        if point.row >= self.ny || point.col >= self.nx {
            return Err(WrfError::GridPointOutOfRange {
                row: point.row,
                col: point.col,
                rows: self.ny,
                cols: self.nx,
            });
        }
        Ok(())
    }
}

/// Which axis, if any, a variable is staggered along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stagger {
    /// Mass point (unstaggered)
    None,
    /// Staggered along west_east (U)
    WestEast,
    /// Staggered along south_north (V)
    SouthNorth,
    /// Staggered along bottom_top (W, PH, PHB)
    BottomTop,
}

impl Stagger {
    /// Detect stagger from WRF dimension names.
    pub fn from_dimension_names<S: AsRef<str>>(dims: &[S]) -> Self {
        for dim in dims {
            match dim.as_ref() {
                "west_east_stag" => return Stagger::WestEast,
                "south_north_stag" => return Stagger::SouthNorth,
                "bottom_top_stag" => return Stagger::BottomTop,
                _ => {}
            }
        }
        Stagger::None
    }

    /// Axis index within a `(bottom_top, south_north, west_east)` array.
    pub fn axis_3d(&self) -> Option<usize> {
        match self {
            Stagger::None => None,
            Stagger::BottomTop => Some(0),
            Stagger::SouthNorth => Some(1),
            Stagger::WestEast => Some(2),
        }
    }

    pub fn is_staggered(&self) -> bool {
        !matches!(self, Stagger::None)
    }
}

/// A horizontal grid location by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    /// south_north index
    pub row: usize,
    /// west_east index
    pub col: usize,
}

impl GridPoint {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// The middle of a grid, the default sounding location.
    pub fn center_of(shape: &GridShape) -> Self {
        Self {
            row: shape.ny / 2,
            col: shape.nx / 2,
        }
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Vertical domain a variable is requested on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalDomain {
    /// Single-level surface diagnostics (2 m / 10 m / accumulated)
    Surface,
    /// Interpolated to an isobaric surface
    Pressure,
}

impl VerticalDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerticalDomain::Surface => "surface",
            VerticalDomain::Pressure => "pressure",
        }
    }
}

impl fmt::Display for VerticalDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
