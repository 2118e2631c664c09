//! Moving staggered variables onto the mass-point grid.

use ndarray::{Array, Array3, ArrayView, Axis, Dimension, Slice, Zip};
use wrf_common::{Stagger, WrfError, WrfResult};

/// Average adjacent values along `axis`.
///
/// The output is one element shorter than the input along `axis`, and each
/// output cell is the arithmetic mean of its two staggered neighbours.
pub fn destagger<D: Dimension>(array: ArrayView<'_, f32, D>, axis: Axis) -> WrfResult<Array<f32, D>> {
    if axis.index() >= array.ndim() {
        return Err(WrfError::shape_mismatch(format!(
            "cannot destagger axis {} of a {}-dimensional array",
            axis.index(),
            array.ndim()
        )));
    }

    let n = array.len_of(axis);
    if n < 2 {
        return Err(WrfError::shape_mismatch(format!(
            "staggered axis {} has {} points, need at least 2",
            axis.index(),
            n
        )));
    }

    let lower = array.slice_axis(axis, Slice::from(..n - 1));
    let upper = array.slice_axis(axis, Slice::from(1..));

    Ok(Zip::from(lower)
        .and(upper)
        .map_collect(|&a, &b| (a + b) / 2.0))
}

/// A 3-D variable still on its staggered grid.
///
/// The raw values are not exposed for arithmetic; the only way to combine
/// them with mass-point data is through [`StaggeredField::destagger`].
#[derive(Debug, Clone)]
pub struct StaggeredField {
    name: String,
    data: Array3<f32>,
    stagger: Stagger,
}

impl StaggeredField {
    /// Wrap a staggered array. Fails if `stagger` is [`Stagger::None`].
    pub fn new(name: impl Into<String>, data: Array3<f32>, stagger: Stagger) -> WrfResult<Self> {
        let name = name.into();
        if !stagger.is_staggered() {
            return Err(WrfError::shape_mismatch(format!(
                "'{}' is on the mass grid, not a staggered grid",
                name
            )));
        }
        Ok(Self {
            name,
            data,
            stagger,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stagger(&self) -> Stagger {
        self.stagger
    }

    /// Shape on the staggered grid.
    pub fn staggered_shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Values on the mass-point grid.
    pub fn destagger(&self) -> WrfResult<Array3<f32>> {
        let axis = self
            .stagger
            .axis_3d()
            .ok_or_else(|| WrfError::shape_mismatch(format!("'{}' has no staggered axis", self.name)))?;
        destagger(self.data.view(), Axis(axis))
    }
}
