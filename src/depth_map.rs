// src/depth_map.rs

use anyhow::{bail, Result};
use ndarray::{Array2, ArrayView2};

/// Dense per-pixel depth field for one image, shape (H, W).
///
/// Convention inherited from the depth estimator: higher value = closer to
/// the camera. A pothole (recessed surface) therefore has *lower* values
/// than the road around it. The scoring sign depends on this polarity.
///
/// Built once per image, read-only afterwards.
#[derive(Debug, Clone)]
pub struct DepthMap {
    data: Array2<f32>,
}

impl DepthMap {
    pub fn new(data: Array2<f32>) -> Self {
        Self { data }
    }

    /// Wrap a row-major buffer of `height * width` values.
    pub fn from_raw(data: Vec<f32>, height: usize, width: usize) -> Result<Self> {
        if data.len() != height * width {
            bail!(
                "Depth buffer size {} does not match {}x{}",
                data.len(),
                height,
                width
            );
        }
        Ok(Self {
            data: Array2::from_shape_vec((height, width), data)?,
        })
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// Rectangular view `[y1, y2) x [x1, x2)`. Callers must pass bounds
    /// already clamped to the map shape.
    pub fn region(&self, y1: usize, y2: usize, x1: usize, x2: usize) -> ArrayView2<'_, f32> {
        self.data.slice(ndarray::s![y1..y2, x1..x2])
    }
}
