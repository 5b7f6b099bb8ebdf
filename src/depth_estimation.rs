// src/depth_estimation.rs

use crate::depth_map::DepthMap;
use crate::image_processor::resize_rgb_bilinear;
use crate::types::{DepthConfig, ImageFrame};
use anyhow::{bail, Context, Result};
use ort::{
    execution_providers::CUDAExecutionProvider,
    session::{builder::GraphOptimizationLevel, Session},
};
use tracing::{debug, info};

// ImageNet statistics, matching the MiDaS training transform.
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Monocular depth estimator wrapped around a MiDaS ONNX session.
///
/// Output convention: higher value = closer to the camera. The map is
/// upsampled back to the source resolution so bounding boxes index straight
/// into it. Expensive to initialize; built once in `main` and injected into
/// the pipeline, never re-created per image.
pub struct DepthEstimator {
    session: Session,
    input_size: usize,
}

impl DepthEstimator {
    pub fn new(config: &DepthConfig) -> Result<Self> {
        info!("Loading depth model: {}", config.model_path);

        let session = Session::builder()?
            .with_execution_providers([CUDAExecutionProvider::default().with_device_id(0).build()])?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.num_threads)?
            .commit_from_file(&config.model_path)
            .context("Failed to load depth model")?;

        info!("✓ Depth estimator initialized");
        Ok(Self {
            session,
            input_size: config.input_size,
        })
    }

    /// Estimate a dense depth map at the frame's resolution.
    pub fn estimate(&mut self, frame: &ImageFrame) -> Result<DepthMap> {
        let input = self.preprocess(frame);

        let shape = [1, 3, self.input_size, self.input_size];
        let input_value =
            ort::value::Value::from_array((shape.as_slice(), input.into_boxed_slice()))?;

        let outputs = self.session.run(ort::inputs!["input" => input_value])?;
        let output = &outputs[0];
        let (output_shape, data) = output.try_extract_tensor::<f32>()?;

        let dims: Vec<usize> = output_shape.iter().map(|&d| d as usize).collect();
        debug!("Depth model output shape: {:?}", dims);

        // Accept [1, H, W] or [1, 1, H, W].
        let (out_h, out_w) = match dims.as_slice() {
            [1, h, w] => (*h, *w),
            [1, 1, h, w] => (*h, *w),
            _ => bail!("Unexpected depth output shape {:?}", dims),
        };
        if data.len() != out_h * out_w {
            bail!("Depth output size {} does not match {:?}", data.len(), dims);
        }

        let upsampled = resize_depth_bilinear(data, out_w, out_h, frame.width, frame.height);
        DepthMap::from_raw(upsampled, frame.height, frame.width)
    }

    /// Square resize + ImageNet normalization, HWC -> CHW.
    fn preprocess(&self, frame: &ImageFrame) -> Vec<f32> {
        let size = self.input_size;
        let resized = resize_rgb_bilinear(&frame.data, frame.width, frame.height, size, size);

        let mut input = vec![0.0f32; 3 * size * size];
        for c in 0..3 {
            for h in 0..size {
                for w in 0..size {
                    let px = resized[(h * size + w) * 3 + c] as f32 / 255.0;
                    input[c * size * size + h * size + w] = (px - MEAN[c]) / STD[c];
                }
            }
        }
        input
    }
}

/// Bilinear upsample of a single-channel f32 plane.
fn resize_depth_bilinear(
    src: &[f32],
    src_w: usize,
    src_h: usize,
    dst_w: usize,
    dst_h: usize,
) -> Vec<f32> {
    let mut dst = vec![0.0f32; dst_h * dst_w];
    let x_ratio = src_w as f32 / dst_w as f32;
    let y_ratio = src_h as f32 / dst_h as f32;

    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let sx = dx as f32 * x_ratio;
            let sy = dy as f32 * y_ratio;
            let sx0 = sx.floor() as usize;
            let sy0 = sy.floor() as usize;
            let sx1 = (sx0 + 1).min(src_w - 1);
            let sy1 = (sy0 + 1).min(src_h - 1);
            let fx = sx - sx0 as f32;
            let fy = sy - sy0 as f32;

            let p00 = src[sy0 * src_w + sx0];
            let p10 = src[sy0 * src_w + sx1];
            let p01 = src[sy1 * src_w + sx0];
            let p11 = src[sy1 * src_w + sx1];

            dst[dy * dst_w + dx] = p00 * (1.0 - fx) * (1.0 - fy)
                + p10 * fx * (1.0 - fy)
                + p01 * (1.0 - fx) * fy
                + p11 * fx * fy;
        }
    }
    dst
}
