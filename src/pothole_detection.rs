// src/pothole_detection.rs

use crate::image_processor::resize_rgb_bilinear;
use crate::types::{ImageFrame, ModelConfig};
use anyhow::{bail, Context, Result};
use ort::{
    execution_providers::CUDAExecutionProvider,
    session::{builder::GraphOptimizationLevel, Session},
};
use serde::Serialize;
use tracing::{debug, info};

/// One detected pothole in original image coordinates.
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub bbox: [f32; 4], // [x1, y1, x2, y2]
    pub confidence: f32,
    pub class_id: usize,
}

/// YOLOv8 pothole detector wrapped around an ONNX Runtime session.
///
/// The model is consumed as a black box: letterbox in, raw prediction grid
/// out, decoded and NMS-filtered here. Everything downstream only sees the
/// final `Detection` list.
pub struct PotholeDetector {
    session: Session,
    input_size: usize,
}

impl PotholeDetector {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        info!("Loading pothole model: {}", config.path);

        let session = Session::builder()?
            .with_execution_providers([CUDAExecutionProvider::default().with_device_id(0).build()])?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.num_threads)?
            .commit_from_file(&config.path)
            .context("Failed to load pothole model")?;

        info!("✓ Pothole detector initialized");
        Ok(Self {
            session,
            input_size: config.input_size,
        })
    }

    pub fn detect(
        &mut self,
        frame: &ImageFrame,
        confidence_threshold: f32,
        iou_threshold: f32,
    ) -> Result<Vec<Detection>> {
        let letterbox = Letterbox::fit(frame.width, frame.height, self.input_size);
        let input = self.preprocess(frame, &letterbox);

        let (shape, output) = self.infer(&input)?;
        let detections = decode_predictions(
            &output,
            &shape,
            &letterbox,
            confidence_threshold,
            iou_threshold,
        )?;

        debug!("Detected {} pothole(s)", detections.len());
        Ok(detections)
    }

    /// Letterbox to a square canvas (gray padding), normalize to [0, 1],
    /// HWC -> CHW.
    fn preprocess(&self, frame: &ImageFrame, letterbox: &Letterbox) -> Vec<f32> {
        let size = self.input_size;
        let resized = resize_rgb_bilinear(
            &frame.data,
            frame.width,
            frame.height,
            letterbox.scaled_w,
            letterbox.scaled_h,
        );

        let mut canvas = vec![114u8; size * size * 3];
        let pad_x = letterbox.pad_x as usize;
        let pad_y = letterbox.pad_y as usize;
        for y in 0..letterbox.scaled_h {
            for x in 0..letterbox.scaled_w {
                let src_idx = (y * letterbox.scaled_w + x) * 3;
                let dst_idx = ((y + pad_y) * size + (x + pad_x)) * 3;
                canvas[dst_idx..dst_idx + 3].copy_from_slice(&resized[src_idx..src_idx + 3]);
            }
        }

        let mut input = vec![0.0f32; 3 * size * size];
        for c in 0..3 {
            for h in 0..size {
                for w in 0..size {
                    let hwc_idx = (h * size + w) * 3 + c;
                    let chw_idx = c * size * size + h * size + w;
                    input[chw_idx] = canvas[hwc_idx] as f32 / 255.0;
                }
            }
        }
        input
    }

    fn infer(&mut self, input: &[f32]) -> Result<(Vec<usize>, Vec<f32>)> {
        let shape = [1, 3, self.input_size, self.input_size];
        let input_value =
            ort::value::Value::from_array((shape.as_slice(), input.to_vec().into_boxed_slice()))?;

        let outputs = self.session.run(ort::inputs!["images" => input_value])?;
        let output = &outputs[0];
        let (output_shape, data) = output.try_extract_tensor::<f32>()?;

        let dims: Vec<usize> = output_shape.iter().map(|&d| d as usize).collect();
        Ok((dims, data.to_vec()))
    }
}

/// Letterbox geometry: scale to fit the square input while keeping aspect
/// ratio, pad symmetrically.
#[derive(Debug, Clone, Copy)]
pub struct Letterbox {
    pub scale: f32,
    pub scaled_w: usize,
    pub scaled_h: usize,
    pub pad_x: f32,
    pub pad_y: f32,
}

impl Letterbox {
    pub fn fit(src_w: usize, src_h: usize, target: usize) -> Self {
        let scale = (target as f32 / src_w as f32).min(target as f32 / src_h as f32);
        let scaled_w = (src_w as f32 * scale) as usize;
        let scaled_h = (src_h as f32 * scale) as usize;
        Self {
            scale,
            scaled_w,
            scaled_h,
            pad_x: (target - scaled_w) as f32 / 2.0,
            pad_y: (target - scaled_h) as f32 / 2.0,
        }
    }

    /// Map a letterboxed coordinate back to the original image.
    fn unmap(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

/// Decode a YOLOv8 output grid of shape [1, 4 + num_classes, num_preds]:
/// center-format box rows first, then one confidence row per class.
fn decode_predictions(
    output: &[f32],
    shape: &[usize],
    letterbox: &Letterbox,
    confidence_threshold: f32,
    iou_threshold: f32,
) -> Result<Vec<Detection>> {
    if shape.len() != 3 || shape[1] < 5 {
        bail!("Unexpected model output shape {:?}", shape);
    }
    let num_attrs = shape[1];
    let num_preds = shape[2];
    let num_classes = num_attrs - 4;
    if output.len() != shape[0] * num_attrs * num_preds {
        bail!("Model output size {} does not match shape {:?}", output.len(), shape);
    }

    let mut detections = Vec::new();

    for i in 0..num_preds {
        let cx = output[i];
        let cy = output[num_preds + i];
        let w = output[num_preds * 2 + i];
        let h = output[num_preds * 3 + i];

        let mut max_conf = 0.0f32;
        let mut best_class = 0;
        for c in 0..num_classes {
            let conf = output[num_preds * (4 + c) + i];
            if conf > max_conf {
                max_conf = conf;
                best_class = c;
            }
        }

        if max_conf < confidence_threshold {
            continue;
        }

        let (x1, y1) = letterbox.unmap(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = letterbox.unmap(cx + w / 2.0, cy + h / 2.0);

        detections.push(Detection {
            bbox: [x1, y1, x2, y2],
            confidence: max_conf,
            class_id: best_class,
        });
    }

    Ok(nms(detections, iou_threshold))
}

fn nms(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    if detections.is_empty() {
        return detections;
    }

    detections.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());

    let mut keep = Vec::new();
    while !detections.is_empty() {
        let current = detections.remove(0);
        detections.retain(|det| calculate_iou(&current.bbox, &det.bbox) < iou_threshold);
        keep.push(current);
    }
    keep
}

fn calculate_iou(box1: &[f32; 4], box2: &[f32; 4]) -> f32 {
    let x1 = box1[0].max(box2[0]);
    let y1 = box1[1].max(box2[1]);
    let x2 = box1[2].min(box2[2]);
    let y2 = box1[3].min(box2[3]);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let area1 = (box1[2] - box1[0]) * (box1[3] - box1[1]);
    let area2 = (box2[2] - box2[0]) * (box2[3] - box2[1]);
    let union = area1 + area2 - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}
