// src/image_processor.rs

use crate::pothole_detection::Detection;
use crate::severity::SeverityResult;
use crate::types::{Config, ImageFrame};
use anyhow::{Context, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

pub struct ImageProcessor {
    config: Config,
}

impl ImageProcessor {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn find_image_files(&self) -> Result<Vec<PathBuf>> {
        let mut images = Vec::new();

        let image_extensions = vec!["jpg", "jpeg", "png", "JPG", "JPEG", "PNG"];

        for entry in WalkDir::new(&self.config.images.input_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if let Some(ext) = path.extension() {
                if image_extensions.contains(&ext.to_str().unwrap_or("")) {
                    images.push(path.to_path_buf());
                }
            }
        }

        images.sort();
        info!("Found {} image files", images.len());
        Ok(images)
    }

    pub fn load_image(&self, path: &Path) -> Result<ImageFrame> {
        let img = image::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?
            .to_rgb8();
        let (width, height) = img.dimensions();

        Ok(ImageFrame {
            data: img.into_raw(),
            width: width as usize,
            height: height as usize,
        })
    }

    /// Write a copy of the frame with severity-colored boxes next to the
    /// report. Returns the output path, or `None` when annotation is off.
    pub fn save_annotated(
        &self,
        input_path: &Path,
        frame: &ImageFrame,
        detections: &[Detection],
        severities: &[SeverityResult],
    ) -> Result<Option<PathBuf>> {
        if !self.config.images.save_annotated {
            return Ok(None);
        }

        std::fs::create_dir_all(&self.config.images.output_dir)?;

        let mut canvas = frame.data.clone();
        for (detection, severity) in detections.iter().zip(severities) {
            let color = hex_to_rgb(severity.color);
            draw_rect(
                &mut canvas,
                frame.width,
                frame.height,
                &detection.bbox,
                color,
                2,
            );
        }

        let input_name = input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        let output_path = PathBuf::from(&self.config.images.output_dir)
            .join(format!("{}_annotated.jpg", input_name));

        let img = RgbImage::from_raw(frame.width as u32, frame.height as u32, canvas)
            .context("Annotated buffer has wrong size")?;
        img.save(&output_path)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;

        Ok(Some(output_path))
    }
}

/// Bilinear RGB resize over an interleaved HWC buffer.
pub fn resize_rgb_bilinear(
    src: &[u8],
    src_w: usize,
    src_h: usize,
    dst_w: usize,
    dst_h: usize,
) -> Vec<u8> {
    let mut dst = vec![0u8; dst_h * dst_w * 3];
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

            for c in 0..3 {
                let p00 = src[(sy0 * src_w + sx0) * 3 + c] as f32;
                let p10 = src[(sy0 * src_w + sx1) * 3 + c] as f32;
                let p01 = src[(sy1 * src_w + sx0) * 3 + c] as f32;
                let p11 = src[(sy1 * src_w + sx1) * 3 + c] as f32;

                let val = p00 * (1.0 - fx) * (1.0 - fy)
                    + p10 * fx * (1.0 - fy)
                    + p01 * (1.0 - fx) * fy
                    + p11 * fx * fy;

                dst[(dy * dst_w + dx) * 3 + c] = val.round() as u8;
            }
        }
    }
    dst
}

/// Stroke a rectangle onto an interleaved RGB buffer, clipped to the frame.
fn draw_rect(
    canvas: &mut [u8],
    width: usize,
    height: usize,
    bbox: &[f32; 4],
    color: [u8; 3],
    thickness: usize,
) {
    let x1 = (bbox[0].max(0.0) as usize).min(width.saturating_sub(1));
    let y1 = (bbox[1].max(0.0) as usize).min(height.saturating_sub(1));
    let x2 = (bbox[2].max(0.0) as usize).min(width.saturating_sub(1));
    let y2 = (bbox[3].max(0.0) as usize).min(height.saturating_sub(1));
    if x2 <= x1 || y2 <= y1 {
        return;
    }

    let mut put = |x: usize, y: usize| {
        let idx = (y * width + x) * 3;
        canvas[idx..idx + 3].copy_from_slice(&color);
    };

    for t in 0..thickness {
        for x in x1..=x2 {
            if y1 + t < height {
                put(x, y1 + t);
            }
            if y2 >= t {
                put(x, y2 - t);
            }
        }
        for y in y1..=y2 {
            if x1 + t < width {
                put(x1 + t, y);
            }
            if x2 >= t {
                put(x2 - t, y);
            }
        }
    }
}

/// Parse a `#rrggbb` presentation color. Falls back to gray on anything
/// malformed so a bad color never aborts annotation.
fn hex_to_rgb(hex: &str) -> [u8; 3] {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return [107, 114, 128];
    }
    let parse = |range| u8::from_str_radix(&hex[range], 16).unwrap_or(128);
    [parse(0..2), parse(2..4), parse(4..6)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_rgb_severity_palette() {
        assert_eq!(hex_to_rgb("#10b981"), [0x10, 0xb9, 0x81]);
        assert_eq!(hex_to_rgb("#ef4444"), [0xef, 0x44, 0x44]);
        assert_eq!(hex_to_rgb("not-a-color"), [107, 114, 128]);
    }

    #[test]
    fn test_resize_identity() {
        let src: Vec<u8> = (0..27).collect();
        assert_eq!(resize_rgb_bilinear(&src, 3, 3, 3, 3), src);
    }

    #[test]
    fn test_draw_rect_clips_to_frame() {
        let mut canvas = vec![0u8; 10 * 10 * 3];
        // Box hanging over the right/bottom edges must not panic.
        draw_rect(&mut canvas, 10, 10, &[5.0, 5.0, 50.0, 50.0], [255, 0, 0], 2);
        // Top-left corner of the stroke landed.
        assert_eq!(&canvas[(5 * 10 + 5) * 3..(5 * 10 + 5) * 3 + 3], &[255, 0, 0]);
    }
}
