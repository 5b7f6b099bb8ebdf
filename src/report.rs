// src/report.rs

use crate::pothole_detection::Detection;
use crate::severity::{BatchSeverity, SeverityResult};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Detection summary for one image, serialized as-is for downstream
/// consumers (dashboards, report renderers). Pure data, no formatting.
#[derive(Debug, Clone, Serialize)]
pub struct ImageReport {
    pub image: String,
    pub count: usize,
    pub depth_available: bool,
    pub detections: Vec<DetectionRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectionRecord {
    pub bbox: [f32; 4],
    pub confidence: f32,
    pub class_id: usize,
    pub severity: String,
    pub depth_score: f32,
    pub severity_color: String,
    pub severity_glyph: String,
}

impl ImageReport {
    pub fn build(image_path: &Path, detections: &[Detection], batch: &BatchSeverity) -> Self {
        let records = detections
            .iter()
            .zip(&batch.results)
            .map(|(det, severity)| DetectionRecord::new(det, severity))
            .collect();

        Self {
            image: image_path.display().to_string(),
            count: detections.len(),
            depth_available: batch.depth_available,
            detections: records,
        }
    }

    pub fn save(&self, output_dir: &str, image_path: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir)?;

        let image_name = image_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        let output_path = PathBuf::from(output_dir).join(format!("{}_report.json", image_name));

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&output_path, json)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;

        info!("💾 Report saved to {}", output_path.display());
        Ok(output_path)
    }
}

impl DetectionRecord {
    fn new(detection: &Detection, severity: &SeverityResult) -> Self {
        Self {
            bbox: detection.bbox,
            confidence: detection.confidence,
            class_id: detection.class_id,
            severity: severity.label.as_str().to_string(),
            depth_score: severity.score,
            severity_color: severity.color.to_string(),
            severity_glyph: severity.glyph.to_string(),
        }
    }
}
