use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    pub depth: DepthConfig,
    pub detection: DetectionConfig,
    #[serde(default)]
    pub severity: SeverityConfig,
    pub images: ImageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub path: String,
    pub input_size: usize,
    pub num_threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthConfig {
    pub enabled: bool,
    pub model_path: String,
    pub input_size: usize,
    pub num_threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
}

/// Severity scoring knobs. The weights, the variance normalizer and the
/// thresholds are calibrated to the depth estimator's typical output range;
/// the defaults are the calibrated values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityConfig {
    pub depth_weight: f32,
    pub variance_weight: f32,
    pub variance_norm: f32,
    pub medium_threshold: f32,
    pub high_threshold: f32,
}

impl Default for SeverityConfig {
    fn default() -> Self {
        Self {
            depth_weight: 0.7,
            variance_weight: 0.3,
            variance_norm: 100.0,
            medium_threshold: 0.15,
            high_threshold: 0.35,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    pub input_dir: String,
    pub output_dir: String,
    pub save_annotated: bool,
    pub save_report: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// One decoded RGB image, interleaved HWC.
#[derive(Debug, Clone)]
pub struct ImageFrame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
}
