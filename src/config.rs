use crate::types::Config;
use anyhow::{Context, Result};
use std::fs;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use crate::types::SeverityConfig;

    #[test]
    fn test_severity_defaults_match_calibration() {
        let cfg = SeverityConfig::default();
        assert_eq!(cfg.depth_weight, 0.7);
        assert_eq!(cfg.variance_weight, 0.3);
        assert_eq!(cfg.variance_norm, 100.0);
        assert_eq!(cfg.medium_threshold, 0.15);
        assert_eq!(cfg.high_threshold, 0.35);
    }

    #[test]
    fn test_severity_section_is_optional() {
        let yaml = r#"
model:
  path: models/pothole.onnx
  input_size: 640
  num_threads: 4
depth:
  enabled: true
  model_path: models/midas_small.onnx
  input_size: 256
  num_threads: 4
detection:
  confidence_threshold: 0.25
  iou_threshold: 0.45
images:
  input_dir: input
  output_dir: results
  save_annotated: true
  save_report: true
logging:
  level: info
"#;
        let config: crate::types::Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.severity.medium_threshold, 0.15);
        assert_eq!(config.detection.confidence_threshold, 0.25);
    }
}
