// src/severity/batch.rs

use crate::depth_map::DepthMap;
use crate::pothole_detection::Detection;
use crate::severity::{extract_regions, SeverityClassifier, SeverityResult, SeverityScorer};
use crate::types::SeverityConfig;
use tracing::warn;

/// Severity verdicts for one image, one result per detection in input order.
#[derive(Debug, Clone)]
pub struct BatchSeverity {
    pub results: Vec<SeverityResult>,
    /// False when the depth map was unavailable and the whole batch degraded
    /// to Unknown. Lets the caller log "severity unavailable" once instead
    /// of once per detection.
    pub depth_available: bool,
}

/// Runs the region -> score -> label pipeline over a detection list.
///
/// Degradation is per detection: a degenerate box or an unscorable region
/// turns into the Unknown verdict for that detection only, the rest of the
/// batch proceeds. The depth map and severity knobs are injected; this type
/// holds no model handles and no mutable state.
pub struct BatchSeverityClassifier {
    scorer: SeverityScorer,
    classifier: SeverityClassifier,
}

impl BatchSeverityClassifier {
    pub fn new(config: SeverityConfig) -> Self {
        Self {
            scorer: SeverityScorer::new(config.clone()),
            classifier: SeverityClassifier::new(config),
        }
    }

    /// Classify every detection against one depth map. Always returns
    /// exactly `detections.len()` results, in input order. `None` for the
    /// depth map means the upstream estimator was unavailable: every
    /// detection degrades to Unknown and `depth_available` is false.
    pub fn classify_all(
        &self,
        depth: Option<&DepthMap>,
        detections: &[Detection],
    ) -> BatchSeverity {
        let Some(depth) = depth else {
            if !detections.is_empty() {
                warn!(
                    "Depth map unavailable, severity unknown for {} detection(s)",
                    detections.len()
                );
            }
            return BatchSeverity {
                results: vec![SeverityResult::unknown(); detections.len()],
                depth_available: false,
            };
        };

        let results = detections
            .iter()
            .map(|det| self.classify_detection(depth, &det.bbox))
            .collect();

        BatchSeverity {
            results,
            depth_available: true,
        }
    }

    /// Score one bounding box. The degenerate and no-score paths collapse to
    /// Unknown here so the scorer itself stays fallible-free.
    pub fn classify_detection(&self, depth: &DepthMap, bbox: &[f32; 4]) -> SeverityResult {
        let verdict = extract_regions(depth, bbox)
            .and_then(|pair| self.scorer.score(&pair.target, &pair.context))
            .map(|score| self.classifier.classify(score));

        verdict.unwrap_or_else(SeverityResult::unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::severity::SeverityLabel;
    use ndarray::Array2;

    fn detection(bbox: [f32; 4]) -> Detection {
        Detection {
            bbox,
            confidence: 0.9,
            class_id: 0,
        }
    }

    fn pipeline() -> BatchSeverityClassifier {
        BatchSeverityClassifier::new(SeverityConfig::default())
    }

    fn map_with_hole() -> DepthMap {
        let mut data = Array2::from_elem((100, 100), 0.8);
        data.slice_mut(ndarray::s![40..60, 40..60]).fill(0.2);
        DepthMap::new(data)
    }

    #[test]
    fn test_one_result_per_detection_in_order() {
        let map = map_with_hole();
        let detections = vec![
            detection([40.0, 40.0, 60.0, 60.0]), // the hole
            detection([30.0, 10.0, 10.0, 30.0]), // inverted -> Unknown
            detection([5.0, 5.0, 15.0, 15.0]),   // flat road
        ];

        let batch = pipeline().classify_all(Some(&map), &detections);
        assert_eq!(batch.results.len(), 3);
        assert!(batch.depth_available);

        assert!(batch.results[0].label > SeverityLabel::Low);
        assert_eq!(batch.results[1].label, SeverityLabel::Unknown);
        assert_eq!(batch.results[1].score, 0.0);
        assert_eq!(batch.results[2].label, SeverityLabel::Low);
    }

    #[test]
    fn test_missing_depth_degrades_whole_batch() {
        let detections = vec![
            detection([10.0, 10.0, 30.0, 30.0]),
            detection([40.0, 40.0, 60.0, 60.0]),
        ];

        let batch = pipeline().classify_all(None, &detections);
        assert!(!batch.depth_available);
        assert_eq!(batch.results.len(), 2);
        for result in &batch.results {
            assert_eq!(result.label, SeverityLabel::Unknown);
            assert_eq!(result.score, 0.0);
        }
    }

    #[test]
    fn test_empty_batch() {
        let map = map_with_hole();
        let batch = pipeline().classify_all(Some(&map), &[]);
        assert!(batch.results.is_empty());
        assert!(batch.depth_available);
    }

    #[test]
    fn test_bad_box_does_not_poison_neighbors() {
        let map = map_with_hole();
        let detections = vec![
            detection([f32::NAN, f32::NAN, f32::NAN, f32::NAN]),
            detection([40.0, 40.0, 60.0, 60.0]),
            detection([-500.0, -500.0, -400.0, -400.0]),
        ];

        let batch = pipeline().classify_all(Some(&map), &detections);
        assert_eq!(batch.results.len(), 3);
        assert_eq!(batch.results[0].label, SeverityLabel::Unknown);
        assert!(batch.results[1].label > SeverityLabel::Low);
        assert_eq!(batch.results[2].label, SeverityLabel::Unknown);
    }

    #[test]
    fn test_worked_example_lands_high() {
        // 20x20 hole at 0.2 inside 0.8 road: diluted context mean is 0.65,
        // relative depth ~0.69, combined ~0.48 with zero variance.
        let map = map_with_hole();
        let result = pipeline().classify_detection(&map, &[40.0, 40.0, 60.0, 60.0]);
        assert_eq!(result.label, SeverityLabel::High);
        assert!((result.score - 0.4846).abs() < 1e-3);
    }
}
