// src/severity/scorer.rs

use crate::types::SeverityConfig;
use ndarray::ArrayView2;

/// Guards the relative-depth division when the context mean is near zero.
const EPSILON: f32 = 1e-6;

/// Combines target and context depth statistics into one severity score.
///
/// `relative = (mean_ctx - mean_tgt) / (mean_ctx + eps)` — with the
/// higher-is-closer depth convention, a recessed target (pothole) sits below
/// its context and produces a positive relative depth. The target's standard
/// deviation corroborates: rougher holes vary more. The combined score is
/// `depth_weight * relative + variance_weight * (std / variance_norm)`.
pub struct SeverityScorer {
    config: SeverityConfig,
}

impl SeverityScorer {
    pub fn new(config: SeverityConfig) -> Self {
        Self { config }
    }

    /// Score one target/context pair. Returns `None` when either region is
    /// empty or the arithmetic does not produce a finite value; the caller
    /// maps that to Unknown. Never returns NaN or infinity.
    pub fn score(&self, target: &ArrayView2<'_, f32>, context: &ArrayView2<'_, f32>) -> Option<f32> {
        let mean_target = target.mean()?;
        let mean_context = context.mean()?;

        let relative_depth = (mean_context - mean_target) / (mean_context + EPSILON);
        let deviation = target.std(0.0);

        let combined = self.config.depth_weight * relative_depth
            + self.config.variance_weight * (deviation / self.config.variance_norm);

        combined.is_finite().then_some(combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth_map::DepthMap;
    use crate::severity::extract_regions;
    use ndarray::Array2;

    fn scorer() -> SeverityScorer {
        SeverityScorer::new(SeverityConfig::default())
    }

    /// 100x100 map, everything at `road` except a recessed square at `hole`.
    fn map_with_hole(road: f32, hole: f32) -> DepthMap {
        let mut data = Array2::from_elem((100, 100), road);
        data.slice_mut(ndarray::s![40..60, 40..60]).fill(hole);
        DepthMap::new(data)
    }

    #[test]
    fn test_recessed_target_scores_positive() {
        let map = map_with_hole(0.8, 0.2);
        let pair = extract_regions(&map, &[40.0, 40.0, 60.0, 60.0]).unwrap();
        let score = scorer().score(&pair.target, &pair.context).unwrap();
        assert!(score > 0.0);
    }

    #[test]
    fn test_worked_example_geometry() {
        // Context is the 40x40 window [30,70)x[30,70): 400 hole pixels at
        // 0.2 diluted into 1200 road pixels at 0.8 -> mean 0.65. Uniform
        // target, so the variance term is zero.
        let map = map_with_hole(0.8, 0.2);
        let pair = extract_regions(&map, &[40.0, 40.0, 60.0, 60.0]).unwrap();
        let score = scorer().score(&pair.target, &pair.context).unwrap();

        let expected = 0.7 * (0.65 - 0.2) / (0.65 + 1e-6);
        assert!((score - expected).abs() < 1e-4, "score = {}", score);
    }

    #[test]
    fn test_deeper_hole_never_scores_lower() {
        // Holding variance fixed (uniform fills), deepening the hole must
        // not decrease the combined score.
        let mut previous = f32::NEG_INFINITY;
        for hole in [0.7, 0.5, 0.3, 0.1] {
            let map = map_with_hole(0.8, hole);
            let pair = extract_regions(&map, &[40.0, 40.0, 60.0, 60.0]).unwrap();
            let score = scorer().score(&pair.target, &pair.context).unwrap();
            assert!(score >= previous, "hole {} scored {}", hole, score);
            previous = score;
        }
    }

    #[test]
    fn test_raised_target_scores_negative() {
        // A bump (closer than its surroundings) must not read as a hole.
        let map = map_with_hole(0.3, 0.9);
        let pair = extract_regions(&map, &[40.0, 40.0, 60.0, 60.0]).unwrap();
        let score = scorer().score(&pair.target, &pair.context).unwrap();
        assert!(score < 0.0);
    }

    #[test]
    fn test_zero_context_mean_stays_finite() {
        let map = DepthMap::new(Array2::zeros((50, 50)));
        let pair = extract_regions(&map, &[10.0, 10.0, 30.0, 30.0]).unwrap();
        let score = scorer().score(&pair.target, &pair.context).unwrap();
        assert!(score.is_finite());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_empty_region_yields_no_score() {
        let map = DepthMap::new(Array2::zeros((50, 50)));
        let empty = map.region(10, 10, 10, 10);
        let context = map.region(0, 50, 0, 50);
        assert!(scorer().score(&empty, &context).is_none());
    }

    #[test]
    fn test_variance_raises_score() {
        // Same means, but a rough target must outscore a smooth one.
        let smooth = map_with_hole(0.8, 0.2);
        let mut rough = Array2::from_elem((100, 100), 0.8);
        for y in 40..60 {
            for x in 40..60 {
                rough[[y, x]] = if (x + y) % 2 == 0 { 0.0 } else { 0.4 };
            }
        }
        let rough = DepthMap::new(rough);

        let bbox = [40.0, 40.0, 60.0, 60.0];
        let smooth_pair = extract_regions(&smooth, &bbox).unwrap();
        let rough_pair = extract_regions(&rough, &bbox).unwrap();

        let smooth_score = scorer().score(&smooth_pair.target, &smooth_pair.context).unwrap();
        let rough_score = scorer().score(&rough_pair.target, &rough_pair.context).unwrap();
        assert!(rough_score > smooth_score);
    }
}
