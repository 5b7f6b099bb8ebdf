// src/severity/region.rs

use crate::depth_map::DepthMap;
use ndarray::ArrayView2;

/// Target region of a detection plus its surrounding context, both borrowed
/// from the same depth map.
///
/// The context window is the target box expanded by half the target width on
/// each horizontal side and half the target height on each vertical side,
/// re-clamped to the map. It deliberately keeps the target pixels inside it:
/// the context mean is diluted by the target rather than masked against it,
/// and the calibrated thresholds assume that dilution.
#[derive(Debug)]
pub struct RegionPair<'a> {
    pub target: ArrayView2<'a, f32>,
    pub context: ArrayView2<'a, f32>,
}

/// Pixel-index box, clamped to map bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelBox {
    x1: usize,
    y1: usize,
    x2: usize,
    y2: usize,
}

/// Carve the target and context regions for one bounding box.
///
/// Coordinates are truncated to integer pixel indices and clamped to
/// `[0, W) x [0, H)` before slicing, so the returned views are always fully
/// inside the map. A box with zero or negative area after clamping is a
/// degenerate region and yields `None`; the caller degrades that detection
/// to Unknown severity.
pub fn extract_regions<'a>(depth: &'a DepthMap, bbox: &[f32; 4]) -> Option<RegionPair<'a>> {
    let target = clamp_box(bbox, depth.width(), depth.height())?;

    // Margins come from the target dimensions, not the expanded box.
    let margin_x = (target.x2 - target.x1) / 2;
    let margin_y = (target.y2 - target.y1) / 2;

    let context = PixelBox {
        x1: target.x1.saturating_sub(margin_x),
        y1: target.y1.saturating_sub(margin_y),
        x2: (target.x2 + margin_x).min(depth.width()),
        y2: (target.y2 + margin_y).min(depth.height()),
    };

    Some(RegionPair {
        target: depth.region(target.y1, target.y2, target.x1, target.x2),
        context: depth.region(context.y1, context.y2, context.x1, context.x2),
    })
}

/// Truncate to pixel indices and clamp to `[0, w) x [0, h)`.
///
/// Returns `None` when the clamped box encloses no pixels, which covers
/// inverted coordinates (x2 <= x1, y2 <= y1), boxes entirely outside the
/// map, and non-finite coordinates (NaN truncates to 0).
fn clamp_box(bbox: &[f32; 4], w: usize, h: usize) -> Option<PixelBox> {
    let x1 = (bbox[0] as i64).max(0) as usize;
    let y1 = (bbox[1] as i64).max(0) as usize;
    let x2 = ((bbox[2] as i64).max(0) as usize).min(w);
    let y2 = ((bbox[3] as i64).max(0) as usize).min(h);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    Some(PixelBox { x1, y1, x2, y2 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn flat_map(h: usize, w: usize, value: f32) -> DepthMap {
        DepthMap::new(Array2::from_elem((h, w), value))
    }

    #[test]
    fn test_regions_stay_inside_map() {
        let map = flat_map(100, 100, 0.5);

        // Box hanging over every edge.
        let pair = extract_regions(&map, &[-20.0, -20.0, 150.0, 150.0]).unwrap();
        assert_eq!(pair.target.shape(), &[100, 100]);
        assert_eq!(pair.context.shape(), &[100, 100]);

        // Box near a corner: context clamps, target keeps its size.
        let pair = extract_regions(&map, &[0.0, 0.0, 10.0, 10.0]).unwrap();
        assert_eq!(pair.target.shape(), &[10, 10]);
        assert_eq!(pair.context.shape(), &[15, 15]);
    }

    #[test]
    fn test_context_expansion_geometry() {
        let map = flat_map(100, 100, 0.0);
        let pair = extract_regions(&map, &[40.0, 40.0, 60.0, 60.0]).unwrap();
        // 20x20 target, 10px margins on every side.
        assert_eq!(pair.target.shape(), &[20, 20]);
        assert_eq!(pair.context.shape(), &[40, 40]);
    }

    #[test]
    fn test_inverted_box_is_degenerate() {
        let map = flat_map(50, 50, 0.0);
        assert!(extract_regions(&map, &[30.0, 10.0, 10.0, 30.0]).is_none());
        assert!(extract_regions(&map, &[10.0, 30.0, 30.0, 10.0]).is_none());
    }

    #[test]
    fn test_zero_area_box_is_degenerate() {
        let map = flat_map(50, 50, 0.0);
        assert!(extract_regions(&map, &[10.0, 10.0, 10.0, 30.0]).is_none());
        // Sub-pixel box collapses to zero width after truncation.
        assert!(extract_regions(&map, &[10.2, 10.0, 10.9, 30.0]).is_none());
    }

    #[test]
    fn test_box_outside_map_is_degenerate() {
        let map = flat_map(50, 50, 0.0);
        assert!(extract_regions(&map, &[60.0, 60.0, 80.0, 80.0]).is_none());
        assert!(extract_regions(&map, &[-30.0, -30.0, -10.0, -10.0]).is_none());
    }

    #[test]
    fn test_nan_coordinates_are_degenerate() {
        let map = flat_map(50, 50, 0.0);
        assert!(extract_regions(&map, &[f32::NAN, 10.0, f32::NAN, 30.0]).is_none());
    }

    #[test]
    fn test_margins_use_target_dimensions() {
        let map = flat_map(200, 200, 0.0);
        // 10x40 target: margin_x = 5, margin_y = 20.
        let pair = extract_regions(&map, &[100.0, 100.0, 110.0, 140.0]).unwrap();
        assert_eq!(pair.target.shape(), &[40, 10]);
        assert_eq!(pair.context.shape(), &[80, 20]);
    }
}
