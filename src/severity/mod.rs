// src/severity/mod.rs
//
// Depth-based severity pipeline: carve target + context regions out of the
// depth map, score the relative depth, map the score to a discrete label.

mod batch;
mod classifier;
mod region;
mod scorer;

pub use batch::{BatchSeverity, BatchSeverityClassifier};
pub use classifier::{SeverityClassifier, SeverityLabel, SeverityResult};
pub use region::{extract_regions, RegionPair};
pub use scorer::SeverityScorer;
