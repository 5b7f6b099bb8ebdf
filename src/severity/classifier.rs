// src/severity/classifier.rs

use crate::types::SeverityConfig;
use serde::{Deserialize, Serialize};

/// Discrete severity levels, ranked Low < Medium < High. `Unknown` is the
/// no-information state (degenerate box, missing depth), not the bottom of
/// the scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SeverityLabel {
    Unknown,
    Low,
    Medium,
    High,
}

impl SeverityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityLabel::Unknown => "Unknown",
            SeverityLabel::Low => "Low",
            SeverityLabel::Medium => "Medium",
            SeverityLabel::High => "High",
        }
    }

    /// Presentation color, passed through to report consumers as data.
    pub fn color(&self) -> &'static str {
        match self {
            SeverityLabel::Unknown => "#6b7280",
            SeverityLabel::Low => "#10b981",
            SeverityLabel::Medium => "#f59e0b",
            SeverityLabel::High => "#ef4444",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            SeverityLabel::Unknown => "white-circle",
            SeverityLabel::Low => "green-circle",
            SeverityLabel::Medium => "yellow-circle",
            SeverityLabel::High => "red-circle",
        }
    }
}

impl std::fmt::Display for SeverityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity verdict for one detection. Immutable value object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeverityResult {
    pub label: SeverityLabel,
    pub score: f32,
    pub color: &'static str,
    pub glyph: &'static str,
}

impl SeverityResult {
    fn from_label(label: SeverityLabel, score: f32) -> Self {
        Self {
            label,
            score,
            color: label.color(),
            glyph: label.glyph(),
        }
    }

    /// The no-information verdict used for degenerate boxes, missing depth
    /// data and per-detection failures. Score is pinned to 0.0.
    pub fn unknown() -> Self {
        Self::from_label(SeverityLabel::Unknown, 0.0)
    }
}

/// Pure score -> label mapping over the configured threshold table.
///
/// Scores on a threshold fall into the upper bucket (0.15 is Medium, 0.35 is
/// High): boundary ties resolve toward higher severity so a borderline hole
/// is never under-reported.
pub struct SeverityClassifier {
    config: SeverityConfig,
}

impl SeverityClassifier {
    pub fn new(config: SeverityConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, score: f32) -> SeverityResult {
        let label = if score < self.config.medium_threshold {
            SeverityLabel::Low
        } else if score < self.config.high_threshold {
            SeverityLabel::Medium
        } else {
            SeverityLabel::High
        };
        SeverityResult::from_label(label, score)
    }
}
