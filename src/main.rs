// src/main.rs

mod config;
mod depth_estimation;
mod depth_map;
mod image_processor;
mod pothole_detection;
mod report;
mod severity;
mod types;

use anyhow::Result;
use depth_estimation::DepthEstimator;
use depth_map::DepthMap;
use image_processor::ImageProcessor;
use pothole_detection::PotholeDetector;
use report::ImageReport;
use severity::{BatchSeverityClassifier, SeverityLabel};
use std::path::Path;
use tracing::{debug, error, info, warn};
use types::ImageFrame;

#[derive(Debug, Default)]
struct RunStats {
    images_processed: usize,
    images_failed: usize,
    total_detections: usize,
    high_severity: usize,
    medium_severity: usize,
    low_severity: usize,
    unknown_severity: usize,
}

fn main() -> Result<()> {
    let config = types::Config::load("config.yaml")?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "pothole_detection={},ort=warn",
            config.logging.level
        ))
        .init();

    info!("🕳️  Pothole Detection System Starting");
    info!("✓ Configuration loaded");
    info!(
        "Detection thresholds: conf={:.2}, iou={:.2} | severity: medium={:.2}, high={:.2}",
        config.detection.confidence_threshold,
        config.detection.iou_threshold,
        config.severity.medium_threshold,
        config.severity.high_threshold
    );

    let mut detector = PotholeDetector::new(&config.model)?;
    info!("✓ Pothole detector ready");

    // Depth is best-effort: without it every detection reports Unknown
    // severity, but detection itself still runs.
    let mut depth_estimator = if config.depth.enabled {
        match DepthEstimator::new(&config.depth) {
            Ok(estimator) => Some(estimator),
            Err(e) => {
                warn!("Could not load depth estimator: {:#}", e);
                warn!("Continuing without severity classification");
                None
            }
        }
    } else {
        info!("Depth estimation disabled in config");
        None
    };

    let severity_pipeline = BatchSeverityClassifier::new(config.severity.clone());
    let image_processor = ImageProcessor::new(config.clone());

    let image_files = image_processor.find_image_files()?;
    if image_files.is_empty() {
        error!("No image files found in {}", config.images.input_dir);
        return Ok(());
    }

    info!("Found {} image(s) to process", image_files.len());

    let mut stats = RunStats::default();

    for (idx, image_path) in image_files.iter().enumerate() {
        info!(
            "Processing image {}/{}: {}",
            idx + 1,
            image_files.len(),
            image_path.display()
        );

        match process_image(
            image_path,
            &image_processor,
            &mut detector,
            depth_estimator.as_mut(),
            &severity_pipeline,
            &config,
            &mut stats,
        ) {
            Ok(()) => stats.images_processed += 1,
            Err(e) => {
                error!("Failed to process {}: {:#}", image_path.display(), e);
                stats.images_failed += 1;
            }
        }
    }

    info!("\n========================================");
    info!("Run complete");
    info!("  Images processed: {}", stats.images_processed);
    if stats.images_failed > 0 {
        warn!("  Images failed: {}", stats.images_failed);
    }
    info!("  Potholes detected: {}", stats.total_detections);
    info!("  🔴 High severity: {}", stats.high_severity);
    info!("  🟡 Medium severity: {}", stats.medium_severity);
    info!("  🟢 Low severity: {}", stats.low_severity);
    if stats.unknown_severity > 0 {
        info!("  ⚪ Unknown severity: {}", stats.unknown_severity);
    }
    info!("========================================");

    Ok(())
}

fn process_image(
    image_path: &Path,
    image_processor: &ImageProcessor,
    detector: &mut PotholeDetector,
    depth_estimator: Option<&mut DepthEstimator>,
    severity_pipeline: &BatchSeverityClassifier,
    config: &types::Config,
    stats: &mut RunStats,
) -> Result<()> {
    let frame = image_processor.load_image(image_path)?;

    let detections = detector.detect(
        &frame,
        config.detection.confidence_threshold,
        config.detection.iou_threshold,
    )?;
    info!("  {} pothole(s) detected", detections.len());
    stats.total_detections += detections.len();

    let depth = estimate_depth(depth_estimator, &frame);
    let batch = severity_pipeline.classify_all(depth.as_ref(), &detections);

    for (detection, severity) in detections.iter().zip(&batch.results) {
        debug!(
            "  bbox=[{:.0},{:.0},{:.0},{:.0}] conf={:.2} severity={} score={:.3}",
            detection.bbox[0],
            detection.bbox[1],
            detection.bbox[2],
            detection.bbox[3],
            detection.confidence,
            severity.label,
            severity.score
        );
        match severity.label {
            SeverityLabel::High => stats.high_severity += 1,
            SeverityLabel::Medium => stats.medium_severity += 1,
            SeverityLabel::Low => stats.low_severity += 1,
            SeverityLabel::Unknown => stats.unknown_severity += 1,
        }
    }

    if config.images.save_report {
        let report = ImageReport::build(image_path, &detections, &batch);
        report.save(&config.images.output_dir, image_path)?;
    }

    if let Some(path) =
        image_processor.save_annotated(image_path, &frame, &detections, &batch.results)?
    {
        info!("  Annotated image saved to {}", path.display());
    }

    Ok(())
}

/// One depth map per image; a per-image estimator failure degrades that
/// image's severities to Unknown without aborting the run.
fn estimate_depth(estimator: Option<&mut DepthEstimator>, frame: &ImageFrame) -> Option<DepthMap> {
    let estimator = estimator?;
    match estimator.estimate(frame) {
        Ok(depth) => Some(depth),
        Err(e) => {
            warn!("Depth estimation failed: {:#}", e);
            None
        }
    }
}
