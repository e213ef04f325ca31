use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use image::{Rgb, RgbImage};

use face_overlay::detect::{DetectionCapability, FaceDetector, FaceObservation};
use face_overlay::ingest::FileConfig;
use face_overlay::{
    CanvasSurface, Color, DetectionOrchestrator, DetectionOutcome, DisplayRect, FileSource,
    ImageSource, NormalizedRect, ShapeLayer, SharedDetector, Size, SourceImage, StubBackend,
};

const TIMEOUT: Duration = Duration::from_secs(5);

fn shared<B: FaceDetector + 'static>(backend: B) -> SharedDetector {
    Arc::new(Mutex::new(backend))
}

fn photo(width: u32, height: u32) -> SourceImage {
    SourceImage::from_rgb(RgbImage::new(width, height)).unwrap()
}

/// Finds one centered face, except in photos exactly 13 pixels wide.
struct PickyDetector;

impl FaceDetector for PickyDetector {
    fn name(&self) -> &'static str {
        "picky"
    }

    fn supports(&self, capability: DetectionCapability) -> bool {
        capability == DetectionCapability::FaceRectangles
    }

    fn detect(&mut self, image: &SourceImage) -> Result<Vec<FaceObservation>> {
        if image.width() == 13 {
            return Err(anyhow!("cannot read image {}", image.short_id()));
        }
        Ok(vec![FaceObservation::face(
            NormalizedRect::new(0.25, 0.25, 0.5, 0.5),
            0.8,
        )])
    }
}

#[test]
fn letterboxed_face_lands_on_the_photo() {
    let backend = StubBackend::with_faces([NormalizedRect::new(0.25, 0.25, 0.5, 0.5)]);
    let mut orchestrator =
        DetectionOrchestrator::new(shared(backend), ShapeLayer::new(), Size::new(100.0, 100.0))
            .unwrap();

    let generation = orchestrator.present(Some(photo(200, 100))).unwrap().unwrap();
    assert_eq!(orchestrator.fit_rect(), DisplayRect::new(0.0, 25.0, 100.0, 50.0));

    let report = orchestrator.wait_for(generation, TIMEOUT).unwrap().unwrap();
    assert_eq!(
        report.outcome,
        DetectionOutcome::Drawn(vec![DisplayRect::new(25.0, 37.5, 50.0, 25.0)])
    );
    assert_eq!(orchestrator.surface().shapes().len(), 1);
}

#[test]
fn zero_results_leave_overlay_empty_without_error() {
    let mut orchestrator =
        DetectionOrchestrator::new(shared(StubBackend::new()), ShapeLayer::new(), Size::new(50.0, 80.0))
            .unwrap();
    let generation = orchestrator.present(Some(photo(30, 30))).unwrap().unwrap();
    let report = orchestrator.wait_for(generation, TIMEOUT).unwrap().unwrap();

    assert_eq!(report.outcome, DetectionOutcome::NoFaces);
    assert!(orchestrator.surface().is_empty());
    assert!(orchestrator.face_rects().is_empty());
}

#[test]
fn failure_after_success_clears_previous_boxes() {
    let mut orchestrator =
        DetectionOrchestrator::new(shared(PickyDetector), ShapeLayer::new(), Size::new(100.0, 100.0))
            .unwrap();

    let first = orchestrator.present(Some(photo(20, 20))).unwrap().unwrap();
    orchestrator.wait_for(first, TIMEOUT).unwrap().unwrap();
    assert_eq!(orchestrator.surface().shapes().len(), 1);

    let second = orchestrator.present(Some(photo(13, 20))).unwrap().unwrap();
    assert!(orchestrator.surface().is_empty());
    let report = orchestrator.wait_for(second, TIMEOUT).unwrap().unwrap();
    assert!(matches!(report.outcome, DetectionOutcome::Failed(_)));
    assert!(orchestrator.surface().is_empty());
    assert!(!orchestrator.is_pending());
}

#[test]
fn results_for_replaced_photos_are_dropped() {
    let backend = StubBackend::with_faces([NormalizedRect::unit()])
        .with_latency(Duration::from_millis(100));
    let mut orchestrator =
        DetectionOrchestrator::new(shared(backend), ShapeLayer::new(), Size::new(100.0, 100.0))
            .unwrap();

    let first = orchestrator.present(Some(photo(100, 50))).unwrap().unwrap();
    let second = orchestrator.present(Some(photo(50, 100))).unwrap().unwrap();
    assert!(second > first);
    assert_eq!(orchestrator.current_generation(), Some(second));

    let stale = orchestrator.wait(TIMEOUT).unwrap().unwrap();
    assert_eq!(stale.generation, first);
    assert_eq!(stale.outcome, DetectionOutcome::Stale);
    assert!(orchestrator.surface().is_empty());

    let fresh = orchestrator.wait(TIMEOUT).unwrap().unwrap();
    assert_eq!(fresh.generation, second);
    assert_eq!(
        fresh.outcome,
        DetectionOutcome::Drawn(vec![DisplayRect::new(25.0, 0.0, 50.0, 100.0)])
    );
    assert_eq!(orchestrator.surface().generation(), Some(second));
}

#[test]
fn missing_photo_keeps_current_state() {
    let backend = StubBackend::with_faces([NormalizedRect::unit()]);
    let mut orchestrator =
        DetectionOrchestrator::new(shared(backend), ShapeLayer::new(), Size::new(10.0, 10.0))
            .unwrap();
    let generation = orchestrator.present(Some(photo(10, 10))).unwrap().unwrap();
    orchestrator.wait_for(generation, TIMEOUT).unwrap().unwrap();

    assert_eq!(orchestrator.present(None).unwrap(), None);
    assert_eq!(orchestrator.current_generation(), Some(generation));
    assert_eq!(orchestrator.surface().shapes().len(), 1);
    assert!(orchestrator.poll().is_empty());
}

#[test]
fn zero_area_display_collapses_boxes() {
    let backend = StubBackend::with_faces([NormalizedRect::new(0.1, 0.1, 0.2, 0.2)]);
    let mut orchestrator =
        DetectionOrchestrator::new(shared(backend), ShapeLayer::new(), Size::new(0.0, 0.0))
            .unwrap();
    let generation = orchestrator.present(Some(photo(40, 30))).unwrap().unwrap();
    let report = orchestrator.wait_for(generation, TIMEOUT).unwrap().unwrap();
    assert_eq!(
        report.outcome,
        DetectionOutcome::Drawn(vec![DisplayRect::new(0.0, 0.0, 0.0, 0.0)])
    );
}

#[test]
fn picked_file_is_rendered_with_outline() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("portrait.png");
    RgbImage::from_pixel(40, 80, Rgb([0, 0, 200]))
        .save(&path)
        .expect("write png");

    let mut source = FileSource::new(FileConfig {
        paths: vec![path, dir.path().join("missing.png")],
    })
    .unwrap();

    let backend = StubBackend::with_faces([NormalizedRect::new(0.25, 0.25, 0.5, 0.5)]);
    let display = Size::new(100.0, 100.0);
    let surface = CanvasSurface::new(display, Color::BLACK);
    let mut orchestrator = DetectionOrchestrator::new(shared(backend), surface, display).unwrap();

    let generation = orchestrator
        .present(source.next_image().unwrap())
        .unwrap()
        .unwrap();
    let report = orchestrator.wait_for(generation, TIMEOUT).unwrap().unwrap();
    let expected = DisplayRect::new(37.5, 25.0, 25.0, 50.0);
    assert_eq!(report.outcome, DetectionOutcome::Drawn(vec![expected]));

    let canvas = orchestrator.surface().image();
    assert_eq!(canvas.get_pixel(10, 50).0, [0, 0, 0, 255]);
    assert_eq!(canvas.get_pixel(50, 50).0, [0, 0, 200, 255]);
    assert_eq!(canvas.get_pixel(37, 50).0, [255, 255, 0, 255]);

    let out = dir.path().join("portrait_faces.png");
    orchestrator.surface().save(&out).unwrap();
    assert!(out.exists());

    assert!(orchestrator.present(source.next_image().unwrap()).unwrap().is_none());
    assert_eq!(source.stats().missing, 1);
}

#[test]
fn dropping_orchestrator_returns_surface() {
    let orchestrator =
        DetectionOrchestrator::new(shared(StubBackend::new()), ShapeLayer::new(), Size::new(1.0, 1.0))
            .unwrap();
    let surface = orchestrator.into_surface();
    assert!(surface.is_empty());
}
