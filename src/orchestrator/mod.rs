//! Detection orchestration.
//!
//! `DetectionOrchestrator` lives on the interactive sequence and owns the
//! overlay surface. Each presented photo gets a fresh `Generation`; detection
//! runs on the background worker and its completion is applied only when the
//! owner calls `poll` or `wait`, so the surface is never touched off-sequence.
//!
//! Failure policy: a missing photo is ignored, a detector error is logged and
//! leaves the overlay empty, and results for superseded photos are dropped.

mod worker;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::config::OverlayConfig;
use crate::detect::SharedDetector;
use crate::frame::SourceImage;
use crate::geometry::{content_rect, denormalize, ContentMode, DisplayRect, NormalizedRect, Size};
use crate::overlay::{Generation, OverlayBatch, OverlaySurface, Shape, StrokeStyle};

use worker::{Completion, DetectionWorker, Job};

/// What applying one completion did to the overlay.
#[derive(Clone, Debug, PartialEq)]
pub enum DetectionOutcome {
    /// Boxes were committed, in display coordinates.
    Drawn(Vec<DisplayRect>),
    /// The detector found nothing; the overlay stays empty.
    NoFaces,
    /// The detector failed; the message was logged and nothing was drawn.
    Failed(String),
    /// The photo was replaced before detection finished; the result was dropped.
    Stale,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DetectionReport {
    pub generation: Generation,
    pub outcome: DetectionOutcome,
}

struct Presented {
    generation: Generation,
    image: Arc<SourceImage>,
    /// `None` until detection for this photo completes.
    faces: Option<Vec<NormalizedRect>>,
}

/// Runs face detection off the interactive sequence and keeps the overlay in sync.
pub struct DetectionOrchestrator<S: OverlaySurface> {
    surface: S,
    display: Size,
    content_mode: ContentMode,
    stroke: StrokeStyle,
    worker: DetectionWorker,
    last_generation: Generation,
    current: Option<Presented>,
}

impl<S: OverlaySurface> DetectionOrchestrator<S> {
    /// Start the detection worker for `detector` and take ownership of `surface`.
    pub fn new(detector: SharedDetector, surface: S, display: Size) -> Result<Self> {
        Ok(Self {
            surface,
            display,
            content_mode: ContentMode::default(),
            stroke: StrokeStyle::default(),
            worker: DetectionWorker::spawn(detector)?,
            last_generation: Generation::default(),
            current: None,
        })
    }

    /// Like `new`, with display size, content mode and stroke taken from `cfg`.
    pub fn from_config(cfg: &OverlayConfig, detector: SharedDetector, surface: S) -> Result<Self> {
        Ok(Self::new(detector, surface, cfg.display)?
            .with_content_mode(cfg.content_mode)
            .with_stroke(cfg.stroke))
    }

    pub fn with_content_mode(mut self, content_mode: ContentMode) -> Self {
        self.content_mode = content_mode;
        self
    }

    pub fn with_stroke(mut self, stroke: StrokeStyle) -> Self {
        self.stroke = stroke;
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Stop the worker and hand back the surface.
    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn display(&self) -> Size {
        self.display
    }

    /// Generation of the photo currently shown.
    pub fn current_generation(&self) -> Option<Generation> {
        self.current.as_ref().map(|current| current.generation)
    }

    /// True while the shown photo's detection has not completed.
    pub fn is_pending(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|current| current.faces.is_none())
    }

    /// Rect the shown photo occupies on the display surface.
    pub fn fit_rect(&self) -> DisplayRect {
        content_rect(
            self.current.as_ref().map(|current| current.image.size()),
            self.display,
            self.content_mode,
        )
    }

    /// Display-space boxes for the shown photo's faces.
    pub fn face_rects(&self) -> Vec<DisplayRect> {
        let fit = self.fit_rect();
        self.current
            .as_ref()
            .and_then(|current| current.faces.as_ref())
            .map(|faces| faces.iter().map(|face| denormalize(*face, fit)).collect())
            .unwrap_or_default()
    }

    /// Show a newly picked photo and start detecting faces on it.
    ///
    /// A missing photo is ignored. Otherwise the previous overlay is cleared
    /// immediately and detection is queued; this call never waits for it.
    pub fn present(&mut self, image: Option<SourceImage>) -> Result<Option<Generation>> {
        let Some(image) = image else {
            log::debug!("no image data picked; nothing to detect");
            return Ok(None);
        };
        let image = Arc::new(image);
        let generation = self.last_generation.next();
        self.last_generation = generation;

        let fit = content_rect(Some(image.size()), self.display, self.content_mode);
        self.surface.present_image(&image, fit);
        self.surface.commit(OverlayBatch::new(generation, Vec::new()));
        self.current = Some(Presented {
            generation,
            image: Arc::clone(&image),
            faces: None,
        });

        log::info!(
            "detecting faces in image {} ({}x{}) as {}",
            image.short_id(),
            image.width(),
            image.height(),
            generation
        );
        self.worker.submit(Job { generation, image })?;
        Ok(Some(generation))
    }

    /// Apply every completion that has already arrived. Never blocks.
    pub fn poll(&mut self) -> Vec<DetectionReport> {
        let mut reports = Vec::new();
        while let Some(completion) = self.worker.try_next() {
            reports.push(self.apply(completion));
        }
        reports
    }

    /// Wait up to `timeout` for one completion and apply it.
    pub fn wait(&mut self, timeout: Duration) -> Result<Option<DetectionReport>> {
        Ok(self
            .worker
            .next_timeout(timeout)?
            .map(|completion| self.apply(completion)))
    }

    /// Wait until `generation` completes, applying any earlier completions on the way.
    pub fn wait_for(
        &mut self,
        generation: Generation,
        timeout: Duration,
    ) -> Result<Option<DetectionReport>> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            match self.wait(remaining)? {
                Some(report) if report.generation == generation => return Ok(Some(report)),
                Some(_) => continue,
                None => return Ok(None),
            }
        }
    }

    /// The display surface changed size: lay the photo and its boxes out again.
    pub fn resize(&mut self, display: Size) {
        self.display = display;
        let Some(current) = &self.current else {
            return;
        };
        let fit = content_rect(Some(current.image.size()), display, self.content_mode);
        self.surface.present_image(&current.image, fit);
        let shapes = current
            .faces
            .as_deref()
            .map(|faces| layout_shapes(faces, fit, self.stroke))
            .unwrap_or_default();
        self.surface.commit(OverlayBatch::new(current.generation, shapes));
    }

    fn apply(&mut self, completion: Completion) -> DetectionReport {
        let generation = completion.generation;
        let Some(current) = self
            .current
            .as_mut()
            .filter(|current| current.generation == generation)
        else {
            log::debug!("dropping detection result for superseded image {}", generation);
            return DetectionReport {
                generation,
                outcome: DetectionOutcome::Stale,
            };
        };

        let observations = match completion.outcome {
            Ok(observations) => observations,
            Err(err) => {
                log::warn!(
                    "face detection failed for image {}: {:#}",
                    current.image.short_id(),
                    err
                );
                current.faces = Some(Vec::new());
                return DetectionReport {
                    generation,
                    outcome: DetectionOutcome::Failed(format!("{:#}", err)),
                };
            }
        };

        let total = observations.len();
        let faces: Vec<NormalizedRect> = observations
            .into_iter()
            .filter(|observation| observation.is_face())
            .map(|observation| observation.bounding_box)
            .collect();
        if faces.len() < total {
            log::debug!(
                "ignored {} non-face observations for {}",
                total - faces.len(),
                generation
            );
        }
        for face in &faces {
            log::info!("Found face at {}", face);
            if !face.is_within_unit() {
                log::debug!("face box {} lies outside the photo; mapped unclamped", face);
            }
        }

        let fit = content_rect(Some(current.image.size()), self.display, self.content_mode);
        let shapes = layout_shapes(&faces, fit, self.stroke);
        current.faces = Some(faces);

        if shapes.is_empty() {
            log::info!("no faces in image {}", current.image.short_id());
            return DetectionReport {
                generation,
                outcome: DetectionOutcome::NoFaces,
            };
        }

        let rects = shapes.iter().map(|shape| shape.outline).collect();
        self.surface.commit(OverlayBatch::new(generation, shapes));
        DetectionReport {
            generation,
            outcome: DetectionOutcome::Drawn(rects),
        }
    }
}

fn layout_shapes(faces: &[NormalizedRect], fit: DisplayRect, stroke: StrokeStyle) -> Vec<Shape> {
    faces
        .iter()
        .map(|face| Shape::rect(denormalize(*face, fit), stroke))
        .collect()
}
