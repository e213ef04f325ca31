#![cfg(feature = "backend-rustface")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};

use crate::detect::backend::{DetectionCapability, FaceDetector};
use crate::detect::result::FaceObservation;
use crate::frame::SourceImage;
use crate::geometry::NormalizedRect;

/// Smallest face size the SeetaFace engine accepts.
pub const MIN_FACE_SIZE: u32 = 20;

/// SeetaFace frontal face detector backed by the `rustface` crate.
///
/// Loads a local model file once; a fresh detector is built from the model for
/// every call because `rustface` detectors are not `Send`.
pub struct RustfaceBackend {
    model: rustface::Model,
    min_face_size: u32,
    score_threshold: f64,
}

impl RustfaceBackend {
    /// Load a SeetaFace model (e.g. `seeta_fd_frontal_v1.0.bin`) from disk.
    pub fn from_model_path<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();
        let file = std::fs::File::open(model_path)
            .with_context(|| format!("failed to open face model {}", model_path.display()))?;
        let model = rustface::read_model(std::io::BufReader::new(file)).map_err(|e| {
            anyhow!(
                "failed to load face model from {}: {}",
                model_path.display(),
                e
            )
        })?;
        Ok(Self {
            model,
            min_face_size: MIN_FACE_SIZE,
            score_threshold: 2.0,
        })
    }

    /// Override the smallest face size in pixels (never below `MIN_FACE_SIZE`).
    pub fn with_min_face_size(mut self, min_face_size: u32) -> Self {
        self.min_face_size = min_face_size.max(MIN_FACE_SIZE);
        self
    }

    /// Override the classifier score threshold.
    pub fn with_score_threshold(mut self, threshold: f64) -> Self {
        self.score_threshold = threshold;
        self
    }
}

impl FaceDetector for RustfaceBackend {
    fn name(&self) -> &'static str {
        "rustface"
    }

    fn supports(&self, capability: DetectionCapability) -> bool {
        matches!(capability, DetectionCapability::FaceRectangles)
    }

    fn detect(&mut self, image: &SourceImage) -> Result<Vec<FaceObservation>> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(anyhow!("cannot run face detection on an empty image"));
        }

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.min_face_size);
        detector.set_score_thresh(self.score_threshold);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let gray = image.luma();
        let faces = detector.detect(&rustface::ImageData::new(gray.as_raw(), width, height));

        let size = image.size();
        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                let rect = NormalizedRect::from_pixel_rect(
                    bbox.x() as f64,
                    bbox.y() as f64,
                    bbox.width() as f64,
                    bbox.height() as f64,
                    size,
                );
                FaceObservation::face(rect, face.score() as f32)
            })
            .collect())
    }
}
