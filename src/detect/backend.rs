use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::detect::result::FaceObservation;
use crate::frame::SourceImage;

/// Detection capabilities a backend may offer.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectionCapability {
    /// Bounding boxes around faces.
    FaceRectangles,
    /// Facial landmark points inside each face box.
    FaceLandmarks,
}

/// Face detector backend.
///
/// Backends are black boxes to the rest of the crate: they receive a decoded
/// photo and return observations in detector space (normalized, bottom-left
/// origin, y up). `detect` runs on the detection worker thread, never on the
/// sequence that owns the overlay, so it may take as long as it needs.
pub trait FaceDetector: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Returns true when the backend supports a capability.
    fn supports(&self, capability: DetectionCapability) -> bool;

    /// Run detection on a photo.
    ///
    /// An empty vector means "no faces". Errors are reported to the caller,
    /// which logs them and draws nothing.
    fn detect(&mut self, image: &SourceImage) -> Result<Vec<FaceObservation>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A backend shared between the registry and the detection worker.
///
/// Wrapped in `Mutex` because `FaceDetector::detect` takes `&mut self`.
pub type SharedDetector = Arc<Mutex<dyn FaceDetector>>;
