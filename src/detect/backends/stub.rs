use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::detect::backend::{DetectionCapability, FaceDetector};
use crate::detect::result::FaceObservation;
use crate::frame::SourceImage;
use crate::geometry::NormalizedRect;

/// Scripted backend for demos and tests.
///
/// Returns the same observations for every photo, optionally after a delay,
/// or fails every call with a fixed message.
#[derive(Clone, Debug, Default)]
pub struct StubBackend {
    observations: Vec<FaceObservation>,
    failure: Option<String>,
    latency: Option<Duration>,
    calls: u64,
}

impl StubBackend {
    /// A backend that never finds a face.
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that reports one face per box.
    pub fn with_faces(boxes: impl IntoIterator<Item = NormalizedRect>) -> Self {
        Self {
            observations: boxes
                .into_iter()
                .map(|bounding_box| FaceObservation::face(bounding_box, 1.0))
                .collect(),
            ..Self::default()
        }
    }

    /// A backend that reports exactly these observations.
    pub fn with_observations(observations: Vec<FaceObservation>) -> Self {
        Self {
            observations,
            ..Self::default()
        }
    }

    /// A backend whose every call fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Sleep for `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of `detect` calls served.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl FaceDetector for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn supports(&self, capability: DetectionCapability) -> bool {
        matches!(capability, DetectionCapability::FaceRectangles)
    }

    fn detect(&mut self, image: &SourceImage) -> Result<Vec<FaceObservation>> {
        self.calls += 1;
        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }
        if let Some(message) = &self.failure {
            return Err(anyhow!("{} (image {})", message, image.short_id()));
        }
        Ok(self.observations.clone())
    }
}
