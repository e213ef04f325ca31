use crate::geometry::NormalizedRect;

/// What a detector believes an observation is.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ObservationKind {
    #[default]
    Face,
    /// Anything that is not a face. Never drawn.
    Other,
}

/// One detector observation.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceObservation {
    /// Bounding box in detector space (bottom-left origin, y up).
    pub bounding_box: NormalizedRect,
    /// Backend-specific score. Higher is more certain.
    pub confidence: f32,
    pub kind: ObservationKind,
}

impl FaceObservation {
    pub fn face(bounding_box: NormalizedRect, confidence: f32) -> Self {
        Self {
            bounding_box,
            confidence,
            kind: ObservationKind::Face,
        }
    }

    pub fn is_face(&self) -> bool {
        self.kind == ObservationKind::Face
    }
}
