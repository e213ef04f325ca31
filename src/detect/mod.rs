mod backend;
mod backends;
mod registry;
mod result;

pub use backend::{DetectionCapability, FaceDetector, SharedDetector};
#[cfg(feature = "backend-rustface")]
pub use backends::RustfaceBackend;
pub use backends::StubBackend;
pub use registry::BackendRegistry;
pub use result::{FaceObservation, ObservationKind};
