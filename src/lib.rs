//! Face overlay
//!
//! Detects faces in a photo off the interactive sequence and outlines them on
//! a display surface where the photo is drawn letterboxed.
//!
//! # Coordinate spaces
//!
//! Detectors report boxes in a normalized space: `[0,1]` on both axes, origin
//! at the bottom-left, y growing upward. The display surface uses pixels with
//! the origin at the top-left and y growing downward. `geometry::denormalize`
//! maps one into the other through the rect the photo occupies after
//! aspect-fit (`geometry::aspect_fit`).
//!
//! # Module Structure
//!
//! - `geometry`: sizes, rects, fit calculation and the coordinate mapper
//! - `frame`: decoded source photos
//! - `ingest`: photo sources (local files, synthetic camera)
//! - `detect`: detector trait, backends and the backend registry
//! - `overlay`: shapes, generations and overlay surfaces
//! - `render`: raster surface for writing overlays to image files
//! - `orchestrator`: background detection and overlay updates
//! - `config`: layered configuration (file, defaults, environment)

pub mod config;
pub mod detect;
pub mod frame;
pub mod geometry;
pub mod ingest;
pub mod orchestrator;
pub mod overlay;
pub mod render;

pub use config::{DetectorSettings, OverlayConfig};
pub use detect::{BackendRegistry, FaceDetector, FaceObservation, SharedDetector, StubBackend};
pub use frame::SourceImage;
pub use geometry::{
    aspect_fit, content_rect, denormalize, ContentMode, DisplayRect, NormalizedRect, Size,
};
pub use ingest::{FileSource, ImageSource, SyntheticSource};
pub use orchestrator::{DetectionOrchestrator, DetectionOutcome, DetectionReport};
pub use overlay::{Color, Generation, OverlayBatch, OverlaySurface, Shape, ShapeLayer, StrokeStyle};
pub use render::CanvasSurface;
