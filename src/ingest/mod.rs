//! Photo sources.
//!
//! A source produces one photo per user selection event:
//! - Local files, picked in order from a queue ("library")
//! - Synthetic generated frames (`stub://` camera, demos and tests)
//!
//! A pick that yields no usable image data is `Ok(None)`, not an error. The
//! orchestrator ignores it.

pub mod file;
pub mod synthetic;

pub use file::{FileConfig, FileSource, FileStats};
pub use synthetic::{SyntheticConfig, SyntheticSource};

use anyhow::Result;

use crate::frame::SourceImage;

pub trait ImageSource {
    /// Produce the photo for the next selection event.
    fn next_image(&mut self) -> Result<Option<SourceImage>>;

    /// Whether another selection can still produce a photo.
    fn has_next(&self) -> bool {
        true
    }
}
