//! Decoded photos handed to detectors and overlay surfaces.
//!
//! - `SourceImage`: owned RGB pixels plus a content fingerprint.
//! - Detectors read pixels through `rgb()` / `luma()`; nothing mutates an image
//!   after decode, so it can be shared between the interactive sequence and the
//!   detection worker behind an `Arc`.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::{GrayImage, RgbImage};
use sha2::{Digest, Sha256};

use crate::geometry::Size;

/// Upper bound on either side of a decoded photo.
pub const MAX_IMAGE_SIDE: u32 = 16_384;

/// A decoded photo.
pub struct SourceImage {
    pixels: RgbImage,
    fingerprint: [u8; 32],
}

impl SourceImage {
    /// Wrap already-decoded RGB pixels.
    pub fn from_rgb(pixels: RgbImage) -> Result<Self> {
        let (width, height) = pixels.dimensions();
        if width > MAX_IMAGE_SIDE || height > MAX_IMAGE_SIDE {
            return Err(anyhow!(
                "image {}x{} exceeds the {}px side limit",
                width,
                height,
                MAX_IMAGE_SIDE
            ));
        }
        let fingerprint = compute_fingerprint(pixels.as_raw(), width, height);
        Ok(Self {
            pixels,
            fingerprint,
        })
    }

    /// Decode an in-memory JPEG or PNG.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(bytes).context("failed to decode image")?;
        Self::from_rgb(decoded.to_rgb8())
    }

    /// Read and decode an image file.
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read image {}", path.display()))?;
        Self::decode(&bytes).with_context(|| format!("invalid image {}", path.display()))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn size(&self) -> Size {
        Size::from(self.pixels.dimensions())
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.pixels
    }

    /// Single-channel copy for detectors that work on intensity.
    pub fn luma(&self) -> GrayImage {
        image::imageops::grayscale(&self.pixels)
    }

    pub fn fingerprint(&self) -> [u8; 32] {
        self.fingerprint
    }

    /// First 6 fingerprint bytes as hex. Used to tag log lines.
    pub fn short_id(&self) -> String {
        hex::encode(&self.fingerprint[..6])
    }
}

impl std::fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("id", &self.short_id())
            .finish()
    }
}

fn compute_fingerprint(pixels: &[u8], width: u32, height: u32) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(width.to_le_bytes());
    hasher.update(height.to_le_bytes());
    hasher.update(pixels);
    hasher.finalize().into()
}
