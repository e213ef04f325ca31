//! Synthetic camera (`stub://`).
//!
//! Produces deterministic generated frames so demos and tests can exercise the
//! whole pipeline without a real camera or image files.

use anyhow::{anyhow, Result};
use image::{Rgb, RgbImage};

use super::ImageSource;
use crate::frame::{SourceImage, MAX_IMAGE_SIDE};

#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    /// Source name, must use the `stub://` scheme.
    pub uri: String,
    pub width: u32,
    pub height: u32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            uri: "stub://camera".to_string(),
            width: 640,
            height: 480,
        }
    }
}

pub struct SyntheticSource {
    config: SyntheticConfig,
    frame_count: u64,
    scene_state: u8,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Result<Self> {
        if !config.uri.starts_with("stub://") {
            return Err(anyhow!(
                "synthetic source requires a stub:// uri, got '{}'",
                config.uri
            ));
        }
        if config.width == 0 || config.height == 0 {
            return Err(anyhow!("synthetic frame size must be non-zero"));
        }
        if config.width > MAX_IMAGE_SIDE || config.height > MAX_IMAGE_SIDE {
            return Err(anyhow!(
                "synthetic frame size must be at most {} per side",
                MAX_IMAGE_SIDE
            ));
        }
        log::info!(
            "SyntheticSource: {} producing {}x{} frames",
            config.uri,
            config.width,
            config.height
        );
        Ok(Self {
            config,
            frame_count: 0,
            scene_state: 0,
        })
    }

    pub fn frames_captured(&self) -> u64 {
        self.frame_count
    }

    fn generate_pixels(&mut self) -> RgbImage {
        if self.frame_count % 5 == 0 {
            self.scene_state = self.scene_state.wrapping_add(37);
        }
        let shift = self.frame_count.wrapping_add(self.scene_state as u64);
        RgbImage::from_fn(self.config.width, self.config.height, |x, y| {
            let base = x as u64 + y as u64 + shift;
            Rgb([
                (base % 256) as u8,
                ((base / 2) % 256) as u8,
                (self.scene_state as u64 % 256) as u8,
            ])
        })
    }
}

impl ImageSource for SyntheticSource {
    fn next_image(&mut self) -> Result<Option<SourceImage>> {
        self.frame_count += 1;
        let pixels = self.generate_pixels();
        SourceImage::from_rgb(pixels).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_have_configured_size_and_differ() {
        let mut source = SyntheticSource::new(SyntheticConfig {
            width: 32,
            height: 16,
            ..SyntheticConfig::default()
        })
        .unwrap();
        let first = source.next_image().unwrap().unwrap();
        let second = source.next_image().unwrap().unwrap();
        assert_eq!((first.width(), first.height()), (32, 16));
        assert_ne!(first.fingerprint(), second.fingerprint());
        assert_eq!(source.frames_captured(), 2);
    }

    #[test]
    fn frames_are_deterministic() {
        let config = SyntheticConfig {
            width: 8,
            height: 8,
            ..SyntheticConfig::default()
        };
        let mut a = SyntheticSource::new(config.clone()).unwrap();
        let mut b = SyntheticSource::new(config).unwrap();
        assert_eq!(
            a.next_image().unwrap().unwrap().fingerprint(),
            b.next_image().unwrap().unwrap().fingerprint()
        );
    }

    #[test]
    fn rejects_non_stub_uri_and_empty_frames() {
        assert!(SyntheticSource::new(SyntheticConfig {
            uri: "rtsp://camera".to_string(),
            ..SyntheticConfig::default()
        })
        .is_err());
        assert!(SyntheticSource::new(SyntheticConfig {
            width: 0,
            ..SyntheticConfig::default()
        })
        .is_err());
    }
}
