//! Local file photo source.
//!
//! `FileSource` hands out photos from a queue of local paths, one per pick.
//! The file source MUST NOT fetch remote URLs: paths with a URL scheme are
//! rejected when the source is built. A file that cannot be read or decoded
//! is logged and treated as missing image data for that pick.

use std::collections::VecDeque;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

use super::ImageSource;
use crate::frame::SourceImage;

/// Configuration for a local file source.
#[derive(Clone, Debug, Default)]
pub struct FileConfig {
    /// Local file paths, picked in order.
    pub paths: Vec<PathBuf>,
}

/// Local file photo source.
pub struct FileSource {
    queue: VecDeque<PathBuf>,
    stats: FileStats,
}

/// Statistics for a file source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileStats {
    pub images_read: u64,
    pub missing: u64,
    pub remaining: usize,
}

impl FileSource {
    pub fn new(config: FileConfig) -> Result<Self> {
        for path in &config.paths {
            if !is_local_file_path(&path.to_string_lossy()) {
                return Err(anyhow!(
                    "file source only supports local paths (no URL schemes): {}",
                    path.display()
                ));
            }
        }
        let remaining = config.paths.len();
        Ok(Self {
            queue: config.paths.into(),
            stats: FileStats {
                remaining,
                ..FileStats::default()
            },
        })
    }

    pub fn stats(&self) -> FileStats {
        self.stats.clone()
    }
}

impl ImageSource for FileSource {
    fn next_image(&mut self) -> Result<Option<SourceImage>> {
        let Some(path) = self.queue.pop_front() else {
            return Ok(None);
        };
        self.stats.remaining = self.queue.len();
        match SourceImage::open(&path) {
            Ok(image) => {
                self.stats.images_read += 1;
                log::debug!(
                    "FileSource: read {} as image {}",
                    path.display(),
                    image.short_id()
                );
                Ok(Some(image))
            }
            Err(err) => {
                self.stats.missing += 1;
                log::warn!("FileSource: no usable image data in {}: {:#}", path.display(), err);
                Ok(None)
            }
        }
    }

    fn has_next(&self) -> bool {
        !self.queue.is_empty()
    }
}

fn is_local_file_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    !path.contains("://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_url_schemes() {
        let config = FileConfig {
            paths: vec![PathBuf::from("photo.jpg"), PathBuf::from("https://host/photo.jpg")],
        };
        assert!(FileSource::new(config).is_err());
        assert!(FileSource::new(FileConfig {
            paths: vec![PathBuf::from("")],
        })
        .is_err());
    }

    #[test]
    fn missing_file_is_missing_image_data() {
        let mut source = FileSource::new(FileConfig {
            paths: vec![PathBuf::from("/nonexistent/face-overlay/photo.png")],
        })
        .unwrap();
        assert!(source.has_next());
        assert!(source.next_image().unwrap().is_none());
        assert!(!source.has_next());
        assert!(source.next_image().unwrap().is_none());

        let stats = source.stats();
        assert_eq!(stats.missing, 1);
        assert_eq!(stats.images_read, 0);
        assert_eq!(stats.remaining, 0);
    }
}
