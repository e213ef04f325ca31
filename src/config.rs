use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::geometry::{ContentMode, Size};
use crate::overlay::{Color, StrokeStyle};

const DEFAULT_DISPLAY_WIDTH: f64 = 375.0;
const DEFAULT_DISPLAY_HEIGHT: f64 = 667.0;
const DEFAULT_STROKE_COLOR: &str = "#ffff00";
const DEFAULT_STROKE_WIDTH: f64 = 2.0;
const DEFAULT_BACKEND: &str = "stub";
const DEFAULT_MIN_FACE_SIZE: u32 = 20;
const DEFAULT_SCORE_THRESHOLD: f64 = 2.0;
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Deserialize, Default)]
struct OverlayConfigFile {
    display: Option<DisplayConfigFile>,
    content_mode: Option<ContentMode>,
    stroke: Option<StrokeConfigFile>,
    detector: Option<DetectorConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct DisplayConfigFile {
    width: Option<f64>,
    height: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct StrokeConfigFile {
    color: Option<String>,
    width: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    backend: Option<String>,
    model_path: Option<PathBuf>,
    min_face_size: Option<u32>,
    score_threshold: Option<f64>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Size of the display surface the photo is drawn on.
    pub display: Size,
    pub content_mode: ContentMode,
    pub stroke: StrokeStyle,
    pub detector: DetectorSettings,
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub backend: String,
    pub model_path: Option<PathBuf>,
    pub min_face_size: u32,
    pub score_threshold: f64,
    /// How long tools wait for one detection to finish.
    pub timeout: Duration,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            display: Size::new(DEFAULT_DISPLAY_WIDTH, DEFAULT_DISPLAY_HEIGHT),
            content_mode: ContentMode::AspectFit,
            stroke: StrokeStyle::default(),
            detector: DetectorSettings {
                backend: DEFAULT_BACKEND.to_string(),
                model_path: None,
                min_face_size: DEFAULT_MIN_FACE_SIZE,
                score_threshold: DEFAULT_SCORE_THRESHOLD,
                timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            },
        }
    }
}

impl OverlayConfig {
    /// Load from the file named by `FACE_OVERLAY_CONFIG` (if set), then apply env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("FACE_OVERLAY_CONFIG").ok();
        Self::load_with(config_path.as_deref().map(Path::new))
    }

    /// Load from an explicit file (or defaults when `None`), then apply env overrides.
    pub fn load_with(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: OverlayConfigFile) -> Result<Self> {
        let defaults = Self::default();
        let display = Size::new(
            file.display
                .as_ref()
                .and_then(|display| display.width)
                .unwrap_or(defaults.display.width),
            file.display
                .as_ref()
                .and_then(|display| display.height)
                .unwrap_or(defaults.display.height),
        );
        let stroke = StrokeStyle {
            color: Color::from_hex(
                file.stroke
                    .as_ref()
                    .and_then(|stroke| stroke.color.as_deref())
                    .unwrap_or(DEFAULT_STROKE_COLOR),
            )?,
            width: file
                .stroke
                .as_ref()
                .and_then(|stroke| stroke.width)
                .unwrap_or(DEFAULT_STROKE_WIDTH),
        };
        let detector_file = file.detector.unwrap_or_default();
        let detector = DetectorSettings {
            backend: detector_file
                .backend
                .unwrap_or_else(|| DEFAULT_BACKEND.to_string()),
            model_path: detector_file.model_path,
            min_face_size: detector_file
                .min_face_size
                .unwrap_or(DEFAULT_MIN_FACE_SIZE),
            score_threshold: detector_file
                .score_threshold
                .unwrap_or(DEFAULT_SCORE_THRESHOLD),
            timeout: Duration::from_millis(detector_file.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)),
        };
        Ok(Self {
            display,
            content_mode: file.content_mode.unwrap_or_default(),
            stroke,
            detector,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(display) = std::env::var("FACE_OVERLAY_DISPLAY") {
            if !display.trim().is_empty() {
                self.display = Size::parse(&display).ok_or_else(|| {
                    anyhow!("FACE_OVERLAY_DISPLAY must look like WIDTHxHEIGHT, got '{}'", display)
                })?;
            }
        }
        if let Ok(mode) = std::env::var("FACE_OVERLAY_CONTENT_MODE") {
            if !mode.trim().is_empty() {
                self.content_mode = ContentMode::parse(&mode).ok_or_else(|| {
                    anyhow!("FACE_OVERLAY_CONTENT_MODE '{}' is not a content mode", mode)
                })?;
            }
        }
        if let Ok(color) = std::env::var("FACE_OVERLAY_STROKE_COLOR") {
            if !color.trim().is_empty() {
                self.stroke.color = Color::from_hex(&color)?;
            }
        }
        if let Ok(width) = std::env::var("FACE_OVERLAY_STROKE_WIDTH") {
            self.stroke.width = width
                .trim()
                .parse()
                .map_err(|_| anyhow!("FACE_OVERLAY_STROKE_WIDTH must be a number"))?;
        }
        if let Ok(backend) = std::env::var("FACE_OVERLAY_BACKEND") {
            if !backend.trim().is_empty() {
                self.detector.backend = backend.trim().to_string();
            }
        }
        if let Ok(path) = std::env::var("FACE_OVERLAY_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.detector.model_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(timeout) = std::env::var("FACE_OVERLAY_TIMEOUT_MS") {
            let millis: u64 = timeout.trim().parse().map_err(|_| {
                anyhow!("FACE_OVERLAY_TIMEOUT_MS must be an integer number of milliseconds")
            })?;
            self.detector.timeout = Duration::from_millis(millis);
        }
        Ok(())
    }

    /// Check the settings; also normalises the backend name.
    pub fn validate(&mut self) -> Result<()> {
        for (name, side) in [
            ("width", self.display.width),
            ("height", self.display.height),
        ] {
            if !side.is_finite() || side < 0.0 {
                return Err(anyhow!("display {} must be a non-negative number", name));
            }
        }
        if !self.stroke.width.is_finite() || self.stroke.width <= 0.0 {
            return Err(anyhow!("stroke width must be greater than zero"));
        }

        self.detector.backend = self.detector.backend.trim().to_lowercase();
        if self.detector.backend.is_empty() {
            return Err(anyhow!("detector backend must not be empty"));
        }
        if self.detector.backend == "rustface" && self.detector.model_path.is_none() {
            return Err(anyhow!("rustface backend requires detector.model_path"));
        }
        if self.detector.min_face_size < DEFAULT_MIN_FACE_SIZE {
            return Err(anyhow!(
                "min_face_size must be at least {}",
                DEFAULT_MIN_FACE_SIZE
            ));
        }
        if self.detector.timeout.is_zero() {
            return Err(anyhow!("detector timeout must be greater than zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<OverlayConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
