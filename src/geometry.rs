//! Coordinate spaces and the transforms between them.
//!
//! Two conventions meet here:
//!
//! - **Detector space**: the unit square `[0,1]x[0,1]`, origin at the
//!   bottom-left, y increasing upward. Detectors report `NormalizedRect`s.
//! - **Display space**: surface pixels, origin at the top-left, y increasing
//!   downward. Overlays are drawn with `DisplayRect`s.
//!
//! The photo is not drawn over the whole display surface: it is scaled to fit
//! and centered, leaving letterbox margins on one axis. `aspect_fit` computes
//! where the photo lands and `denormalize` maps detector boxes into that area.

use serde::Deserialize;

/// Pixel size of an image or a display surface.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when both sides are finite and strictly positive.
    pub fn has_area(&self) -> bool {
        is_positive(self.width) && is_positive(self.height)
    }

    /// Parse a `WIDTHxHEIGHT` string such as `375x667`.
    pub fn parse(value: &str) -> Option<Self> {
        let (w, h) = value.trim().split_once(['x', 'X'])?;
        let width: f64 = w.trim().parse().ok()?;
        let height: f64 = h.trim().parse().ok()?;
        Some(Self::new(width, height))
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width as f64, height as f64)
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A box in detector space: `(x, y)` is the bottom-left corner and y grows upward.
///
/// Fields are expected in `[0,1]` but are never clamped.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NormalizedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole detector space.
    pub fn unit() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    pub fn min_x(&self) -> f64 {
        self.x
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn min_y(&self) -> f64 {
        self.y
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// True when the box lies inside the unit square.
    pub fn is_within_unit(&self) -> bool {
        self.min_x() >= 0.0
            && self.min_y() >= 0.0
            && self.width >= 0.0
            && self.height >= 0.0
            && self.max_x() <= 1.0
            && self.max_y() <= 1.0
    }

    /// Convert a top-left-origin pixel box inside `image` into detector space.
    ///
    /// Boxes that spill over the image edges stay out of range. A degenerate
    /// image yields an empty rect.
    pub fn from_pixel_rect(x: f64, y: f64, width: f64, height: f64, image: Size) -> Self {
        if !image.has_area() {
            return Self::default();
        }
        Self {
            x: x / image.width,
            y: 1.0 - (y + height) / image.height,
            width: width / image.width,
            height: height / image.height,
        }
    }
}

impl std::fmt::Display for NormalizedRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(x: {:.4}, y: {:.4}, w: {:.4}, h: {:.4})",
            self.x, self.y, self.width, self.height
        )
    }
}

/// A rect in display space: `(x, y)` is the top-left corner and y grows downward.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DisplayRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DisplayRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The full surface of the given size, anchored at the origin.
    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Containment with an absolute tolerance for float rounding.
    pub fn contains_rect(&self, other: &DisplayRect, epsilon: f64) -> bool {
        other.x >= self.x - epsilon
            && other.y >= self.y - epsilon
            && other.max_x() <= self.max_x() + epsilon
            && other.max_y() <= self.max_y() + epsilon
    }
}

impl std::fmt::Display for DisplayRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(x: {:.2}, y: {:.2}, w: {:.2}, h: {:.2})",
            self.x, self.y, self.width, self.height
        )
    }
}

/// How a photo is laid out on the display surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentMode {
    /// Largest centered rect with the photo's aspect ratio that fits the surface.
    #[default]
    AspectFit,
    /// Scale picked from the photo's orientation alone (landscape and square
    /// photos scale to the surface width, portrait photos to its height).
    /// Can overflow the surface on the other axis.
    OrientationFit,
    /// The photo is stretched over the whole surface.
    Stretch,
}

impl ContentMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "aspect_fit" | "aspect-fit" | "fit" => Some(Self::AspectFit),
            "orientation_fit" | "orientation-fit" => Some(Self::OrientationFit),
            "stretch" | "fill" => Some(Self::Stretch),
            _ => None,
        }
    }
}

/// Rect occupied by an `image`-sized photo drawn aspect-fit and centered on a
/// `display`-sized surface.
///
/// A degenerate image yields the full surface, even when that surface has no
/// area. Otherwise a zero-area display yields `(0,0,0,0)`. Landscape and
/// square photos take the width-driven scale, portrait photos the
/// height-driven one; if that scale would overflow the other axis the binding
/// axis wins, so the result never leaves the surface. A square photo on a
/// surface wider than it is tall therefore takes `dh/ih`, not `dw/iw`.
pub fn aspect_fit(image: Size, display: Size) -> DisplayRect {
    fit_with(image, display, true)
}

/// The photo rect for `mode`, or the full surface when no photo is shown.
pub fn content_rect(image: Option<Size>, display: Size, mode: ContentMode) -> DisplayRect {
    let Some(image) = image else {
        return DisplayRect::from_size(display);
    };
    match mode {
        ContentMode::AspectFit => aspect_fit(image, display),
        ContentMode::OrientationFit => fit_with(image, display, false),
        ContentMode::Stretch => DisplayRect::from_size(display),
    }
}

/// Map a detector-space box into display space, relative to the photo's `fit` rect.
///
/// `1 - max_y` flips the vertical axis: the top edge of the display box comes
/// from the top edge (max y) of the detector box.
pub fn denormalize(normalized: NormalizedRect, fit: DisplayRect) -> DisplayRect {
    DisplayRect {
        x: normalized.min_x() * fit.width + fit.x,
        y: (1.0 - normalized.max_y()) * fit.height + fit.y,
        width: normalized.width * fit.width,
        height: normalized.height * fit.height,
    }
}

fn fit_with(image: Size, display: Size, contain: bool) -> DisplayRect {
    if !image.has_area() {
        return DisplayRect::from_size(display);
    }
    if !display.has_area() {
        return DisplayRect::default();
    }

    let width_scale = display.width / image.width;
    let height_scale = display.height / image.height;
    let mut scale = if image.width >= image.height {
        width_scale
    } else {
        height_scale
    };
    if contain {
        scale = scale.min(width_scale).min(height_scale);
    }

    let fit_width = image.width * scale;
    let fit_height = image.height * scale;
    DisplayRect {
        x: (display.width - fit_width) / 2.0,
        y: (display.height - fit_height) / 2.0,
        width: fit_width,
        height: fit_height,
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
