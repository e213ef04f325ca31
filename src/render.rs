//! Raster overlay surface.
//!
//! `CanvasSurface` draws the photo letterboxed into a display-sized RGBA
//! canvas and strokes overlay rectangles on top, for writing the result to a
//! PNG. Shapes are clipped to the canvas; nothing else is.

use std::path::Path;

use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};

use crate::frame::SourceImage;
use crate::geometry::{DisplayRect, Size};
use crate::overlay::{Color, OverlaySurface, Shape};

/// Display-sized canvas holding the letterboxed photo and its overlay.
pub struct CanvasSurface {
    base: RgbaImage,
    canvas: RgbaImage,
    background: Color,
    shapes: usize,
}

impl CanvasSurface {
    /// An empty canvas of `display` size (rounded to whole pixels).
    pub fn new(display: Size, background: Color) -> Self {
        let width = to_pixels(display.width);
        let height = to_pixels(display.height);
        let base = RgbaImage::from_pixel(width, height, Rgba(background.to_rgba()));
        Self {
            canvas: base.clone(),
            base,
            background,
            shapes: 0,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.canvas
    }

    /// Number of shapes drawn since the last clear.
    pub fn shape_count(&self) -> usize {
        self.shapes
    }

    /// Write the canvas; the format follows the file extension.
    ///
    /// JPEG has no alpha channel, so the canvas is flattened to RGB first.
    pub fn save(&self, path: &Path) -> Result<()> {
        let written = if is_jpeg_path(path) {
            DynamicImage::ImageRgba8(self.canvas.clone())
                .to_rgb8()
                .save(path)
        } else {
            self.canvas.save(path)
        };
        written.with_context(|| format!("failed to write overlay image {}", path.display()))
    }

    fn stroke_rect(&mut self, shape: &Shape) {
        let rect = shape.outline;
        let half = shape.stroke.width.max(0.0) / 2.0;
        if half == 0.0 || !rect.width.is_finite() || !rect.height.is_finite() {
            return;
        }
        let outer = DisplayRect::new(
            rect.x - half,
            rect.y - half,
            rect.width + 2.0 * half,
            rect.height + 2.0 * half,
        );
        let inner = DisplayRect::new(
            rect.x + half,
            rect.y + half,
            rect.width - 2.0 * half,
            rect.height - 2.0 * half,
        );

        let (canvas_w, canvas_h) = self.canvas.dimensions();
        let x_start = outer.x.floor().max(0.0) as u32;
        let y_start = outer.y.floor().max(0.0) as u32;
        let x_end = (outer.max_x().ceil().max(0.0) as u32).min(canvas_w);
        let y_end = (outer.max_y().ceil().max(0.0) as u32).min(canvas_h);
        let color = shape.stroke.color;

        for y in y_start..y_end {
            let cy = y as f64 + 0.5;
            for x in x_start..x_end {
                let cx = x as f64 + 0.5;
                if !covers(&outer, cx, cy) || covers(&inner, cx, cy) {
                    continue;
                }
                blend(self.canvas.get_pixel_mut(x, y), color);
            }
        }
    }
}

impl OverlaySurface for CanvasSurface {
    fn clear(&mut self) {
        self.canvas.clone_from(&self.base);
        self.shapes = 0;
    }

    fn add_shape(&mut self, shape: Shape) {
        self.stroke_rect(&shape);
        self.shapes += 1;
    }

    fn present_image(&mut self, image: &SourceImage, fit: DisplayRect) {
        let (width, height) = self.base.dimensions();
        self.base = RgbaImage::from_pixel(width, height, Rgba(self.background.to_rgba()));

        let fit_w = to_pixels(fit.width);
        let fit_h = to_pixels(fit.height);
        if fit_w > 0 && fit_h > 0 && image.width() > 0 && image.height() > 0 {
            let scaled = imageops::resize(image.rgb(), fit_w, fit_h, FilterType::Triangle);
            let scaled = DynamicImage::ImageRgb8(scaled).to_rgba8();
            imageops::overlay(
                &mut self.base,
                &scaled,
                fit.x.round() as i64,
                fit.y.round() as i64,
            );
        }
        self.clear();
    }
}

fn covers(rect: &DisplayRect, x: f64, y: f64) -> bool {
    rect.width > 0.0
        && rect.height > 0.0
        && x >= rect.x
        && x < rect.max_x()
        && y >= rect.y
        && y < rect.max_y()
}

fn blend(pixel: &mut Rgba<u8>, color: Color) {
    let alpha = color.a as u16;
    let keep = 255 - alpha;
    let src = color.to_rgba();
    for channel in 0..3 {
        let mixed = (src[channel] as u16 * alpha + pixel.0[channel] as u16 * keep + 127) / 255;
        pixel.0[channel] = mixed as u8;
    }
    pixel.0[3] = pixel.0[3].max(color.a);
}

fn is_jpeg_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
}

fn to_pixels(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round().min(u32::MAX as f64) as u32
    } else {
        0
    }
}
