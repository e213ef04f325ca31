//! Overlay shapes and the surfaces that show them.
//!
//! A surface is owned by the interactive sequence. Detection results reach it
//! as one `OverlayBatch` per detection run, applied with a single `commit`,
//! so a viewer never observes a half-drawn set of boxes.

use anyhow::{anyhow, Result};

use crate::frame::SourceImage;
use crate::geometry::DisplayRect;

/// Identifier of one detection run. Later runs have larger ids.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// RGBA color, 8 bits per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (the leading `#` is optional).
    pub fn from_hex(value: &str) -> Result<Self> {
        let digits = value.trim().trim_start_matches('#');
        if !matches!(digits.len(), 6 | 8) || !digits.is_ascii() {
            return Err(anyhow!("color '{}' must be #rrggbb or #rrggbbaa", value));
        }
        let channel = |idx: usize| {
            u8::from_str_radix(&digits[idx..idx + 2], 16)
                .map_err(|_| anyhow!("color '{}' has invalid hex digits", value))
        };
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: if digits.len() == 8 { channel(6)? } else { 255 },
        })
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::YELLOW
    }
}

/// How an outline is stroked. Shapes are never filled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    /// Line width in display pixels, centered on the outline.
    pub width: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: Color::YELLOW,
            width: 2.0,
        }
    }
}

/// A stroked rectangle in display space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shape {
    pub outline: DisplayRect,
    pub stroke: StrokeStyle,
}

impl Shape {
    pub fn rect(outline: DisplayRect, stroke: StrokeStyle) -> Self {
        Self { outline, stroke }
    }
}

/// Every shape produced by one detection run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayBatch {
    pub generation: Generation,
    pub shapes: Vec<Shape>,
}

impl OverlayBatch {
    pub fn new(generation: Generation, shapes: Vec<Shape>) -> Self {
        Self { generation, shapes }
    }
}

/// A drawing surface that shows a photo and overlay shapes on top of it.
pub trait OverlaySurface {
    /// Remove every overlay shape.
    fn clear(&mut self);

    /// Add one shape on top of the existing ones.
    fn add_shape(&mut self, shape: Shape);

    /// Replace the overlay with `batch` as a single visual update.
    fn commit(&mut self, batch: OverlayBatch) {
        self.clear();
        for shape in batch.shapes {
            self.add_shape(shape);
        }
    }

    /// A new photo is shown inside `fit`. Surfaces that only track shapes ignore it.
    fn present_image(&mut self, _image: &SourceImage, _fit: DisplayRect) {}
}

/// In-memory overlay: the set of shapes currently on screen.
#[derive(Clone, Debug, Default)]
pub struct ShapeLayer {
    shapes: Vec<Shape>,
    generation: Option<Generation>,
    revision: u64,
}

impl ShapeLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Generation of the last committed batch, if any.
    pub fn generation(&self) -> Option<Generation> {
        self.generation
    }

    /// Count of visual updates (clears, adds and commits) applied so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl OverlaySurface for ShapeLayer {
    fn clear(&mut self) {
        self.shapes.clear();
        self.revision += 1;
    }

    fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
        self.revision += 1;
    }

    fn commit(&mut self, batch: OverlayBatch) {
        if self.generation.is_some_and(|shown| batch.generation < shown) {
            log::debug!(
                "ignoring overlay batch {} older than shown {:?}",
                batch.generation,
                self.generation
            );
            return;
        }
        self.shapes = batch.shapes;
        self.generation = Some(batch.generation);
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(at: f64) -> Shape {
        Shape::rect(DisplayRect::new(at, at, 10.0, 10.0), StrokeStyle::default())
    }

    #[test]
    fn parses_hex_colors() {
        assert_eq!(Color::from_hex("#ffff00").unwrap(), Color::YELLOW);
        assert_eq!(
            Color::from_hex("10203040").unwrap(),
            Color {
                r: 0x10,
                g: 0x20,
                b: 0x30,
                a: 0x40
            }
        );
        assert!(Color::from_hex("#fff").is_err());
        assert!(Color::from_hex("#gggggg").is_err());
    }

    #[test]
    fn default_stroke_is_two_pixel_yellow() {
        let stroke = StrokeStyle::default();
        assert_eq!(stroke.color, Color::YELLOW);
        assert_eq!(stroke.width, 2.0);
    }

    #[test]
    fn commit_replaces_previous_shapes_in_one_update() {
        let mut layer = ShapeLayer::new();
        layer.commit(OverlayBatch::new(Generation(1), vec![square(0.0), square(5.0)]));
        let before = layer.revision();

        layer.commit(OverlayBatch::new(Generation(2), vec![square(9.0)]));
        assert_eq!(layer.shapes(), &[square(9.0)]);
        assert_eq!(layer.generation(), Some(Generation(2)));
        assert_eq!(layer.revision(), before + 1);
    }

    #[test]
    fn older_generations_are_ignored() {
        let mut layer = ShapeLayer::new();
        layer.commit(OverlayBatch::new(Generation(3), vec![square(1.0)]));
        layer.commit(OverlayBatch::new(Generation(2), vec![square(2.0), square(3.0)]));
        assert_eq!(layer.shapes(), &[square(1.0)]);
        assert_eq!(layer.generation(), Some(Generation(3)));
    }

    #[test]
    fn clear_then_add_uses_default_commit_semantics() {
        let mut layer = ShapeLayer::new();
        layer.add_shape(square(0.0));
        layer.clear();
        assert!(layer.is_empty());
        layer.add_shape(square(4.0));
        assert_eq!(layer.shapes().len(), 1);
    }
}
