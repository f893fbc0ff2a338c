//! The drawing surface every backend implements.

use crate::error::RenderError;
use kurbo::{Point, Rect};
use tov_core::{Color, FontWeight, TextLayer};

/// Pixel dimensions of a decoded image handle.
pub trait ImageSize {
    fn dimensions(&self) -> (u32, u32);
}

/// Font request derived from a text layer.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    /// CSS font stack, e.g. `KaiTi, serif`.
    pub family: String,
    pub size: f64,
    /// Weight token as stored on the layer.
    pub weight: String,
}

impl FontSpec {
    pub fn from_layer(layer: &TextLayer) -> Self {
        Self {
            family: layer.font_family.clone(),
            size: layer.font_size as f64,
            weight: layer.font_weight.clone(),
        }
    }

    pub fn numeric_weight(&self) -> u16 {
        FontWeight::numeric(&self.weight)
    }

    /// CSS `font` shorthand: `bold 24px KaiTi, serif`.
    pub fn css(&self) -> String {
        format!("{} {}px {}", self.weight, self.size, self.family)
    }
}

/// Line style for outlines and the selection box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f64,
    /// `[on, off]` dash lengths; `None` draws a solid line.
    pub dash: Option<[f64; 2]>,
}

/// A 2D drawing surface of fixed size.
///
/// Text calls are centre-anchored: `center` is the visual middle of the
/// string both horizontally and vertically.
pub trait Rasterizer {
    type Image: ImageSize;

    fn size(&self) -> (u32, u32);

    /// Reset every pixel to transparent.
    fn clear(&mut self);

    /// Draw `image` scaled into `dest`.
    fn draw_image(&mut self, image: &Self::Image, dest: Rect);

    /// Advance width of `text` in canvas units.
    fn measure_text(&mut self, text: &str, font: &FontSpec) -> f64;

    fn stroke_text(&mut self, text: &str, font: &FontSpec, center: Point, stroke: &StrokeStyle);

    fn fill_text(&mut self, text: &str, font: &FontSpec, center: Point, color: Color);

    fn stroke_rect(&mut self, rect: Rect, stroke: &StrokeStyle);

    /// Current surface contents as a PNG blob.
    fn encode_png(&self) -> Result<Vec<u8>, RenderError>;
}
