//! Deterministic rasterizer that records draw calls.
//!
//! Text measures with a fixed advance of `0.6 × size` per character, so
//! layout and hit-test results are stable without any font files.

use crate::error::RenderError;
use crate::raster::{FontSpec, ImageSize, Rasterizer, StrokeStyle};
use image::{DynamicImage, ImageOutputFormat, RgbaImage};
use kurbo::{Point, Rect};
use std::io::Cursor;
use tov_core::Color;

/// Stand-in image handle: dimensions only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedImage {
    pub width: u32,
    pub height: u32,
}

impl RecordedImage {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl ImageSize for RecordedImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear,
    Image {
        size: (u32, u32),
        dest: Rect,
    },
    StrokeText {
        text: String,
        font: FontSpec,
        center: Point,
        stroke: StrokeStyle,
    },
    FillText {
        text: String,
        font: FontSpec,
        center: Point,
        color: Color,
    },
    StrokeRect {
        rect: Rect,
        stroke: StrokeStyle,
    },
}

#[derive(Debug, Clone)]
pub struct RecordingRasterizer {
    width: u32,
    height: u32,
    calls: Vec<DrawCall>,
    fail_encode: bool,
}

impl RecordingRasterizer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
            fail_encode: false,
        }
    }

    /// Make every `encode_png` call fail.
    pub fn failing_encode(mut self) -> Self {
        self.fail_encode = true;
        self
    }

    /// Calls since the last `clear`.
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Texts filled since the last `clear`, in paint order.
    pub fn filled_texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn selection_boxes(&self) -> Vec<Rect> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::StrokeRect { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect()
    }

    pub fn drew_image(&self) -> bool {
        self.calls.iter().any(|call| matches!(call, DrawCall::Image { .. }))
    }
}

impl Rasterizer for RecordingRasterizer {
    type Image = RecordedImage;

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.calls.clear();
        self.calls.push(DrawCall::Clear);
    }

    fn draw_image(&mut self, image: &RecordedImage, dest: Rect) {
        self.calls.push(DrawCall::Image {
            size: image.dimensions(),
            dest,
        });
    }

    fn measure_text(&mut self, text: &str, font: &FontSpec) -> f64 {
        text.chars().count() as f64 * font.size * 3.0 / 5.0
    }

    fn stroke_text(&mut self, text: &str, font: &FontSpec, center: Point, stroke: &StrokeStyle) {
        self.calls.push(DrawCall::StrokeText {
            text: text.to_string(),
            font: font.clone(),
            center,
            stroke: *stroke,
        });
    }

    fn fill_text(&mut self, text: &str, font: &FontSpec, center: Point, color: Color) {
        self.calls.push(DrawCall::FillText {
            text: text.to_string(),
            font: font.clone(),
            center,
            color,
        });
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: &StrokeStyle) {
        self.calls.push(DrawCall::StrokeRect {
            rect,
            stroke: *stroke,
        });
    }

    /// A blank canvas-sized PNG: there are no pixels to encode.
    fn encode_png(&self) -> Result<Vec<u8>, RenderError> {
        if self.fail_encode {
            return Err(RenderError::Encode("encoder disabled".into()));
        }
        let blank = DynamicImage::ImageRgba8(RgbaImage::new(self.width.max(1), self.height.max(1)));
        let mut bytes = Vec::new();
        blank
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{Compositor, OUTLINE_STROKE, SELECTION_STROKE};
    use pretty_assertions::assert_eq;
    use tov_core::{LayerId, LayerSet, Position, TextLayer};

    fn caption(id: &str, text: &str) -> TextLayer {
        let mut layer = TextLayer::new_default(LayerId::intern(id), 300, 533);
        layer.text = text.into();
        layer.position = Position::new(150.0, 100.0);
        layer.color = "#ff6b6b".into();
        layer
    }

    #[test]
    fn records_outline_then_fill() {
        let layers = LayerSet::create(&[caption("one", "Hi")]);
        let mut raster = RecordingRasterizer::new(300, 533);
        Compositor::new().render(&mut raster, None, &layers, None);

        let calls = raster.calls();
        assert_eq!(calls[0], DrawCall::Clear);
        assert!(matches!(&calls[1], DrawCall::StrokeText { stroke, .. } if *stroke == OUTLINE_STROKE));
        assert!(matches!(
            &calls[2],
            DrawCall::FillText { color, .. } if color.to_hex() == "#ff6b6b"
        ));
        assert_eq!(calls.len(), 3);
    }

    #[test]
    fn selection_box_is_inset_around_text() {
        let layers = LayerSet::create(&[caption("sel", "Hi")]);
        let mut raster = RecordingRasterizer::new(300, 533);
        Compositor::new().render(&mut raster, None, &layers, Some(LayerId::intern("sel")));

        // 24 × 20 text box centred on (150, 100), grown by 5 on each side.
        assert_eq!(raster.selection_boxes(), vec![Rect::new(133.0, 85.0, 167.0, 115.0)]);
        assert!(matches!(
            raster.calls().last(),
            Some(DrawCall::StrokeRect { stroke, .. }) if *stroke == SELECTION_STROKE
        ));
    }

    #[test]
    fn background_is_fitted_before_layers() {
        let layers = LayerSet::create(&[caption("bg", "Hi")]);
        let mut raster = RecordingRasterizer::new(300, 533);
        let background = RecordedImage::new(600, 300);
        Compositor::new().render(&mut raster, Some(&background), &layers, None);
        assert_eq!(
            raster.calls()[1],
            DrawCall::Image {
                size: (600, 300),
                dest: Rect::new(0.0, 191.5, 300.0, 341.5),
            }
        );
    }

    #[test]
    fn encodes_a_png_blob() {
        let raster = RecordingRasterizer::new(4, 4);
        let png = raster.encode_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");
        assert!(RecordingRasterizer::new(4, 4).failing_encode().encode_png().is_err());
    }
}
