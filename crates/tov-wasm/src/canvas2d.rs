//! Canvas2D rasterizer.
//!
//! Draws through an HTML `<canvas>` 2D context. Text metrics come from the
//! browser, so hit boxes match what the user sees.

use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use kurbo::{Point, Rect};
use tov_core::Color;
use tov_render::{FontSpec, ImageSize, Rasterizer, RenderError, StrokeStyle};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

/// A decoded background handed over by the host.
#[derive(Debug, Clone)]
pub struct BackgroundImage(pub HtmlImageElement);

impl ImageSize for BackgroundImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.0.natural_width(), self.0.natural_height())
    }
}

pub struct Canvas2dRasterizer {
    ctx: CanvasRenderingContext2d,
    width: u32,
    height: u32,
}

impl Canvas2dRasterizer {
    /// Take the canvas's 2D context and size the backing store to
    /// `width` × `height` canvas pixels.
    pub fn new(canvas: &HtmlCanvasElement, width: u32, height: u32) -> Result<Self, JsValue> {
        canvas.set_width(width);
        canvas.set_height(height);
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { ctx, width, height })
    }

    fn set_text_style(&self, font: &FontSpec) {
        self.ctx.set_font(&font.css());
        self.ctx.set_text_align("center");
        self.ctx.set_text_baseline("middle");
    }

    fn set_stroke(&self, stroke: &StrokeStyle) {
        self.ctx.set_stroke_style_str(&stroke.color.to_css());
        self.ctx.set_line_width(stroke.width);
        let dash = match stroke.dash {
            Some([on, off]) => js_sys::Array::of2(&JsValue::from_f64(on), &JsValue::from_f64(off)),
            None => js_sys::Array::new(),
        };
        let _ = self.ctx.set_line_dash(&dash);
    }
}

impl Rasterizer for Canvas2dRasterizer {
    type Image = BackgroundImage;

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.ctx
            .clear_rect(0.0, 0.0, self.width as f64, self.height as f64);
    }

    fn draw_image(&mut self, image: &BackgroundImage, dest: Rect) {
        if let Err(e) = self.ctx.draw_image_with_html_image_element_and_dw_and_dh(
            &image.0,
            dest.x0,
            dest.y0,
            dest.width(),
            dest.height(),
        ) {
            log::warn!("draw_image failed: {e:?}");
        }
    }

    fn measure_text(&mut self, text: &str, font: &FontSpec) -> f64 {
        self.set_text_style(font);
        match self.ctx.measure_text(text) {
            Ok(metrics) => metrics.width(),
            Err(e) => {
                log::warn!("measure_text failed: {e:?}");
                0.0
            }
        }
    }

    fn stroke_text(&mut self, text: &str, font: &FontSpec, center: Point, stroke: &StrokeStyle) {
        self.set_text_style(font);
        self.set_stroke(stroke);
        self.ctx.set_line_join("round");
        let _ = self.ctx.stroke_text(text, center.x, center.y);
    }

    fn fill_text(&mut self, text: &str, font: &FontSpec, center: Point, color: Color) {
        self.set_text_style(font);
        self.ctx.set_fill_style_str(&color.to_css());
        let _ = self.ctx.fill_text(text, center.x, center.y);
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: &StrokeStyle) {
        self.set_stroke(stroke);
        self.ctx.set_line_join("miter");
        self.ctx
            .stroke_rect(rect.x0, rect.y0, rect.width(), rect.height());
        let _ = self.ctx.set_line_dash(&js_sys::Array::new());
    }

    /// Read the canvas pixels back and encode them as PNG.
    fn encode_png(&self) -> Result<Vec<u8>, RenderError> {
        let data = self
            .ctx
            .get_image_data(0.0, 0.0, self.width as f64, self.height as f64)
            .map_err(|e| RenderError::Encode(format!("{e:?}")))?;
        let pixels = data.data().0;
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(&pixels, self.width, self.height, image::ColorType::Rgba8)
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        Ok(out)
    }
}
