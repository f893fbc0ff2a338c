//! Render pass: background, then layers in z-order, then the selection box.

use crate::raster::{FontSpec, ImageSize, Rasterizer, StrokeStyle};
use kurbo::{Point, Rect};
use tov_core::{Color, LayerId, LayerSet, TextLayer};

/// Outline drawn under every caption so it reads on any background.
pub const OUTLINE_STROKE: StrokeStyle = StrokeStyle {
    color: Color::rgba(0.0, 0.0, 0.0, 0.4),
    width: 2.0,
    dash: None,
};

/// Dashed box around the selected layer.
pub const SELECTION_STROKE: StrokeStyle = StrokeStyle {
    color: Color::rgba(107.0 / 255.0, 114.0 / 255.0, 128.0 / 255.0, 1.0),
    width: 2.0,
    dash: Some([4.0, 4.0]),
};

/// Gap between the measured text box and the selection box.
pub const SELECTION_INSET: f64 = 5.0;

/// Measured on-canvas box of one rendered layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerBox {
    pub id: LayerId,
    pub rect: Rect,
}

/// Frame-ready notification: what the last render pass put on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Monotonic per compositor.
    pub seq: u64,
    pub size: (u32, u32),
    /// Boxes of the rendered layers, in paint order.
    pub boxes: Vec<LayerBox>,
}

impl Frame {
    /// Topmost rendered layer containing `point`, edges inclusive.
    pub fn hit_test(&self, point: Point) -> Option<LayerId> {
        self.boxes
            .iter()
            .rev()
            .find(|b| contains_inclusive(&b.rect, point))
            .map(|b| b.id)
    }

    pub fn box_of(&self, id: LayerId) -> Option<Rect> {
        self.boxes.iter().find(|b| b.id == id).map(|b| b.rect)
    }
}

/// Box of a centre-anchored caption: measured width, font-size height.
pub fn text_box(center: Point, width: f64, height: f64) -> Rect {
    Rect::new(
        center.x - width / 2.0,
        center.y - height / 2.0,
        center.x + width / 2.0,
        center.y + height / 2.0,
    )
}

pub(crate) fn contains_inclusive(rect: &Rect, p: Point) -> bool {
    p.x >= rect.x0 && p.x <= rect.x1 && p.y >= rect.y0 && p.y <= rect.y1
}

/// Scale `image` to fit inside `canvas` keeping its aspect ratio, centred.
pub fn fit_contain(image: (u32, u32), canvas: (u32, u32)) -> Rect {
    let (iw, ih) = (image.0 as f64, image.1 as f64);
    let (cw, ch) = (canvas.0 as f64, canvas.1 as f64);
    if iw <= 0.0 || ih <= 0.0 {
        return Rect::ZERO;
    }
    let scale = (cw / iw).min(ch / ih);
    let (w, h) = (iw * scale, ih * scale);
    let (x, y) = ((cw - w) / 2.0, (ch - h) / 2.0);
    Rect::new(x, y, x + w, y + h)
}

#[derive(Debug, Default)]
pub struct Compositor {
    seq: u64,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames rendered so far.
    pub fn frames_rendered(&self) -> u64 {
        self.seq
    }

    /// Composite one frame. A missing background is not an error: layers
    /// still render over a transparent canvas.
    pub fn render<R: Rasterizer>(
        &mut self,
        raster: &mut R,
        background: Option<&R::Image>,
        layers: &LayerSet,
        selected: Option<LayerId>,
    ) -> Frame {
        let size = raster.size();
        raster.clear();

        if let Some(image) = background {
            let dest = fit_contain(image.dimensions(), size);
            raster.draw_image(image, dest);
        }

        let mut boxes = Vec::with_capacity(layers.len());
        for layer in layers.renderable() {
            let rect = paint_layer(raster, layer);
            if selected == Some(layer.id) {
                raster.stroke_rect(rect.inflate(SELECTION_INSET, SELECTION_INSET), &SELECTION_STROKE);
            }
            boxes.push(LayerBox { id: layer.id, rect });
        }

        self.seq += 1;
        Frame {
            seq: self.seq,
            size,
            boxes,
        }
    }
}

fn paint_layer<R: Rasterizer>(raster: &mut R, layer: &TextLayer) -> Rect {
    let font = FontSpec::from_layer(layer);
    let center = Point::new(layer.position.x, layer.position.y);
    let width = raster.measure_text(&layer.text, &font);
    let rect = text_box(center, width, font.size);
    log::trace!(
        "PAINT text {:?} \"{}\" at ({}, {}) {}x{}",
        layer.id,
        layer.text,
        center.x,
        center.y,
        rect.width(),
        rect.height()
    );

    let color = Color::parse(&layer.color).unwrap_or_else(|| {
        log::debug!("layer {:?}: unparseable color {:?}, using black", layer.id, layer.color);
        Color::BLACK
    });
    raster.stroke_text(&layer.text, &font, center, &OUTLINE_STROKE);
    raster.fill_text(&layer.text, &font, center, color);
    rect
}
