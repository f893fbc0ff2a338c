//! Hit testing: point → layer lookup.
//!
//! Reverse-walks the layer set (front-to-back) and measures each candidate
//! with the same rasterizer that draws it, so the hit area always matches
//! the rendered text rather than any stored size.

use crate::compose::{contains_inclusive, text_box};
use crate::raster::{FontSpec, Rasterizer};
use kurbo::Point;
use tov_core::{LayerId, LayerSet};

/// Find the topmost renderable layer at `point` (canvas coordinates).
/// Returns `None` if only background is hit.
pub fn hit_test<R: Rasterizer>(raster: &mut R, layers: &LayerSet, point: Point) -> Option<LayerId> {
    for layer in layers.renderable().rev() {
        let font = FontSpec::from_layer(layer);
        let width = raster.measure_text(&layer.text, &font);
        let rect = text_box(Point::new(layer.position.x, layer.position.y), width, font.size);
        log::trace!("HIT candidate {:?} {:?} vs ({}, {})", layer.id, rect, point.x, point.y);
        if contains_inclusive(&rect, point) {
            return Some(layer.id);
        }
    }
    None
}

/// Map a pointer position from display pixels to canvas pixels.
///
/// The canvas may be shown scaled; `display_size` is its on-screen size.
/// A zero-sized display maps nothing and returns the point as-is.
pub fn display_to_canvas(point: Point, display_size: (f64, f64), canvas_size: (u32, u32)) -> Point {
    let (dw, dh) = display_size;
    if dw <= 0.0 || dh <= 0.0 {
        return point;
    }
    Point::new(
        point.x * canvas_size.0 as f64 / dw,
        point.y * canvas_size.1 as f64 / dh,
    )
}
