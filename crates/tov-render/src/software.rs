//! CPU rasterizer: `image` for pixels, `ab_glyph` for glyph outlines.
//!
//! Text is rasterized into a per-call coverage mask, which is dilated for
//! outlines and synthetic bold, then blended source-over onto the canvas.

use crate::error::{LoadError, RenderError};
use crate::raster::{FontSpec, ImageSize, Rasterizer, StrokeStyle};
use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ColorType, ImageEncoder, Rgba, RgbaImage};
use kurbo::{Point, Rect};
use smallvec::SmallVec;
use std::collections::HashSet;
use std::path::Path;
use tov_core::Color;

impl ImageSize for RgbaImage {
    fn dimensions(&self) -> (u32, u32) {
        RgbaImage::dimensions(self)
    }
}

/// Decode a background from encoded bytes (PNG or JPEG).
pub fn load_image(bytes: &[u8]) -> Result<RgbaImage, LoadError> {
    image::load_from_memory(bytes)
        .map(|decoded| decoded.to_rgba8())
        .map_err(|e| LoadError::Decode(e.to_string()))
}

pub fn load_image_file(path: impl AsRef<Path>) -> Result<RgbaImage, LoadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_image(&bytes)
}

// ─── Fonts ───────────────────────────────────────────────────────────────

#[derive(Clone)]
struct Face {
    /// Lowercased family name.
    family: String,
    weight: u16,
    font: FontArc,
}

/// Loaded font faces, looked up by CSS font stack.
#[derive(Clone, Default)]
pub struct FontBook {
    faces: Vec<Face>,
    default_family: Option<String>,
}

/// Face chosen for a request.
pub struct ResolvedFace<'a> {
    pub font: &'a FontArc,
    /// Requested weight is bold but only a lighter face exists.
    pub synthetic_bold: bool,
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a face from font file bytes (TTF/OTF).
    pub fn add_font(&mut self, family: &str, weight: u16, bytes: Vec<u8>) -> Result<(), LoadError> {
        let font = FontArc::try_from_vec(bytes).map_err(|e| LoadError::Font(e.to_string()))?;
        self.insert(family, weight, font);
        Ok(())
    }

    pub fn add_font_file(
        &mut self,
        family: &str,
        weight: u16,
        path: impl AsRef<Path>,
    ) -> Result<(), LoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.add_font(family, weight, bytes)
    }

    pub fn insert(&mut self, family: &str, weight: u16, font: FontArc) {
        log::debug!("font book: added {family} {weight}");
        self.faces.push(Face {
            family: family.trim().to_lowercase(),
            weight,
            font,
        });
    }

    /// Family used when no name in a stack is loaded. Defaults to the first
    /// face added.
    pub fn set_default(&mut self, family: &str) {
        self.default_family = Some(family.trim().to_lowercase());
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Pick a face: first loaded family of the stack, closest weight; then
    /// the default family; then any face at all.
    pub fn resolve(&self, stack: &str, weight: u16) -> Option<ResolvedFace<'_>> {
        let candidates = family_candidates(stack);
        let face = candidates
            .iter()
            .chain(self.default_family.iter())
            .find_map(|family| self.closest(family, weight))
            .or_else(|| self.faces.first())?;
        Some(ResolvedFace {
            font: &face.font,
            synthetic_bold: weight >= 600 && face.weight < 600,
        })
    }

    fn closest(&self, family: &str, weight: u16) -> Option<&Face> {
        self.faces
            .iter()
            .filter(|f| f.family == family)
            .min_by_key(|f| f.weight.abs_diff(weight))
    }
}

/// Split a CSS font stack into lowercased family names.
fn family_candidates(stack: &str) -> SmallVec<[String; 4]> {
    stack
        .split(',')
        .map(|name| name.trim().trim_matches(|c| c == '"' || c == '\'').to_lowercase())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Pixel scale for a CSS px size (the em square, not the line height).
fn css_scale(font: &FontArc, size: f64) -> PxScale {
    let size = size as f32;
    match font.units_per_em() {
        Some(upem) if upem > 0.0 => PxScale::from(size * font.height_unscaled() / upem),
        _ => PxScale::from(size),
    }
}

/// Glyph ids with their x offsets from the line start, and the total advance.
fn layout_line(font: &FontArc, scale: PxScale, text: &str) -> (Vec<(GlyphId, f32)>, f32) {
    let scaled = font.as_scaled(scale);
    let mut glyphs = Vec::with_capacity(text.len());
    let mut cursor = 0.0f32;
    let mut prev: Option<GlyphId> = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = prev {
            cursor += scaled.kern(prev, id);
        }
        glyphs.push((id, cursor));
        cursor += scaled.h_advance(id);
        prev = Some(id);
    }
    (glyphs, cursor)
}

// ─── Coverage masks ──────────────────────────────────────────────────────

/// Single-channel coverage over a canvas-space rectangle.
struct Mask {
    x0: i32,
    y0: i32,
    width: usize,
    height: usize,
    coverage: Vec<f32>,
}

impl Mask {
    fn at(&self, x: i32, y: i32) -> f32 {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return 0.0;
        }
        self.coverage[y as usize * self.width + x as usize]
    }

    /// Widen every row by one pixel to the right.
    fn embolden(&mut self) {
        for row in self.coverage.chunks_mut(self.width) {
            for x in (1..row.len()).rev() {
                row[x] = row[x].max(row[x - 1]);
            }
        }
    }

    /// Max-filter over a disc of `radius` pixels.
    fn dilate(&self, radius: f64) -> Mask {
        let reach = radius.ceil() as i32;
        let offsets: Vec<(i32, i32)> = (-reach..=reach)
            .flat_map(|dy| (-reach..=reach).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| ((dx * dx + dy * dy) as f64) <= radius * radius)
            .collect();
        let mut coverage = vec![0.0f32; self.coverage.len()];
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let v = offsets
                    .iter()
                    .map(|&(dx, dy)| self.at(x + dx, y + dy))
                    .fold(0.0f32, f32::max);
                coverage[y as usize * self.width + x as usize] = v;
            }
        }
        Mask {
            x0: self.x0,
            y0: self.y0,
            width: self.width,
            height: self.height,
            coverage,
        }
    }
}

fn text_mask(font: &FontArc, spec: &FontSpec, text: &str, center: Point, pad: i32) -> Option<Mask> {
    let scale = css_scale(font, spec.size);
    let scaled = font.as_scaled(scale);
    let (glyphs, width) = layout_line(font, scale, text);

    // Centre-anchored: half the advance left of centre, and the baseline
    // placed so the ascent/descent band is split evenly around `center.y`.
    let origin_x = center.x as f32 - width / 2.0;
    let baseline = center.y as f32 + (scaled.ascent() + scaled.descent()) / 2.0;

    let outlined: Vec<_> = glyphs
        .into_iter()
        .filter_map(|(id, x)| {
            font.outline_glyph(id.with_scale_and_position(scale, point(origin_x + x, baseline)))
        })
        .collect();
    if outlined.is_empty() {
        return None;
    }

    let (mut min_x, mut min_y, mut max_x, mut max_y) = (f32::MAX, f32::MAX, f32::MIN, f32::MIN);
    for glyph in &outlined {
        let b = glyph.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }
    let x0 = min_x.floor() as i32 - pad;
    let y0 = min_y.floor() as i32 - pad;
    let width = (max_x.ceil() as i32 + pad - x0).max(1) as usize;
    let height = (max_y.ceil() as i32 + pad - y0).max(1) as usize;

    let mut mask = Mask {
        x0,
        y0,
        width,
        height,
        coverage: vec![0.0; width * height],
    };
    for glyph in &outlined {
        let b = glyph.px_bounds();
        let (gx, gy) = (b.min.x as i32 - x0, b.min.y as i32 - y0);
        glyph.draw(|px, py, c| {
            let (x, y) = (gx + px as i32, gy + py as i32);
            if x >= 0 && y >= 0 && (x as usize) < width && (y as usize) < height {
                let slot = &mut mask.coverage[y as usize * width + x as usize];
                *slot = slot.max(c);
            }
        });
    }
    Some(mask)
}

/// Source-over blend of `color` at `coverage` into one pixel.
fn blend(dst: &mut Rgba<u8>, color: Color, coverage: f32) {
    let sa = (color.a * coverage).clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let src = [color.r, color.g, color.b];
    for (c, &s) in src.iter().enumerate() {
        let d = dst[c] as f32 / 255.0;
        let out = (s.clamp(0.0, 1.0) * sa + d * da * (1.0 - sa)) / out_a;
        dst[c] = (out * 255.0).round() as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}

// ─── Rasterizer ──────────────────────────────────────────────────────────

pub struct SoftwareRasterizer {
    canvas: RgbaImage,
    fonts: FontBook,
    warned_no_fonts: bool,
}

impl SoftwareRasterizer {
    pub fn new(width: u32, height: u32, fonts: FontBook) -> Self {
        Self {
            canvas: RgbaImage::new(width, height),
            fonts,
            warned_no_fonts: false,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn into_image(self) -> RgbaImage {
        self.canvas
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    fn face(&mut self, font: &FontSpec) -> Option<(FontArc, bool)> {
        match self.fonts.resolve(&font.family, font.numeric_weight()) {
            Some(face) => Some((face.font.clone(), face.synthetic_bold)),
            None => {
                if !self.warned_no_fonts {
                    log::warn!("no fonts loaded; text will not be drawn");
                    self.warned_no_fonts = true;
                }
                None
            }
        }
    }

    fn paint_mask(&mut self, mask: &Mask, color: Color) {
        let (cw, ch) = (self.canvas.width() as i32, self.canvas.height() as i32);
        for y in 0..mask.height {
            for x in 0..mask.width {
                let c = mask.coverage[y * mask.width + x];
                if c <= 0.001 {
                    continue;
                }
                let (px, py) = (mask.x0 + x as i32, mask.y0 + y as i32);
                if px >= 0 && py >= 0 && px < cw && py < ch {
                    blend(self.canvas.get_pixel_mut(px as u32, py as u32), color, c);
                }
            }
        }
    }

    fn glyph_mask(&mut self, text: &str, font: &FontSpec, center: Point, pad: i32) -> Option<Mask> {
        let (face, synthetic_bold) = self.face(font)?;
        let mut mask = text_mask(&face, font, text, center, pad + 1)?;
        if synthetic_bold {
            mask.embolden();
        }
        Some(mask)
    }
}

impl Rasterizer for SoftwareRasterizer {
    type Image = RgbaImage;

    fn size(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    fn clear(&mut self) {
        for pixel in self.canvas.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    fn draw_image(&mut self, image: &RgbaImage, dest: Rect) {
        let (w, h) = (dest.width().round(), dest.height().round());
        if w < 1.0 || h < 1.0 {
            return;
        }
        let (w, h) = (w as u32, h as u32);
        let (x, y) = (dest.x0.round() as i64, dest.y0.round() as i64);
        if image.dimensions() == (w, h) {
            imageops::overlay(&mut self.canvas, image, x, y);
        } else {
            let resized = imageops::resize(image, w, h, FilterType::Triangle);
            imageops::overlay(&mut self.canvas, &resized, x, y);
        }
    }

    fn measure_text(&mut self, text: &str, font: &FontSpec) -> f64 {
        let Some((face, synthetic_bold)) = self.face(font) else {
            return 0.0;
        };
        let (glyphs, width) = layout_line(&face, css_scale(&face, font.size), text);
        let bold_extra = if synthetic_bold && !glyphs.is_empty() { 1.0 } else { 0.0 };
        width as f64 + bold_extra
    }

    fn stroke_text(&mut self, text: &str, font: &FontSpec, center: Point, stroke: &StrokeStyle) {
        let radius = stroke.width / 2.0;
        if let Some(mask) = self.glyph_mask(text, font, center, radius.ceil() as i32) {
            let outline = mask.dilate(radius);
            self.paint_mask(&outline, stroke.color);
        }
    }

    fn fill_text(&mut self, text: &str, font: &FontSpec, center: Point, color: Color) {
        if let Some(mask) = self.glyph_mask(text, font, center, 0) {
            self.paint_mask(&mask, color);
        }
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: &StrokeStyle) {
        let half = stroke.width / 2.0;
        let corners = [
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x1, rect.y1),
            Point::new(rect.x0, rect.y1),
            Point::new(rect.x0, rect.y0),
        ];

        // Collect first so overlapping pen squares blend once.
        let mut pixels = HashSet::new();
        let mut travelled = 0.0;
        for edge in corners.windows(2) {
            let (a, b) = (edge[0], edge[1]);
            let len = a.distance(b);
            let steps = len.ceil().max(1.0) as usize;
            for i in 0..=steps {
                let t = i as f64 / steps as f64;
                if !dash_on(travelled + len * t, stroke.dash) {
                    continue;
                }
                let p = a.lerp(b, t);
                for py in (p.y - half).floor() as i64..(p.y + half).ceil() as i64 {
                    for px in (p.x - half).floor() as i64..(p.x + half).ceil() as i64 {
                        pixels.insert((px, py));
                    }
                }
            }
            travelled += len;
        }

        let (cw, ch) = (self.canvas.width() as i64, self.canvas.height() as i64);
        for (px, py) in pixels {
            if px >= 0 && py >= 0 && px < cw && py < ch {
                blend(self.canvas.get_pixel_mut(px as u32, py as u32), stroke.color, 1.0);
            }
        }
    }

    fn encode_png(&self) -> Result<Vec<u8>, RenderError> {
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(
                self.canvas.as_raw(),
                self.canvas.width(),
                self.canvas.height(),
                ColorType::Rgba8,
            )
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        Ok(bytes)
    }
}

fn dash_on(distance: f64, dash: Option<[f64; 2]>) -> bool {
    match dash {
        Some([on, off]) if on + off > 0.0 => distance % (on + off) < on,
        _ => true,
    }
}
