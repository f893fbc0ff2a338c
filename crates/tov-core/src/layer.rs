//! Text layer model.
//!
//! A [`TextLayer`] is one styled caption. Layers are plain values: edits go
//! through a [`LayerPatch`] merged into a copy, never through shared mutable
//! references, so snapshots taken for undo stay untouched.

use crate::id::LayerId;
use serde::{Deserialize, Serialize};

/// Canvas-space anchor of a layer: the visual centre of its text.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One styled text caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayer {
    pub id: LayerId,
    /// Display string. Empty layers are neither rendered nor hit-testable.
    pub text: String,
    #[serde(flatten)]
    pub position: Position,
    /// Point-like unit. The UI keeps it in 10..=50; the model does not clamp.
    pub font_size: u32,
    /// CSS font stack, handed to the rasterizer as-is.
    pub font_family: String,
    /// Fill color spec, see [`Color::parse`](crate::Color::parse).
    pub color: String,
    /// Weight token (`normal`, `bold`, `700`, ...).
    pub font_weight: String,
    /// Whether the layer takes part in rendering and hit-testing at all.
    /// Older project files call this field `isSelected`.
    #[serde(alias = "isSelected")]
    pub visible: bool,
}

impl TextLayer {
    pub const DEFAULT_TEXT: &'static str = "New text";
    pub const DEFAULT_FONT_SIZE: u32 = 20;
    pub const DEFAULT_FONT_FAMILY: &'static str = "Arial, sans-serif";
    pub const DEFAULT_COLOR: &'static str = "#ffffff";

    /// The layer the editor inserts for "add text": centred on the canvas.
    pub fn new_default(id: LayerId, canvas_width: u32, canvas_height: u32) -> Self {
        Self {
            id,
            text: Self::DEFAULT_TEXT.to_string(),
            position: Position::new(canvas_width as f64 / 2.0, canvas_height as f64 / 2.0),
            font_size: Self::DEFAULT_FONT_SIZE,
            font_family: Self::DEFAULT_FONT_FAMILY.to_string(),
            color: Self::DEFAULT_COLOR.to_string(),
            font_weight: FontWeight::NORMAL.to_string(),
            visible: true,
        }
    }

    /// Only visible layers with text are drawn or hit-tested.
    pub fn is_renderable(&self) -> bool {
        self.visible && !self.text.is_empty()
    }

    /// Merge every field the patch carries.
    pub fn apply(&mut self, patch: &LayerPatch) {
        if let Some(text) = &patch.text {
            self.text.clone_from(text);
        }
        if let Some(x) = patch.x {
            self.position.x = x;
        }
        if let Some(y) = patch.y {
            self.position.y = y;
        }
        if let Some(size) = patch.font_size {
            self.font_size = size;
        }
        if let Some(family) = &patch.font_family {
            self.font_family.clone_from(family);
        }
        if let Some(color) = &patch.color {
            self.color.clone_from(color);
        }
        if let Some(weight) = &patch.font_weight {
            self.font_weight.clone_from(weight);
        }
        if let Some(visible) = patch.visible {
            self.visible = visible;
        }
    }

    /// Copy of this layer with the patch merged in.
    #[must_use]
    pub fn patched(&self, patch: &LayerPatch) -> Self {
        let mut layer = self.clone();
        layer.apply(patch);
        layer
    }
}

/// A partial update: `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayerPatch {
    pub text: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub font_size: Option<u32>,
    pub font_family: Option<String>,
    pub color: Option<String>,
    pub font_weight: Option<String>,
    #[serde(alias = "isSelected")]
    pub visible: Option<bool>,
}

impl LayerPatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn font_size(size: u32) -> Self {
        Self {
            font_size: Some(size),
            ..Self::default()
        }
    }

    pub fn color(color: impl Into<String>) -> Self {
        Self {
            color: Some(color.into()),
            ..Self::default()
        }
    }

    pub fn visible(visible: bool) -> Self {
        Self {
            visible: Some(visible),
            ..Self::default()
        }
    }

    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }

    pub fn with_font_weight(mut self, weight: impl Into<String>) -> Self {
        self.font_weight = Some(weight.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Set one field from a `key=value` pair (`text`, `x`, `y`, `fontSize`,
    /// `fontFamily`, `color`, `fontWeight`, `visible`).
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<(), String> {
        let number = |v: &str| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| format!("`{key}` expects a number, got `{v}`"))
        };
        match key {
            "text" => self.text = Some(value.to_string()),
            "x" => self.x = Some(number(value)?),
            "y" => self.y = Some(number(value)?),
            "fontSize" | "font_size" | "size" => {
                let size = value
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| format!("`{key}` expects a positive integer, got `{value}`"))?;
                self.font_size = Some(size);
            }
            "fontFamily" | "font_family" | "font" => self.font_family = Some(value.to_string()),
            "color" => self.color = Some(value.to_string()),
            "fontWeight" | "font_weight" | "weight" => self.font_weight = Some(value.to_string()),
            "visible" => {
                let visible = value
                    .trim()
                    .parse::<bool>()
                    .map_err(|_| format!("`{key}` expects true or false, got `{value}`"))?;
                self.visible = Some(visible);
            }
            _ => return Err(format!("unknown layer field `{key}`")),
        }
        Ok(())
    }
}

/// Helpers for the opaque weight token.
pub struct FontWeight;

impl FontWeight {
    pub const NORMAL: &'static str = "normal";
    pub const BOLD: &'static str = "bold";

    /// CSS numeric weight for a token; unknown tokens read as 400.
    pub fn numeric(token: &str) -> u16 {
        match token.trim().to_ascii_lowercase().as_str() {
            "normal" | "regular" | "" => 400,
            "bold" => 700,
            "lighter" => 300,
            "bolder" => 800,
            other => other
                .parse::<u16>()
                .ok()
                .filter(|w| (1..=1000).contains(w))
                .unwrap_or(400),
        }
    }
}

/// Quick-position presets offered next to the X/Y inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Top,
    Middle,
    Bottom,
}

impl Placement {
    pub fn position(self) -> Position {
        match self {
            Placement::Top => Position::new(140.0, 120.0),
            Placement::Middle => Position::new(140.0, 250.0),
            Placement::Bottom => Position::new(140.0, 380.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn caption() -> TextLayer {
        TextLayer {
            id: LayerId::intern("caption"),
            text: "Hi".into(),
            position: Position::new(10.0, 10.0),
            font_size: 24,
            font_family: "KaiTi, serif".into(),
            color: "#ff6b6b".into(),
            font_weight: "bold".into(),
            visible: true,
        }
    }

    #[test]
    fn patch_merges_only_given_fields() {
        let layer = caption();
        let patched = layer.patched(&LayerPatch::text("Hello").with_color("#000000"));
        assert_eq!(patched.text, "Hello");
        assert_eq!(patched.color, "#000000");
        assert_eq!(patched.font_size, 24);
        assert_eq!(patched.position, layer.position);
        assert_eq!(layer.text, "Hi", "source layer must not change");
    }

    #[test]
    fn empty_patch_is_identity() {
        let layer = caption();
        assert!(LayerPatch::default().is_empty());
        assert_eq!(layer.patched(&LayerPatch::default()), layer);
    }

    #[test]
    fn renderable_requires_text_and_visibility() {
        let mut layer = caption();
        assert!(layer.is_renderable());
        layer.visible = false;
        assert!(!layer.is_renderable());
        layer.visible = true;
        layer.text.clear();
        assert!(!layer.is_renderable());
    }

    #[test]
    fn legacy_is_selected_field_reads_as_visible() {
        let json = r##"{
            "id": "layer-1", "text": "Hi", "x": 150, "y": 100, "fontSize": 24,
            "fontFamily": "Arial", "color": "#fff", "fontWeight": "bold", "isSelected": false
        }"##;
        let layer: TextLayer = serde_json::from_str(json).unwrap();
        assert!(!layer.visible);
        assert_eq!(layer.position, Position::new(150.0, 100.0));
    }

    #[test]
    fn serializes_camel_case_with_flat_position() {
        let value = serde_json::to_value(caption()).unwrap();
        assert_eq!(value["fontSize"], 24);
        assert_eq!(value["x"], 10.0);
        assert_eq!(value["visible"], true);
    }

    #[test]
    fn set_field_parses_values() {
        let mut patch = LayerPatch::default();
        patch.set_field("x", "42").unwrap();
        patch.set_field("fontSize", "30").unwrap();
        patch.set_field("visible", "false").unwrap();
        assert_eq!(patch.x, Some(42.0));
        assert_eq!(patch.y, None);
        assert_eq!(patch.font_size, Some(30));
        assert_eq!(patch.visible, Some(false));
        assert!(patch.set_field("fontSize", "big").is_err());
        assert!(patch.set_field("shadow", "1").is_err());
    }

    #[test]
    fn patch_moves_single_axis() {
        let layer = caption();
        let moved = layer.patched(&LayerPatch {
            y: Some(250.0),
            ..LayerPatch::default()
        });
        assert_eq!(moved.position, Position::new(10.0, 250.0));
    }

    #[test]
    fn patch_from_json() {
        let patch: LayerPatch = serde_json::from_str(r#"{"fontSize": 32, "x": 140}"#).unwrap();
        assert_eq!(patch.font_size, Some(32));
        assert_eq!(patch.x, Some(140.0));
        assert!(patch.text.is_none());
    }

    #[test]
    fn weight_tokens() {
        assert_eq!(FontWeight::numeric("normal"), 400);
        assert_eq!(FontWeight::numeric("bold"), 700);
        assert_eq!(FontWeight::numeric("900"), 900);
        assert_eq!(FontWeight::numeric("heavy-ish"), 400);
    }

    #[test]
    fn default_layer_is_centred() {
        let layer = TextLayer::new_default(LayerId::intern("new"), 300, 533);
        assert_eq!(layer.position, Position::new(150.0, 266.5));
        assert!(layer.is_renderable());
    }
}
