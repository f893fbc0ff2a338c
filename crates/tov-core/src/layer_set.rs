//! Ordered, capped collection of text layers.
//!
//! Order is z-order: later layers paint on top, and hit-testing walks the
//! set back to front so the topmost layer wins. Every operation is a pure
//! transformation returning a new `LayerSet`; the receiver stays valid and
//! unaliased, which is what makes full-snapshot undo sound.

use crate::error::LayerError;
use crate::id::LayerId;
use crate::layer::{LayerPatch, TextLayer};
use serde::{Deserialize, Serialize};

/// Maximum number of text layers in one frame.
pub const MAX_LAYERS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerSet {
    layers: Vec<TextLayer>,
}

impl LayerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deep-copy a seed (template preset or saved project). IDs are kept as
    /// given; callers are responsible for their uniqueness.
    pub fn create(seed: &[TextLayer]) -> Self {
        Self {
            layers: seed.to_vec(),
        }
    }

    /// New set with `patch` merged into layer `id`.
    /// Unknown IDs return an unchanged copy: a stale UI reference is not an error.
    #[must_use]
    pub fn update(&self, id: LayerId, patch: &LayerPatch) -> Self {
        if !self.contains(id) {
            log::debug!("update: no layer {id:?}, ignoring");
        }
        Self {
            layers: self
                .layers
                .iter()
                .map(|layer| {
                    if layer.id == id {
                        layer.patched(patch)
                    } else {
                        layer.clone()
                    }
                })
                .collect(),
        }
    }

    /// New set without layer `id`. Unknown IDs return an unchanged copy.
    #[must_use]
    pub fn remove(&self, id: LayerId) -> Self {
        Self {
            layers: self
                .layers
                .iter()
                .filter(|layer| layer.id != id)
                .cloned()
                .collect(),
        }
    }

    /// New set with `layer` on top.
    ///
    /// # Errors
    /// `CapacityExceeded` once the set holds [`MAX_LAYERS`], `DuplicateId` if
    /// the ID is already taken. The receiver is untouched either way.
    pub fn append(&self, layer: TextLayer) -> Result<Self, LayerError> {
        if self.layers.len() >= MAX_LAYERS {
            return Err(LayerError::CapacityExceeded { cap: MAX_LAYERS });
        }
        if self.contains(layer.id) {
            return Err(LayerError::DuplicateId(layer.id));
        }
        let mut layers = Vec::with_capacity(self.layers.len() + 1);
        layers.extend_from_slice(&self.layers);
        layers.push(layer);
        Ok(Self { layers })
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.layers.len() >= MAX_LAYERS
    }

    pub fn get(&self, id: LayerId) -> Option<&TextLayer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.get(id).is_some()
    }

    /// Layers in paint order (bottom first).
    pub fn iter(&self) -> std::slice::Iter<'_, TextLayer> {
        self.layers.iter()
    }

    /// Layers that take part in rendering and hit-testing, in paint order.
    pub fn renderable(&self) -> impl DoubleEndedIterator<Item = &TextLayer> + '_ {
        self.layers.iter().filter(|layer| layer.is_renderable())
    }

    pub fn as_slice(&self) -> &[TextLayer] {
        &self.layers
    }

    /// First ID that occurs more than once, if any.
    pub fn first_duplicate_id(&self) -> Option<LayerId> {
        let mut seen = std::collections::HashSet::with_capacity(self.layers.len());
        self.layers
            .iter()
            .map(|layer| layer.id)
            .find(|id| !seen.insert(*id))
    }

    /// Texts of the visible layers, joined for an export caption.
    pub fn caption_summary(&self) -> String {
        self.layers
            .iter()
            .filter(|layer| layer.visible)
            .map(|layer| layer.text.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl<'a> IntoIterator for &'a LayerSet {
    type Item = &'a TextLayer;
    type IntoIter = std::slice::Iter<'a, TextLayer>;

    fn into_iter(self) -> Self::IntoIter {
        self.layers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::Position;
    use pretty_assertions::assert_eq;

    fn layer(id: &str, text: &str) -> TextLayer {
        TextLayer {
            id: LayerId::intern(id),
            text: text.into(),
            position: Position::new(10.0, 10.0),
            font_size: 20,
            font_family: "Arial, sans-serif".into(),
            color: "#ffffff".into(),
            font_weight: "normal".into(),
            visible: true,
        }
    }

    #[test]
    fn create_deep_copies_seed() {
        let seed = vec![layer("a", "Hi")];
        let set = LayerSet::create(&seed);
        let edited = set.update(LayerId::intern("a"), &LayerPatch::text("Hello"));
        assert_eq!(seed[0].text, "Hi");
        assert_eq!(set.get(LayerId::intern("a")).unwrap().text, "Hi");
        assert_eq!(edited.get(LayerId::intern("a")).unwrap().text, "Hello");
    }

    #[test]
    fn update_unknown_id_is_noop() {
        let set = LayerSet::create(&[layer("a", "Hi")]);
        let same = set.update(LayerId::intern("missing"), &LayerPatch::text("x"));
        assert_eq!(same, set);
    }

    #[test]
    fn remove_keeps_order() {
        let set = LayerSet::create(&[layer("a", "A"), layer("b", "B"), layer("c", "C")]);
        let removed = set.remove(LayerId::intern("b"));
        let ids: Vec<&str> = removed.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.remove(LayerId::intern("zzz")), set);
    }

    #[test]
    fn append_respects_cap() {
        let mut set = LayerSet::new();
        for n in 0..MAX_LAYERS {
            set = set.append(layer(&format!("cap_{n}"), "x")).unwrap();
        }
        assert!(set.is_full());
        let err = set.append(layer("cap_overflow", "x")).unwrap_err();
        assert_eq!(err, LayerError::CapacityExceeded { cap: MAX_LAYERS });
        assert_eq!(set.len(), MAX_LAYERS);
    }

    #[test]
    fn append_rejects_duplicate_id() {
        let set = LayerSet::create(&[layer("a", "A")]);
        assert_eq!(
            set.append(layer("a", "again")),
            Err(LayerError::DuplicateId(LayerId::intern("a")))
        );
    }

    #[test]
    fn renderable_skips_empty_and_hidden() {
        let mut hidden = layer("hidden", "Boo");
        hidden.visible = false;
        let set = LayerSet::create(&[layer("a", "A"), layer("empty", ""), hidden]);
        let ids: Vec<&str> = set.renderable().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn caption_summary_joins_visible_texts() {
        let mut hidden = layer("h", "secret");
        hidden.visible = false;
        let set = LayerSet::create(&[layer("a", "Happy"), hidden, layer("b", "2025")]);
        assert_eq!(set.caption_summary(), "Happy, 2025");
    }

    #[test]
    fn detects_duplicate_ids() {
        let set = LayerSet::create(&[layer("a", "A"), layer("b", "B"), layer("a", "C")]);
        assert_eq!(set.first_duplicate_id(), Some(LayerId::intern("a")));
        assert_eq!(LayerSet::create(&[layer("a", "A")]).first_duplicate_id(), None);
    }
}
