//! Saved project: which template, which layers, and when.

use crate::error::SnapshotError;
use crate::id::TemplateId;
use crate::layer_set::{LayerSet, MAX_LAYERS};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    pub template_id: TemplateId,
    #[serde(alias = "textLayers")]
    pub layers: LayerSet,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl ProjectSnapshot {
    pub fn new(template_id: TemplateId, layers: LayerSet) -> Self {
        Self {
            template_id,
            layers,
            timestamp: now_millis(),
        }
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a snapshot. Snapshots that could never have come
    /// out of an editing session (too many layers, repeated IDs) are rejected.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.layers.len() > MAX_LAYERS {
            return Err(SnapshotError::TooManyLayers {
                count: snapshot.layers.len(),
                cap: MAX_LAYERS,
            });
        }
        if let Some(id) = snapshot.layers.first_duplicate_id() {
            return Err(SnapshotError::DuplicateLayer(id));
        }
        Ok(snapshot)
    }
}

/// Wall-clock milliseconds since the Unix epoch; 0 if the clock is before it.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::LayerId;
    use crate::layer::TextLayer;
    use crate::template::TemplateCatalog;
    use pretty_assertions::assert_eq;

    #[test]
    fn json_roundtrip() {
        let catalog = TemplateCatalog::builtin();
        let template = catalog.first();
        let snapshot = ProjectSnapshot::new(template.id.clone(), template.seed());
        let back = ProjectSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(back, snapshot);
        assert!(snapshot.timestamp > 0);
    }

    #[test]
    fn wire_field_names() {
        let snapshot = ProjectSnapshot {
            template_id: TemplateId::new("2"),
            layers: LayerSet::new(),
            timestamp: 1_700_000_000_000,
        };
        let value: serde_json::Value =
            serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(value["templateId"], "2");
        assert_eq!(value["timestamp"], 1_700_000_000_000u64);
        assert!(value["layers"].is_array());
    }

    #[test]
    fn rejects_oversized_snapshot() {
        let layers: Vec<TextLayer> = (0..=MAX_LAYERS)
            .map(|n| TextLayer::new_default(LayerId::intern(&format!("big_{n}")), 300, 533))
            .collect();
        let snapshot = ProjectSnapshot {
            template_id: TemplateId::new("1"),
            layers: LayerSet::create(&layers),
            timestamp: 0,
        };
        let err = ProjectSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap_err();
        assert!(matches!(err, SnapshotError::TooManyLayers { count: 11, cap: 10 }));
    }

    #[test]
    fn rejects_repeated_layer_ids() {
        let layer = TextLayer::new_default(LayerId::intern("twice"), 300, 533);
        let snapshot = ProjectSnapshot {
            template_id: TemplateId::new("1"),
            layers: LayerSet::create(&[layer.clone(), layer]),
            timestamp: 0,
        };
        let err = ProjectSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap_err();
        assert!(matches!(err, SnapshotError::DuplicateLayer(id) if id.as_str() == "twice"));
    }

    #[test]
    fn reads_legacy_layer_key() {
        let json = r##"{
            "templateId": "3",
            "textLayers": [{
                "id": "layer-1", "text": "生日快乐", "x": 150, "y": 200, "fontSize": 28,
                "fontFamily": "Arial", "color": "#ff6b6b", "fontWeight": "bold", "isSelected": true
            }],
            "timestamp": 1700000000000
        }"##;
        let snapshot = ProjectSnapshot::from_json(json).unwrap();
        assert_eq!(snapshot.template_id, TemplateId::new("3"));
        assert_eq!(snapshot.layers.len(), 1);
        let layer = snapshot.layers.get(LayerId::intern("layer-1")).unwrap();
        assert_eq!(layer.text, "生日快乐");
        assert!(layer.visible);
    }
}
