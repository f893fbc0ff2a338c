//! Editor and application configuration.

use crate::adapters::SettingsStore;
use crate::export::DEFAULT_EXPORT_CAP;
use crate::history::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};

/// Settings used by an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Output width in pixels.
    pub canvas_width: u32,
    /// Output height in pixels.
    pub canvas_height: u32,
    /// Undo depth; `None` (JSON `null`) keeps every step.
    pub history_depth: Option<usize>,
    /// Recent exports kept.
    pub export_history_cap: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_width: 300,
            canvas_height: 533,
            history_depth: Some(DEFAULT_MAX_DEPTH),
            export_history_cap: DEFAULT_EXPORT_CAP,
        }
    }
}

impl EditorConfig {
    /// Parse a JSON object; absent fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.canvas_width, self.canvas_height)
    }
}

/// Application-level preferences, kept in a [`SettingsStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppPreferences {
    pub dark_mode: bool,
    pub language: String,
    pub window_width: u32,
    pub window_height: u32,
    /// Template the user last worked on.
    pub last_template: Option<String>,
}

impl Default for AppPreferences {
    fn default() -> Self {
        Self {
            dark_mode: false,
            language: "en".to_string(),
            window_width: 880,
            window_height: 680,
            last_template: None,
        }
    }
}

impl AppPreferences {
    pub const KEY: &'static str = "preferences";

    /// Read from `store`, falling back to defaults when absent or malformed.
    pub fn load(store: &dyn SettingsStore) -> Self {
        let Some(value) = store.get(Self::KEY) else {
            return Self::default();
        };
        serde_json::from_value(value).unwrap_or_else(|e| {
            log::warn!("ignoring malformed preferences: {e}");
            Self::default()
        })
    }

    pub fn save(&self, store: &mut dyn SettingsStore) -> bool {
        match serde_json::to_value(self) {
            Ok(value) => store.set(Self::KEY, value),
            Err(e) => {
                log::warn!("could not serialize preferences: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemorySettings;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.canvas_size(), (300, 533));
        assert_eq!(config.history_depth, Some(50));
        assert_eq!(config.export_history_cap, 10);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{ "historyDepth": null, "canvasWidth": 600 }"#).unwrap();
        assert_eq!(config.canvas_width, 600);
        assert_eq!(config.canvas_height, 533);
        assert_eq!(config.history_depth, None);
    }

    #[test]
    fn preferences_roundtrip_through_store() {
        let mut store = MemorySettings::new();
        assert_eq!(AppPreferences::load(&store), AppPreferences::default());

        let prefs = AppPreferences {
            dark_mode: true,
            last_template: Some("3".into()),
            ..AppPreferences::default()
        };
        assert!(prefs.save(&mut store));
        assert_eq!(AppPreferences::load(&store), prefs);
    }

    #[test]
    fn malformed_preferences_fall_back() {
        let mut store = MemorySettings::new();
        store.set(AppPreferences::KEY, json!({ "darkMode": "yes please" }));
        assert_eq!(AppPreferences::load(&store), AppPreferences::default());
    }
}
