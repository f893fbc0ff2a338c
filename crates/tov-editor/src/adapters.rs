//! Boundaries to the host platform: saving files, picking files, and
//! app-level settings. Editor state never goes through these.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Hands encoded bytes to the platform. `false` means cancelled or failed;
/// callers cannot tell the two apart.
pub trait PersistenceAdapter {
    fn save_bytes(&mut self, bytes: &[u8], suggested_name: &str) -> bool;
}

/// Asks the user for a file. Cancel yields `None`.
pub trait FilePicker {
    fn pick_file(&mut self) -> Option<String>;
}

/// Key/value preferences store.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value) -> bool;
}

// ─── Persistence ─────────────────────────────────────────────────────────

/// Writes each blob into a directory under its suggested name.
#[derive(Debug, Clone)]
pub struct DirectoryPersistence {
    dir: PathBuf,
    last_saved: Option<PathBuf>,
}

impl DirectoryPersistence {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            last_saved: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the most recent successful save.
    pub fn last_saved(&self) -> Option<&Path> {
        self.last_saved.as_deref()
    }
}

impl PersistenceAdapter for DirectoryPersistence {
    fn save_bytes(&mut self, bytes: &[u8], suggested_name: &str) -> bool {
        // Only the final component of the suggestion is honoured.
        let Some(name) = Path::new(suggested_name).file_name() else {
            log::warn!("refusing to save under {suggested_name:?}");
            return false;
        };
        let path = self.dir.join(name);
        let result = std::fs::create_dir_all(&self.dir).and_then(|()| std::fs::write(&path, bytes));
        match result {
            Ok(()) => {
                log::info!("saved {} bytes to {}", bytes.len(), path.display());
                self.last_saved = Some(path);
                true
            }
            Err(e) => {
                log::warn!("could not save {}: {e}", path.display());
                false
            }
        }
    }
}

/// Keeps saved blobs in memory; can be told to refuse every save.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    pub saved: Vec<(String, Vec<u8>)>,
    refuse: bool,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// An adapter whose every save reports `false`, like a cancelled dialog.
    pub fn refusing() -> Self {
        Self {
            saved: Vec::new(),
            refuse: true,
        }
    }
}

impl PersistenceAdapter for MemoryPersistence {
    fn save_bytes(&mut self, bytes: &[u8], suggested_name: &str) -> bool {
        if self.refuse {
            return false;
        }
        self.saved.push((suggested_name.to_string(), bytes.to_vec()));
        true
    }
}

// ─── File picking ────────────────────────────────────────────────────────

/// Answers every prompt with the same pre-seeded choice.
#[derive(Debug, Clone, Default)]
pub struct FixedPicker(pub Option<String>);

impl FixedPicker {
    pub fn new(choice: impl Into<String>) -> Self {
        Self(Some(choice.into()))
    }

    pub fn cancelled() -> Self {
        Self(None)
    }
}

impl FilePicker for FixedPicker {
    fn pick_file(&mut self) -> Option<String> {
        self.0.clone()
    }
}

// ─── Settings ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    values: Map<String, Value>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> bool {
        self.values.insert(key.to_string(), value);
        true
    }
}

/// Settings persisted as one JSON object file, rewritten on every `set`.
#[derive(Debug, Clone)]
pub struct JsonFileSettings {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonFileSettings {
    /// Load `path`. A missing file starts empty; a malformed one is logged
    /// and also starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    log::warn!("settings file {} is not a JSON object, ignoring", path.display());
                    Map::new()
                }
                Err(e) => {
                    log::warn!("settings file {} is malformed: {e}", path.display());
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                log::warn!("could not read settings file {}: {e}", path.display());
                Map::new()
            }
        };
        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> bool {
        let text = match serde_json::to_string_pretty(&self.values) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("could not serialize settings: {e}");
                return false;
            }
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            log::warn!("could not create {}: {e}", parent.display());
            return false;
        }
        match std::fs::write(&self.path, text) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("could not write settings file {}: {e}", self.path.display());
                false
            }
        }
    }
}

impl SettingsStore for JsonFileSettings {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> bool {
        self.values.insert(key.to_string(), value);
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn directory_persistence_writes_file() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("exports");
        let mut adapter = DirectoryPersistence::new(&dir);
        assert!(adapter.save_bytes(b"png", "overlay_1.png"));
        assert_eq!(std::fs::read(dir.join("overlay_1.png")).unwrap(), b"png");
        assert_eq!(adapter.last_saved(), Some(dir.join("overlay_1.png").as_path()));
    }

    #[test]
    fn directory_persistence_strips_directories_from_names() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().to_path_buf();
        let mut adapter = DirectoryPersistence::new(&dir);
        assert!(adapter.save_bytes(b"x", "../../escape.png"));
        assert!(dir.join("escape.png").exists());
        assert!(!adapter.save_bytes(b"x", ".."));
    }

    #[test]
    fn memory_persistence_can_refuse() {
        let mut ok = MemoryPersistence::new();
        assert!(ok.save_bytes(b"a", "a.png"));
        assert_eq!(ok.saved.len(), 1);
        let mut refusing = MemoryPersistence::refusing();
        assert!(!refusing.save_bytes(b"a", "a.png"));
        assert!(refusing.saved.is_empty());
    }

    #[test]
    fn fixed_picker_answers() {
        assert_eq!(FixedPicker::new("bg.png").pick_file().as_deref(), Some("bg.png"));
        assert_eq!(FixedPicker::cancelled().pick_file(), None);
    }

    #[test]
    fn json_file_settings_persist_across_opens() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("settings.json");
        let mut settings = JsonFileSettings::open(&path);
        assert_eq!(settings.get("preferences"), None);
        assert!(settings.set("preferences", json!({ "darkMode": true })));

        let reopened = JsonFileSettings::open(&path);
        assert_eq!(reopened.get("preferences"), Some(json!({ "darkMode": true })));
    }

    #[test]
    fn malformed_settings_start_empty() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(JsonFileSettings::open(&path).get("anything"), None);
    }
}
