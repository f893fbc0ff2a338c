use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for layer IDs.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Identifier of a text layer, stable for the layer's lifetime.
/// Interned: 4 bytes, Copy, Eq, Hash in O(1).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(Spur);

impl LayerId {
    /// Intern a string as a LayerId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        LayerId(INTERNER.get_or_intern(s))
    }

    /// Look up an already-interned ID without adding `s` to the interner.
    pub fn get(s: &str) -> Option<Self> {
        INTERNER.get(s).map(LayerId)
    }

    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Generate a fresh ID with a prefix (e.g. `layer_3`).
    ///
    /// Skips candidates that were already interned, so a generated ID never
    /// collides with one that came from a template or a saved project.
    pub fn with_prefix(prefix: &str) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        loop {
            let n = COUNTER.fetch_add(1, Ordering::Relaxed);
            let candidate = format!("{prefix}_{n}");
            if INTERNER.get(&candidate).is_none() {
                return Self::intern(&candidate);
            }
        }
    }
}

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LayerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LayerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(LayerId::intern(&s))
    }
}

/// Identifier of a template in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TemplateId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = LayerId::intern("layer-1");
        let b = LayerId::intern("layer-1");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "layer-1");
    }

    #[test]
    fn get_does_not_intern() {
        assert_eq!(LayerId::get("lookup-only-never-interned"), None);
        assert_eq!(LayerId::get("lookup-only-never-interned"), None);
        let id = LayerId::intern("lookup-known");
        assert_eq!(LayerId::get("lookup-known"), Some(id));
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = LayerId::with_prefix("layer");
        let b = LayerId::with_prefix("layer");
        assert_ne!(a, b);
    }

    #[test]
    fn generated_ids_skip_existing() {
        // Pre-intern a large block so the generator has to skip past it.
        let taken: Vec<LayerId> = (0..64)
            .map(|n| LayerId::intern(&format!("taken_{n}")))
            .collect();
        let fresh = LayerId::with_prefix("taken");
        assert!(!taken.contains(&fresh));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = LayerId::intern("caption");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"caption\"");
        let back: LayerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
