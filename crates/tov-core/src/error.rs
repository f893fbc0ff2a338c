use crate::id::LayerId;
use thiserror::Error;

/// Rejections from [`LayerSet`](crate::LayerSet) mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerError {
    #[error("a frame holds at most {cap} text layers")]
    CapacityExceeded { cap: usize },

    #[error("layer id `{0}` is already in use")]
    DuplicateId(LayerId),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid template catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("template id `{0}` is defined twice")]
    DuplicateTemplate(String),

    #[error("template `{template}` seeds duplicate layer id `{layer}`")]
    DuplicateLayer { template: String, layer: LayerId },

    #[error("template `{template}` seeds {count} layers (at most {cap} allowed)")]
    TooManyLayers {
        template: String,
        count: usize,
        cap: usize,
    },

    #[error("template catalog is empty")]
    Empty,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("invalid project snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("project snapshot holds {count} layers (at most {cap} allowed)")]
    TooManyLayers { count: usize, cap: usize },

    #[error("project snapshot repeats layer id `{0}`")]
    DuplicateLayer(LayerId),
}
