pub mod color;
pub mod error;
pub mod id;
pub mod layer;
pub mod layer_set;
pub mod project;
pub mod template;

pub use color::Color;
pub use error::{CatalogError, LayerError, SnapshotError};
pub use id::{LayerId, TemplateId};
pub use layer::{FontWeight, LayerPatch, Placement, Position, TextLayer};
pub use layer_set::{LayerSet, MAX_LAYERS};
pub use project::ProjectSnapshot;
pub use template::{Template, TemplateCatalog};
