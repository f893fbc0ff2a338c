//! Interactive editing over the layer model: one session owns the working
//! layer set, its undo history, and the outstanding background load.

pub mod adapters;
pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod notice;
pub mod session;
pub mod shortcuts;

pub use adapters::{FilePicker, PersistenceAdapter, SettingsStore};
pub use config::{AppPreferences, EditorConfig};
pub use error::{ExportError, HistoryError};
pub use export::{ExportHistory, ExportRecord};
pub use history::HistoryManager;
pub use notice::{Notice, NoticeLevel};
pub use session::{BackgroundRequest, EditingSession};
pub use shortcuts::{ShortcutAction, ShortcutMap};
