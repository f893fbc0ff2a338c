//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s, shared by the
//! WASM and native hosts.

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Undo,
    Redo,
    /// Delete the selected layer.
    Delete,
    /// Save the project.
    Save,
    Export,
    Deselect,
    AddLayer,
}

/// Resolves key events into shortcut actions.
///
/// Platform-aware: on macOS `meta` is ⌘, elsewhere `ctrl` plays that role.
/// Text inputs should not forward plain Delete/Backspace here.
pub struct ShortcutMap;

impl ShortcutMap {
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    pub fn resolve(key: &str, ctrl: bool, shift: bool, _alt: bool, meta: bool) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "s" | "S" => Some(ShortcutAction::Save),
                "e" | "E" => Some(ShortcutAction::Export),
                "Enter" => Some(ShortcutAction::AddLayer),
                _ => None,
            };
        }

        if shift {
            return None;
        }

        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Deselect),
            _ => None,
        }
    }
}
