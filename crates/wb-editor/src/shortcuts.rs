//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `EditorAction`s. Resolution is
//! platform-aware: `ctrl` and `meta` (⌘) both act as the command key.

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    /// Delete the selected component or frame (frame deletes cascade).
    DeleteSelected,
    /// Cancel frame drawing, or clear the selection when idle.
    Cancel,
    Undo,
    Redo,
    Duplicate,
    ZoomIn,
    ZoomOut,
    ResetZoom,
    BringForward,
    SendBackward,
    /// Arm the canvas for rubber-band frame drawing.
    ArmFrameDraw,
}

pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action. `key` follows the
    /// `KeyboardEvent.key` convention. Returns `None` for unbound combos.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<EditorAction> {
        let cmd = modifiers.command();

        if cmd && modifiers.shift {
            return match key {
                "z" | "Z" => Some(EditorAction::Redo),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(EditorAction::Undo),
                "y" | "Y" => Some(EditorAction::Redo),
                "d" | "D" => Some(EditorAction::Duplicate),
                "=" | "+" => Some(EditorAction::ZoomIn),
                "-" => Some(EditorAction::ZoomOut),
                "0" => Some(EditorAction::ResetZoom),
                "]" => Some(EditorAction::BringForward),
                "[" => Some(EditorAction::SendBackward),
                _ => None,
            };
        }

        match key {
            "Delete" | "Backspace" => Some(EditorAction::DeleteSelected),
            "Escape" => Some(EditorAction::Cancel),
            "f" | "F" => Some(EditorAction::ArmFrameDraw),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: Modifiers = Modifiers::NONE;

    fn cmd() -> Modifiers {
        Modifiers {
            meta: true,
            ..NONE
        }
    }

    #[test]
    fn delete_keys_resolve() {
        assert_eq!(
            ShortcutMap::resolve("Delete", NONE),
            Some(EditorAction::DeleteSelected)
        );
        assert_eq!(
            ShortcutMap::resolve("Backspace", NONE),
            Some(EditorAction::DeleteSelected)
        );
    }

    #[test]
    fn escape_cancels() {
        assert_eq!(ShortcutMap::resolve("Escape", NONE), Some(EditorAction::Cancel));
    }

    #[test]
    fn undo_redo_both_command_keys() {
        assert_eq!(ShortcutMap::resolve("z", cmd()), Some(EditorAction::Undo));
        let ctrl = Modifiers {
            ctrl: true,
            ..NONE
        };
        assert_eq!(ShortcutMap::resolve("z", ctrl), Some(EditorAction::Undo));
        let cmd_shift = Modifiers {
            meta: true,
            shift: true,
            ..NONE
        };
        assert_eq!(ShortcutMap::resolve("z", cmd_shift), Some(EditorAction::Redo));
        assert_eq!(ShortcutMap::resolve("y", cmd()), Some(EditorAction::Redo));
    }

    #[test]
    fn zoom_bindings() {
        assert_eq!(ShortcutMap::resolve("=", cmd()), Some(EditorAction::ZoomIn));
        assert_eq!(ShortcutMap::resolve("-", cmd()), Some(EditorAction::ZoomOut));
        assert_eq!(ShortcutMap::resolve("0", cmd()), Some(EditorAction::ResetZoom));
    }

    #[test]
    fn z_order_bindings() {
        assert_eq!(ShortcutMap::resolve("]", cmd()), Some(EditorAction::BringForward));
        assert_eq!(ShortcutMap::resolve("[", cmd()), Some(EditorAction::SendBackward));
    }

    #[test]
    fn unbound_keys_resolve_to_none() {
        assert_eq!(ShortcutMap::resolve("q", NONE), None);
        assert_eq!(ShortcutMap::resolve("z", NONE), None);
    }
}
