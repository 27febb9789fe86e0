//! Designer key bindings.
//!
//! A fixed table of chords. `cmd` is ctrl, or ⌘ (`meta`) on macOS; alt
//! never takes part in a binding.

/// Editing actions reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Undo,
    Redo,
    Copy,
    Cut,
    Paste,
    Delete,
    /// Select the project root widget.
    SelectAll,
    /// Cycle through the adorners applicable to the selection.
    NextAdorner,
    Deselect,
}

#[derive(Debug, Clone, Copy)]
struct Chord {
    key: &'static str,
    cmd: bool,
    shift: bool,
    action: ShortcutAction,
}

const fn cmd(key: &'static str, action: ShortcutAction) -> Chord {
    Chord {
        key,
        cmd: true,
        shift: false,
        action,
    }
}

const fn plain(key: &'static str, action: ShortcutAction) -> Chord {
    Chord {
        key,
        cmd: false,
        shift: false,
        action,
    }
}

const CHORDS: &[Chord] = &[
    cmd("z", ShortcutAction::Undo),
    Chord {
        key: "z",
        cmd: true,
        shift: true,
        action: ShortcutAction::Redo,
    },
    cmd("y", ShortcutAction::Redo),
    cmd("a", ShortcutAction::SelectAll),
    cmd("c", ShortcutAction::Copy),
    cmd("x", ShortcutAction::Cut),
    cmd("v", ShortcutAction::Paste),
    plain("Tab", ShortcutAction::NextAdorner),
    plain("Delete", ShortcutAction::Delete),
    plain("Backspace", ShortcutAction::Delete),
    plain("Escape", ShortcutAction::Deselect),
];

pub struct ShortcutMap;

impl ShortcutMap {
    /// Action bound to a host key event, if any. Letter keys match in
    /// either case.
    pub fn resolve(key: &str, ctrl: bool, shift: bool, _alt: bool, meta: bool) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;
        CHORDS
            .iter()
            .find(|c| c.cmd == cmd && c.shift == shift && c.key.eq_ignore_ascii_case(key))
            .map(|c| c.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(key: &str, ctrl: bool, shift: bool, meta: bool) -> Option<ShortcutAction> {
        ShortcutMap::resolve(key, ctrl, shift, false, meta)
    }

    #[test]
    fn ctrl_and_meta_are_interchangeable() {
        assert_eq!(press("z", true, false, false), Some(ShortcutAction::Undo));
        assert_eq!(press("z", false, false, true), Some(ShortcutAction::Undo));
        assert_eq!(press("V", false, false, true), Some(ShortcutAction::Paste));
    }

    #[test]
    fn shift_turns_undo_into_redo() {
        assert_eq!(press("Z", true, true, false), Some(ShortcutAction::Redo));
        assert_eq!(press("y", true, false, false), Some(ShortcutAction::Redo));
    }

    #[test]
    fn unmodified_keys() {
        assert_eq!(press("Delete", false, false, false), Some(ShortcutAction::Delete));
        assert_eq!(press("Backspace", false, false, false), Some(ShortcutAction::Delete));
        assert_eq!(press("Tab", false, false, false), Some(ShortcutAction::NextAdorner));
        assert_eq!(press("Escape", false, false, false), Some(ShortcutAction::Deselect));
        assert_eq!(press("c", false, false, false), None);
        assert_eq!(press("Tab", false, true, false), None);
        assert_eq!(press("Delete", true, false, false), None);
    }
}
