use std::collections::HashMap;
use std::path::Path;

use serde::{Serialize, Deserialize};
use winit::keyboard::KeyCode;

use crate::input::InputState;

/// Modifier keys for a keybinding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self { ctrl: false, shift: false, alt: false };
    pub const CTRL: Self = Self { ctrl: true, shift: false, alt: false };
    pub const CTRL_SHIFT: Self = Self { ctrl: true, shift: true, alt: false };
}

impl std::fmt::Display for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.ctrl { write!(f, "Ctrl+")?; }
        if self.shift { write!(f, "Shift+")?; }
        if self.alt { write!(f, "Alt+")?; }
        Ok(())
    }
}

/// A key combination: modifiers + key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyCombo {
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(with = "keycode_serde")]
    pub key: KeyCode,
}

impl KeyCombo {
    const fn plain(key: KeyCode) -> Self {
        Self { modifiers: Modifiers::NONE, key }
    }

    const fn ctrl(key: KeyCode) -> Self {
        Self { modifiers: Modifiers::CTRL, key }
    }
}

mod keycode_serde {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(key: &KeyCode, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(key_name(*key))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<KeyCode, D::Error> {
        let name = String::deserialize(d)?;
        key_from_name(&name).ok_or_else(|| serde::de::Error::custom(format!("unknown key: {name}")))
    }
}

impl std::fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.modifiers, key_name(self.key))
    }
}

/// All bindable actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Undo,
    Redo,
    SaveProject,
    SaveRoomFile,
    OpenRoomFile,
    Snapshot,
    ToggleGrid,
    Deselect,
    Delete,
    Duplicate,
    CycleFloor,
    GizmoTranslate,
    GizmoRotate,
    GizmoScale,
}

/// All actions with their display names, for the editor UI.
pub const ALL_ACTIONS: &[(Action, &str)] = &[
    (Action::Undo, "Undo"),
    (Action::Redo, "Redo"),
    (Action::SaveProject, "Save Project"),
    (Action::SaveRoomFile, "Save Room File"),
    (Action::OpenRoomFile, "Open Room File"),
    (Action::Snapshot, "Viewport Snapshot"),
    (Action::ToggleGrid, "Toggle Grid"),
    (Action::Deselect, "Deselect"),
    (Action::Delete, "Delete Item"),
    (Action::Duplicate, "Duplicate Item"),
    (Action::CycleFloor, "Cycle Floor Material"),
    (Action::GizmoTranslate, "Gizmo: Move"),
    (Action::GizmoRotate, "Gizmo: Rotate"),
    (Action::GizmoScale, "Gizmo: Scale"),
];

/// Keybinding configuration.
pub struct Keybindings {
    pub bindings: HashMap<Action, KeyCombo>,
}

impl Keybindings {
    pub fn defaults() -> Self {
        let bindings = HashMap::from([
            (Action::Undo, KeyCombo::ctrl(KeyCode::KeyZ)),
            (Action::Redo, KeyCombo::ctrl(KeyCode::KeyY)),
            (Action::SaveProject, KeyCombo::ctrl(KeyCode::KeyS)),
            (Action::SaveRoomFile, KeyCombo { modifiers: Modifiers::CTRL_SHIFT, key: KeyCode::KeyS }),
            (Action::OpenRoomFile, KeyCombo::ctrl(KeyCode::KeyO)),
            (Action::Snapshot, KeyCombo::plain(KeyCode::F12)),
            (Action::ToggleGrid, KeyCombo::plain(KeyCode::KeyG)),
            (Action::Deselect, KeyCombo::plain(KeyCode::Escape)),
            (Action::Delete, KeyCombo::plain(KeyCode::Delete)),
            (Action::Duplicate, KeyCombo::ctrl(KeyCode::KeyD)),
            (Action::CycleFloor, KeyCombo::plain(KeyCode::KeyF)),
            (Action::GizmoTranslate, KeyCombo::plain(KeyCode::KeyW)),
            (Action::GizmoRotate, KeyCombo::plain(KeyCode::KeyE)),
            (Action::GizmoScale, KeyCombo::plain(KeyCode::KeyR)),
        ]);
        Self { bindings }
    }

    /// Check if an action's keybinding is triggered given the current input state.
    pub fn is_triggered(&self, action: Action, input: &InputState) -> bool {
        let Some(combo) = self.bindings.get(&action) else { return false };
        input.key_just_pressed(combo.key) && input.modifiers() == combo.modifiers
    }

    /// Get the display string for an action's keybinding.
    pub fn display(&self, action: Action) -> String {
        self.bindings.get(&action).map_or_else(
            || "Unbound".to_string(),
            |c| c.to_string(),
        )
    }

    /// Load keybindings from config file. Actions missing from the file keep their defaults.
    pub fn load() -> Self {
        Self::load_from(&crate::settings::config_dir().join("keybindings.json"))
    }

    pub fn load_from(path: &Path) -> Self {
        let mut keys = Self::defaults();
        let Ok(data) = std::fs::read_to_string(path) else {
            return keys;
        };
        match serde_json::from_str::<HashMap<Action, KeyCombo>>(&data) {
            Ok(custom) => keys.bindings.extend(custom),
            Err(e) => log::warn!("ignoring malformed {}: {e}", path.display()),
        }
        keys
    }

    /// Save keybindings to config file.
    pub fn save(&self) {
        let path = crate::settings::config_dir().join("keybindings.json");
        let result = path
            .parent()
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|_| serde_json::to_string_pretty(&self.bindings).map_err(std::io::Error::other))
            .and_then(|data| std::fs::write(&path, data));
        if let Err(e) = result {
            log::error!("could not save keybindings: {e}");
        }
    }
}

const KEY_NAMES: &[(KeyCode, &str)] = &[
    (KeyCode::KeyA, "A"), (KeyCode::KeyB, "B"), (KeyCode::KeyC, "C"), (KeyCode::KeyD, "D"),
    (KeyCode::KeyE, "E"), (KeyCode::KeyF, "F"), (KeyCode::KeyG, "G"), (KeyCode::KeyH, "H"),
    (KeyCode::KeyI, "I"), (KeyCode::KeyJ, "J"), (KeyCode::KeyK, "K"), (KeyCode::KeyL, "L"),
    (KeyCode::KeyM, "M"), (KeyCode::KeyN, "N"), (KeyCode::KeyO, "O"), (KeyCode::KeyP, "P"),
    (KeyCode::KeyQ, "Q"), (KeyCode::KeyR, "R"), (KeyCode::KeyS, "S"), (KeyCode::KeyT, "T"),
    (KeyCode::KeyU, "U"), (KeyCode::KeyV, "V"), (KeyCode::KeyW, "W"), (KeyCode::KeyX, "X"),
    (KeyCode::KeyY, "Y"), (KeyCode::KeyZ, "Z"),
    (KeyCode::Digit0, "0"), (KeyCode::Digit1, "1"), (KeyCode::Digit2, "2"), (KeyCode::Digit3, "3"),
    (KeyCode::Digit4, "4"), (KeyCode::Digit5, "5"), (KeyCode::Digit6, "6"), (KeyCode::Digit7, "7"),
    (KeyCode::Digit8, "8"), (KeyCode::Digit9, "9"),
    (KeyCode::F1, "F1"), (KeyCode::F2, "F2"), (KeyCode::F3, "F3"), (KeyCode::F4, "F4"),
    (KeyCode::F5, "F5"), (KeyCode::F6, "F6"), (KeyCode::F7, "F7"), (KeyCode::F8, "F8"),
    (KeyCode::F9, "F9"), (KeyCode::F10, "F10"), (KeyCode::F11, "F11"), (KeyCode::F12, "F12"),
    (KeyCode::Tab, "Tab"),
    (KeyCode::Delete, "Delete"),
    (KeyCode::Backspace, "Backspace"),
    (KeyCode::Enter, "Enter"),
    (KeyCode::Escape, "Escape"),
    (KeyCode::Space, "Space"),
];

/// Display name for a key code.
fn key_name(key: KeyCode) -> &'static str {
    KEY_NAMES.iter().find(|(k, _)| *k == key).map_or("?", |(_, n)| *n)
}

/// Reverse lookup: display name → KeyCode.
fn key_from_name(name: &str) -> Option<KeyCode> {
    KEY_NAMES.iter().find(|(_, n)| n.eq_ignore_ascii_case(name)).map(|(k, _)| *k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_action_has_a_distinct_default() {
        let keys = Keybindings::defaults();
        let mut seen = HashSet::new();
        for (action, _) in ALL_ACTIONS {
            let combo = keys.bindings.get(action).copied();
            assert!(combo.is_some(), "{action:?} unbound");
            assert!(seen.insert(combo), "{action:?} shares a key");
        }
    }

    #[test]
    fn display_strings() {
        let keys = Keybindings::defaults();
        assert_eq!(keys.display(Action::Duplicate), "Ctrl+D");
        assert_eq!(keys.display(Action::SaveRoomFile), "Ctrl+Shift+S");
        assert_eq!(keys.display(Action::GizmoRotate), "E");
    }

    #[test]
    fn file_overrides_merge_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keybindings.json");
        std::fs::write(&path, r#"{"GizmoTranslate": {"key": "t"}}"#).unwrap();
        let keys = Keybindings::load_from(&path);
        assert_eq!(keys.bindings[&Action::GizmoTranslate], KeyCombo::plain(KeyCode::KeyT));
        assert_eq!(keys.bindings[&Action::Undo], KeyCombo::ctrl(KeyCode::KeyZ));
    }

    #[test]
    fn unknown_key_name_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keybindings.json");
        std::fs::write(&path, r#"{"Undo": {"key": "Hyper"}}"#).unwrap();
        let keys = Keybindings::load_from(&path);
        assert_eq!(keys.bindings[&Action::Undo], KeyCombo::ctrl(KeyCode::KeyZ));
    }
}
