use crate::events::{KeyCode, ModifierKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Именованная комбинация «модификатор + клавиша-триггер»
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum ShortcutPreset {
    #[default]
    AltTab,
    CtrlTab,
    AltGrave,
}

/// Пара, по которой автомат классифицирует события
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyBinding {
    pub modifier: ModifierKey,
    pub trigger: KeyCode,
}

impl ShortcutPreset {
    pub const ALL: [ShortcutPreset; 3] = [
        ShortcutPreset::AltTab,
        ShortcutPreset::CtrlTab,
        ShortcutPreset::AltGrave,
    ];

    /// Имя, под которым пресет хранится на диске
    pub fn as_str(self) -> &'static str {
        match self {
            ShortcutPreset::AltTab => "alt_tab",
            ShortcutPreset::CtrlTab => "ctrl_tab",
            ShortcutPreset::AltGrave => "alt_grave",
        }
    }

    /// Неизвестное значение молча превращается в пресет по умолчанию
    pub fn from_stored(raw: Option<&str>) -> Self {
        raw.and_then(|raw| Self::ALL.into_iter().find(|p| p.as_str() == raw))
            .unwrap_or_default()
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ShortcutPreset::AltTab => "Alt + Tab",
            ShortcutPreset::CtrlTab => "Ctrl + Tab",
            ShortcutPreset::AltGrave => "Alt + `",
        }
    }

    pub fn modifier(self) -> ModifierKey {
        match self {
            ShortcutPreset::AltTab | ShortcutPreset::AltGrave => ModifierKey::Alt,
            ShortcutPreset::CtrlTab => ModifierKey::Ctrl,
        }
    }

    pub fn key_code(self) -> KeyCode {
        match self {
            ShortcutPreset::AltTab | ShortcutPreset::CtrlTab => KeyCode::TAB,
            ShortcutPreset::AltGrave => KeyCode::GRAVE,
        }
    }

    pub fn binding(self) -> HotkeyBinding {
        HotkeyBinding {
            modifier: self.modifier(),
            trigger: self.key_code(),
        }
    }
}

impl fmt::Display for ShortcutPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
