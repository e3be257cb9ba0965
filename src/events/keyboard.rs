use serde::{Deserialize, Serialize};
use std::fmt;

/// Состояние клавиши
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyState {
    Pressed,
    Released,
    Repeat,
}

impl KeyState {
    /// Значение поля `value` в событии evdev
    pub fn from_evdev_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(KeyState::Released),
            1 => Some(KeyState::Pressed),
            2 => Some(KeyState::Repeat),
            _ => None,
        }
    }

    pub fn evdev_value(self) -> i32 {
        match self {
            KeyState::Released => 0,
            KeyState::Pressed => 1,
            KeyState::Repeat => 2,
        }
    }

    /// Нажатие или автоповтор: для переключателя оба означают key-down
    pub fn is_down(self) -> bool {
        matches!(self, KeyState::Pressed | KeyState::Repeat)
    }
}

/// Код клавиши (evdev коды)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub const ESC: KeyCode = KeyCode(1);
    pub const TAB: KeyCode = KeyCode(15);
    pub const GRAVE: KeyCode = KeyCode(41);

    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KEY_{}", self.0)
    }
}

/// Клавиша-модификатор без различия левой и правой
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierKey {
    Ctrl,
    Alt,
    Shift,
    Super,
}

impl ModifierKey {
    pub fn name(self) -> &'static str {
        match self {
            ModifierKey::Ctrl => "ctrl",
            ModifierKey::Alt => "alt",
            ModifierKey::Shift => "shift",
            ModifierKey::Super => "super",
        }
    }
}

/// Набор зажатых модификаторов в момент события
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub super_key: bool,
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ctrl(mut self, ctrl: bool) -> Self {
        self.ctrl = ctrl;
        self
    }

    pub fn with_alt(mut self, alt: bool) -> Self {
        self.alt = alt;
        self
    }

    pub fn with_shift(mut self, shift: bool) -> Self {
        self.shift = shift;
        self
    }

    pub fn with_super(mut self, super_key: bool) -> Self {
        self.super_key = super_key;
        self
    }

    pub fn contains(&self, modifier: ModifierKey) -> bool {
        match modifier {
            ModifierKey::Ctrl => self.ctrl,
            ModifierKey::Alt => self.alt,
            ModifierKey::Shift => self.shift,
            ModifierKey::Super => self.super_key,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.ctrl && !self.alt && !self.shift && !self.super_key
    }

    pub fn to_vec(&self) -> Vec<&'static str> {
        [
            ModifierKey::Ctrl,
            ModifierKey::Alt,
            ModifierKey::Shift,
            ModifierKey::Super,
        ]
        .into_iter()
        .filter(|m| self.contains(*m))
        .map(ModifierKey::name)
        .collect()
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifiers = self.to_vec();
        if modifiers.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", modifiers.join("+"))
        }
    }
}

/// Событие клавиатуры
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key_code: KeyCode,
    pub state: KeyState,
    /// Модификаторы уже с учётом этого события
    pub modifiers: Modifiers,
    pub timestamp: std::time::Instant,
}

impl KeyEvent {
    pub fn new(key_code: KeyCode, state: KeyState, modifiers: Modifiers) -> Self {
        Self {
            key_code,
            state,
            modifiers,
            timestamp: std::time::Instant::now(),
        }
    }

    /// Получить идентификатор комбинации клавиш для логов
    pub fn combination_id(&self) -> String {
        if self.modifiers.is_empty() {
            format!("{}", self.key_code.value())
        } else {
            format!("{}+{}", self.modifiers, self.key_code.value())
        }
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?} ({}ms)",
            self.combination_id(),
            self.state,
            self.timestamp.elapsed().as_millis()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_creation() {
        let modifiers = Modifiers::new().with_ctrl(true).with_shift(true);

        assert!(modifiers.contains(ModifierKey::Ctrl));
        assert!(modifiers.contains(ModifierKey::Shift));
        assert!(!modifiers.contains(ModifierKey::Alt));
        assert!(!modifiers.contains(ModifierKey::Super));
        assert!(!modifiers.is_empty());
    }

    #[test]
    fn test_modifiers_display() {
        assert_eq!(Modifiers::new().to_string(), "none");
        assert_eq!(Modifiers::new().with_alt(true).with_super(true).to_string(), "alt+super");
    }

    #[test]
    fn test_key_state_from_evdev() {
        assert_eq!(KeyState::from_evdev_value(1), Some(KeyState::Pressed));
        assert_eq!(KeyState::from_evdev_value(2), Some(KeyState::Repeat));
        assert_eq!(KeyState::from_evdev_value(7), None);
        assert!(KeyState::Repeat.is_down());
        assert!(!KeyState::Released.is_down());
    }

    #[test]
    fn test_key_event_combination_id() {
        let plain = KeyEvent::new(KeyCode::TAB, KeyState::Pressed, Modifiers::new());
        let with_alt = KeyEvent::new(KeyCode::TAB, KeyState::Pressed, Modifiers::new().with_alt(true));

        assert_eq!(plain.combination_id(), "15");
        assert_eq!(with_alt.combination_id(), "alt+15");
    }
}
