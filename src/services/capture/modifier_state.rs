use crate::events::{KeyCode, KeyState, Modifiers};

/// Отслеживает зажатые модификаторы по отдельности для левой и правой клавиши,
/// чтобы отпускание правого Alt не сбрасывало зажатый левый.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ModifierState {
    left_ctrl: bool,
    right_ctrl: bool,
    left_alt: bool,
    right_alt: bool,
    left_shift: bool,
    right_shift: bool,
    left_meta: bool,
    right_meta: bool,
}

impl ModifierState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_modifiers(&self) -> Modifiers {
        Modifiers {
            ctrl: self.left_ctrl || self.right_ctrl,
            alt: self.left_alt || self.right_alt,
            shift: self.left_shift || self.right_shift,
            super_key: self.left_meta || self.right_meta,
        }
    }

    /// Применить событие клавиши; возвращает true, если это был модификатор
    pub fn update_key(&mut self, key: KeyCode, state: KeyState) -> bool {
        let pressed = state.is_down();
        let slot = match key.value() {
            29 => &mut self.left_ctrl,
            97 => &mut self.right_ctrl,
            56 => &mut self.left_alt,
            100 => &mut self.right_alt,
            42 => &mut self.left_shift,
            54 => &mut self.right_shift,
            125 => &mut self.left_meta,
            126 => &mut self.right_meta,
            _ => return false,
        };
        *slot = pressed;
        true
    }

    /// Пересобрать состояние из списка реально зажатых клавиш (после SYN_DROPPED)
    pub fn resync<I>(&mut self, pressed: I)
    where
        I: IntoIterator<Item = KeyCode>,
    {
        *self = Self::default();
        for key in pressed {
            self.update_key(key, KeyState::Pressed);
        }
    }

    /// Коды модификаторов, которые сейчас зажаты
    pub fn pressed_keys(&self) -> Vec<KeyCode> {
        [
            (self.left_ctrl, 29),
            (self.right_ctrl, 97),
            (self.left_alt, 56),
            (self.right_alt, 100),
            (self.left_shift, 42),
            (self.right_shift, 54),
            (self.left_meta, 125),
            (self.right_meta, 126),
        ]
        .into_iter()
        .filter(|(held, _)| *held)
        .map(|(_, code)| KeyCode(code))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_and_right_are_tracked_separately() {
        let mut state = ModifierState::new();
        state.update_key(KeyCode(56), KeyState::Pressed);
        state.update_key(KeyCode(100), KeyState::Pressed);
        state.update_key(KeyCode(100), KeyState::Released);

        assert!(state.to_modifiers().alt);

        state.update_key(KeyCode(56), KeyState::Released);
        assert!(!state.to_modifiers().alt);
    }

    #[test]
    fn non_modifier_keys_are_ignored() {
        let mut state = ModifierState::new();
        assert!(!state.update_key(KeyCode::TAB, KeyState::Pressed));
        assert!(state.to_modifiers().is_empty());
    }

    #[test]
    fn resync_replaces_previous_state() {
        let mut state = ModifierState::new();
        state.update_key(KeyCode(29), KeyState::Pressed);
        state.resync([KeyCode(42), KeyCode::TAB]);

        let modifiers = state.to_modifiers();
        assert!(!modifiers.ctrl);
        assert!(modifiers.shift);
        assert_eq!(state.pressed_keys(), vec![KeyCode(42)]);
    }
}
