//! Автомат перехвата горячей клавиши.
//!
//! Получает упорядоченный поток событий захвата и превращает его в
//! намерения переключателя. Состояние: два флага, из четырёх комбинаций
//! достижимы три:
//!
//! | состояние     | modifier_held | session_active |
//! |---------------|---------------|----------------|
//! | Idle          | false         | false          |
//! | ModifierHeld  | true          | false          |
//! | SessionActive | true          | true           |
//!
//! Каждое событие, породившее намерение, поглощается; отпускание
//! модификатора, завершающее сессию, тоже. Всё остальное пробрасывается.

use crate::events::{CapturedEvent, Disposition, KeyCode, KeyEvent, SwitcherIntent};
use crate::services::keycode_map::KeycodeMap;
use crate::shortcut::HotkeyBinding;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitcherPhase {
    Idle,
    ModifierHeld,
    SessionActive,
}

/// Результат классификации одного события
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub disposition: Disposition,
    pub intent: Option<SwitcherIntent>,
    /// Захват нужно перевооружить, состояние автомата не меняется
    pub rearm: bool,
}

impl Transition {
    fn pass() -> Self {
        Self {
            disposition: Disposition::Pass,
            intent: None,
            rearm: false,
        }
    }

    fn emit(intent: SwitcherIntent) -> Self {
        Self {
            disposition: Disposition::Swallow,
            intent: Some(intent),
            rearm: false,
        }
    }

    /// Намерение без поглощения: событие само по себе к сессии не относится
    fn settle(intent: SwitcherIntent) -> Self {
        Self {
            disposition: Disposition::Pass,
            intent: Some(intent),
            rearm: false,
        }
    }

    fn rearm() -> Self {
        Self {
            disposition: Disposition::Pass,
            intent: None,
            rearm: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HotkeyStateMachine {
    binding: HotkeyBinding,
    modifier_held: bool,
    session_active: bool,
}

impl HotkeyStateMachine {
    pub fn new(binding: HotkeyBinding) -> Self {
        Self {
            binding,
            modifier_held: false,
            session_active: false,
        }
    }

    pub fn binding(&self) -> HotkeyBinding {
        self.binding
    }

    /// Заменить пару целиком. Вызывается только при остановленном захвате.
    pub fn reconfigure(&mut self, binding: HotkeyBinding) {
        self.binding = binding;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.modifier_held = false;
        self.session_active = false;
    }

    pub fn modifier_held(&self) -> bool {
        self.modifier_held
    }

    pub fn session_active(&self) -> bool {
        self.session_active
    }

    pub fn phase(&self) -> SwitcherPhase {
        match (self.modifier_held, self.session_active) {
            (_, true) => SwitcherPhase::SessionActive,
            (true, false) => SwitcherPhase::ModifierHeld,
            (false, false) => SwitcherPhase::Idle,
        }
    }

    pub fn handle(&mut self, event: &CapturedEvent) -> Transition {
        let transition = match event {
            CapturedEvent::Suspended => Transition::rearm(),
            CapturedEvent::Key(key) if KeycodeMap::is_modifier(key.key_code) => {
                self.on_flags_changed(key)
            }
            CapturedEvent::Key(key) if key.state.is_down() => self.on_key_down(key),
            CapturedEvent::Key(_) => Transition::pass(),
        };
        debug_assert!(self.modifier_held || !self.session_active);
        transition
    }

    fn on_flags_changed(&mut self, key: &KeyEvent) -> Transition {
        let modifier_down = key.modifiers.contains(self.binding.modifier);

        if modifier_down && !self.modifier_held {
            self.modifier_held = true;
        } else if !modifier_down && self.modifier_held {
            self.modifier_held = false;
            if self.session_active {
                self.session_active = false;
                return Transition::emit(SwitcherIntent::Commit);
            }
        }
        Transition::pass()
    }

    fn on_key_down(&mut self, key: &KeyEvent) -> Transition {
        // Отпускание модификатора могло пропасть вместе со сброшенными
        // событиями: после перевооружения флаги события уже честные
        if self.modifier_held && !key.modifiers.contains(self.binding.modifier) {
            warn!("Модификатор {} отпущен незаметно, сбрасываем состояние", self.binding.modifier.name());
            self.modifier_held = false;
            if self.session_active && key.key_code != KeyCode::ESC {
                self.session_active = false;
                return Transition::settle(SwitcherIntent::Commit);
            }
        }

        if self.modifier_held && key.key_code == self.binding.trigger {
            if !self.session_active {
                self.session_active = true;
                return Transition::emit(SwitcherIntent::Activate);
            }
            return if key.modifiers.shift {
                Transition::emit(SwitcherIntent::CycleBackward)
            } else {
                Transition::emit(SwitcherIntent::CycleForward)
            };
        }

        if key.key_code == KeyCode::ESC && self.session_active {
            self.session_active = false;
            self.modifier_held = false;
            return Transition::emit(SwitcherIntent::Cancel);
        }

        Transition::pass()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{KeyState, Modifiers};
    use crate::shortcut::ShortcutPreset;

    const LEFT_ALT: KeyCode = KeyCode(56);
    const LEFT_CTRL: KeyCode = KeyCode(29);
    const LEFT_SHIFT: KeyCode = KeyCode(42);

    fn machine() -> HotkeyStateMachine {
        HotkeyStateMachine::new(ShortcutPreset::AltTab.binding())
    }

    fn key(code: KeyCode, state: KeyState, modifiers: Modifiers) -> CapturedEvent {
        CapturedEvent::Key(KeyEvent::new(code, state, modifiers))
    }

    fn alt_down() -> CapturedEvent {
        key(LEFT_ALT, KeyState::Pressed, Modifiers::new().with_alt(true))
    }

    fn alt_up() -> CapturedEvent {
        key(LEFT_ALT, KeyState::Released, Modifiers::new())
    }

    fn tab(modifiers: Modifiers) -> CapturedEvent {
        key(KeyCode::TAB, KeyState::Pressed, modifiers)
    }

    fn alt_tab() -> CapturedEvent {
        tab(Modifiers::new().with_alt(true))
    }

    fn escape() -> CapturedEvent {
        key(KeyCode::ESC, KeyState::Pressed, Modifiers::new().with_alt(true))
    }

    #[test]
    fn full_session_emits_activate_cycle_commit() {
        let mut m = machine();

        assert_eq!(m.handle(&alt_down()), Transition::pass());
        assert_eq!(m.phase(), SwitcherPhase::ModifierHeld);

        assert_eq!(m.handle(&alt_tab()), Transition::emit(SwitcherIntent::Activate));
        assert_eq!(m.phase(), SwitcherPhase::SessionActive);

        assert_eq!(m.handle(&alt_tab()), Transition::emit(SwitcherIntent::CycleForward));

        let shifted = tab(Modifiers::new().with_alt(true).with_shift(true));
        assert_eq!(m.handle(&shifted), Transition::emit(SwitcherIntent::CycleBackward));

        assert_eq!(m.handle(&alt_up()), Transition::emit(SwitcherIntent::Commit));
        assert_eq!(m.phase(), SwitcherPhase::Idle);
    }

    #[test]
    fn modifier_release_without_session_passes_through() {
        let mut m = machine();
        m.handle(&alt_down());
        assert_eq!(m.handle(&alt_up()), Transition::pass());
        assert_eq!(m.phase(), SwitcherPhase::Idle);
    }

    #[test]
    fn trigger_without_modifier_is_ignored() {
        let mut m = machine();
        assert_eq!(m.handle(&tab(Modifiers::new())), Transition::pass());
        assert_eq!(m.phase(), SwitcherPhase::Idle);
    }

    #[test]
    fn activate_only_comes_from_modifier_held() {
        for preset in ShortcutPreset::ALL {
            let mut m = HotkeyStateMachine::new(preset.binding());
            let trigger = key(preset.key_code(), KeyState::Pressed, Modifiers::new());
            assert_eq!(m.handle(&trigger).intent, None);
        }
    }

    #[test]
    fn escape_cancels_and_forces_idle() {
        let mut m = machine();
        m.handle(&alt_down());
        m.handle(&alt_tab());

        assert_eq!(m.handle(&escape()), Transition::emit(SwitcherIntent::Cancel));
        assert!(!m.modifier_held());
        assert!(!m.session_active());

        // Отпускание после Esc уже ничего не порождает
        assert_eq!(m.handle(&alt_up()), Transition::pass());
    }

    #[test]
    fn escape_outside_session_passes_through() {
        let mut m = machine();
        m.handle(&alt_down());
        assert_eq!(m.handle(&escape()), Transition::pass());
        assert_eq!(m.phase(), SwitcherPhase::ModifierHeld);
    }

    #[test]
    fn other_modifiers_and_keys_pass_through() {
        let mut m = machine();
        m.handle(&alt_down());
        m.handle(&alt_tab());

        let shift = key(LEFT_SHIFT, KeyState::Pressed, Modifiers::new().with_alt(true).with_shift(true));
        assert_eq!(m.handle(&shift), Transition::pass());
        let letter = key(KeyCode(30), KeyState::Pressed, Modifiers::new().with_alt(true));
        assert_eq!(m.handle(&letter), Transition::pass());
        let ctrl = key(LEFT_CTRL, KeyState::Pressed, Modifiers::new().with_alt(true).with_ctrl(true));
        assert_eq!(m.handle(&ctrl), Transition::pass());
        assert_eq!(m.phase(), SwitcherPhase::SessionActive);
    }

    #[test]
    fn autorepeat_of_trigger_cycles() {
        let mut m = machine();
        m.handle(&alt_down());
        m.handle(&alt_tab());
        let repeat = key(KeyCode::TAB, KeyState::Repeat, Modifiers::new().with_alt(true));
        assert_eq!(m.handle(&repeat).intent, Some(SwitcherIntent::CycleForward));
    }

    #[test]
    fn trigger_release_passes_through() {
        let mut m = machine();
        m.handle(&alt_down());
        m.handle(&alt_tab());
        let release = key(KeyCode::TAB, KeyState::Released, Modifiers::new().with_alt(true));
        assert_eq!(m.handle(&release), Transition::pass());
    }

    #[test]
    fn suspension_rearms_without_touching_state() {
        let mut m = machine();
        m.handle(&alt_down());
        m.handle(&alt_tab());

        let t = m.handle(&CapturedEvent::Suspended);
        assert!(t.rearm);
        assert_eq!(t.intent, None);
        assert_eq!(m.phase(), SwitcherPhase::SessionActive);

        assert_eq!(m.handle(&alt_up()).intent, Some(SwitcherIntent::Commit));
    }

    #[test]
    fn lost_modifier_release_is_reconciled_on_next_key() {
        let mut m = machine();
        m.handle(&alt_down());
        m.handle(&alt_tab());
        m.handle(&CapturedEvent::Suspended);

        // Alt отпустили, пока события терялись: Tab приходит уже без него
        let t = m.handle(&tab(Modifiers::new()));
        assert_eq!(t.intent, Some(SwitcherIntent::Commit));
        assert_eq!(t.disposition, Disposition::Pass);
        assert_eq!(m.phase(), SwitcherPhase::Idle);

        assert_eq!(m.handle(&tab(Modifiers::new())), Transition::pass());
        assert_eq!(m.handle(&alt_up()), Transition::pass());
    }

    #[test]
    fn lost_modifier_release_then_escape_still_cancels() {
        let mut m = machine();
        m.handle(&alt_down());
        m.handle(&alt_tab());

        let esc = key(KeyCode::ESC, KeyState::Pressed, Modifiers::new());
        assert_eq!(m.handle(&esc).intent, Some(SwitcherIntent::Cancel));
        assert_eq!(m.phase(), SwitcherPhase::Idle);
    }

    #[test]
    fn lost_modifier_release_outside_session_just_resets() {
        let mut m = machine();
        m.handle(&alt_down());
        assert_eq!(m.handle(&tab(Modifiers::new())), Transition::pass());
        assert_eq!(m.phase(), SwitcherPhase::Idle);
    }

    #[test]
    fn right_alt_counts_as_the_modifier() {
        let mut m = machine();
        m.handle(&key(KeyCode(100), KeyState::Pressed, Modifiers::new().with_alt(true)));
        assert_eq!(m.handle(&alt_tab()).intent, Some(SwitcherIntent::Activate));
    }

    #[test]
    fn ctrl_preset_ignores_alt() {
        let mut m = HotkeyStateMachine::new(ShortcutPreset::CtrlTab.binding());
        m.handle(&alt_down());
        assert_eq!(m.handle(&alt_tab()).intent, None);

        m.handle(&key(LEFT_CTRL, KeyState::Pressed, Modifiers::new().with_alt(true).with_ctrl(true)));
        assert_eq!(
            m.handle(&tab(Modifiers::new().with_ctrl(true))).intent,
            Some(SwitcherIntent::Activate)
        );
    }

    #[test]
    fn reconfigure_resets_state() {
        let mut m = machine();
        m.handle(&alt_down());
        m.handle(&alt_tab());

        m.reconfigure(ShortcutPreset::AltGrave.binding());
        assert_eq!(m.phase(), SwitcherPhase::Idle);
        assert_eq!(m.binding().trigger, KeyCode::GRAVE);
    }

    #[test]
    fn every_session_ends_with_exactly_one_terminal_intent() {
        let sequences: Vec<Vec<CapturedEvent>> = vec![
            vec![alt_down(), alt_tab(), alt_up(), alt_up()],
            vec![alt_down(), alt_tab(), escape(), alt_up()],
            vec![alt_down(), alt_tab(), alt_tab(), alt_tab(), alt_up()],
            vec![alt_down(), alt_tab(), CapturedEvent::Suspended, alt_up()],
        ];

        for events in sequences {
            let mut m = machine();
            let terminal = events
                .iter()
                .filter_map(|e| m.handle(e).intent)
                .filter(|i| matches!(i, SwitcherIntent::Commit | SwitcherIntent::Cancel))
                .count();
            assert_eq!(terminal, 1);
            assert_eq!(m.phase(), SwitcherPhase::Idle);
        }
    }
}
