use crate::error::Result;
use crate::events::{CapturedEvent, Disposition, KeyCode, KeyEvent, KeyState, SwitcherIntent};
use crate::services::capture::InputCapture;
use crate::services::keycode_map::KeycodeMap;
use crate::services::permissions::PermissionProbe;
use crate::shortcut::HotkeyBinding;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::state_machine::{HotkeyStateMachine, SwitcherPhase};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotkeyStatus {
    Stopped,
    Running,
    Failed { reason: String },
}

impl fmt::Display for HotkeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotkeyStatus::Stopped => f.write_str("остановлен"),
            HotkeyStatus::Running => f.write_str("работает"),
            HotkeyStatus::Failed { reason } => write!(f, "ошибка: {}", reason),
        }
    }
}

/// Связывает захват клавиатуры с автоматом: применяет решение
/// «поглотить / пробросить» и отдаёт наружу намерения переключателя
pub struct HotkeyService {
    machine: HotkeyStateMachine,
    capture: Box<dyn InputCapture>,
    permissions: Arc<dyn PermissionProbe>,
    status: HotkeyStatus,
    // Клавиши, чьё нажатие поглощено: их повтор и отпускание тоже не должны дойти до системы
    swallowed: HashSet<KeyCode>,
}

impl HotkeyService {
    pub fn new(
        binding: HotkeyBinding,
        capture: Box<dyn InputCapture>,
        permissions: Arc<dyn PermissionProbe>,
    ) -> Self {
        Self {
            machine: HotkeyStateMachine::new(binding),
            capture,
            permissions,
            status: HotkeyStatus::Stopped,
            swallowed: HashSet::new(),
        }
    }

    pub fn status(&self) -> &HotkeyStatus {
        &self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == HotkeyStatus::Running
    }

    pub fn phase(&self) -> SwitcherPhase {
        self.machine.phase()
    }

    pub fn binding(&self) -> HotkeyBinding {
        self.machine.binding()
    }

    /// Без доступа к вводу захват даже не пробуем
    pub fn start(&mut self) -> &HotkeyStatus {
        if self.capture.is_running() {
            return &self.status;
        }

        if !self.permissions.is_trusted() {
            self.fail("нет доступа к устройствам ввода".to_string());
            return &self.status;
        }

        match self.capture.start() {
            Ok(()) => {
                self.machine.reset();
                self.swallowed.clear();
                self.status = HotkeyStatus::Running;
                let binding = self.machine.binding();
                info!(
                    "Горячая клавиша активна: {} + {}",
                    binding.modifier.name(),
                    KeycodeMap::get_key_name(binding.trigger).unwrap_or("?")
                );
            }
            Err(e) => {
                self.fail(e.to_string());
            }
        }
        &self.status
    }

    pub fn stop(&mut self) {
        self.capture.stop();
        self.machine.reset();
        self.swallowed.clear();
        self.status = HotkeyStatus::Stopped;
    }

    pub fn retry(&mut self) -> &HotkeyStatus {
        info!("Повторная попытка запустить горячую клавишу");
        self.stop();
        self.start()
    }

    /// Смена пары атомарна относительно потока событий: захват
    /// останавливается, пара меняется, захват запускается снова
    pub fn configure(&mut self, binding: HotkeyBinding) -> &HotkeyStatus {
        let was_running = self.capture.is_running();
        if was_running {
            self.stop();
        }
        self.machine.reconfigure(binding);
        if was_running {
            self.start();
        }
        &self.status
    }

    pub async fn next_event(&mut self) -> Result<CapturedEvent> {
        self.capture.next_event().await
    }

    /// Классифицировать событие, выполнить решение и вернуть намерение
    pub fn process(&mut self, event: CapturedEvent) -> Option<SwitcherIntent> {
        let transition = self.machine.handle(&event);

        if transition.rearm {
            return self.rearm();
        }

        if let CapturedEvent::Key(key) = &event {
            let result = match transition.disposition {
                Disposition::Pass => self.pass(key),
                Disposition::Swallow => self.swallow(key),
            };
            if let Err(e) = result {
                error!("Не удалось обработать событие {}: {}", key, e);
            }
        }

        transition.intent
    }

    /// Захват умер окончательно: закрыть висящую сессию и перейти в Failed
    pub fn fail(&mut self, reason: String) -> Option<SwitcherIntent> {
        error!("Горячая клавиша недоступна: {}", reason);
        let was_in_session = self.machine.session_active();
        self.capture.stop();
        self.machine.reset();
        self.swallowed.clear();
        self.status = HotkeyStatus::Failed { reason };
        was_in_session.then_some(SwitcherIntent::Cancel)
    }

    fn pass(&mut self, key: &KeyEvent) -> Result<()> {
        if self.swallowed.contains(&key.key_code) {
            if key.state == KeyState::Released {
                self.swallowed.remove(&key.key_code);
            }
            return Ok(());
        }
        self.capture.forward(key)
    }

    fn swallow(&mut self, key: &KeyEvent) -> Result<()> {
        if KeycodeMap::is_modifier(key.key_code) && !key.state.is_down() {
            return self.capture.release_masked(key);
        }
        self.swallowed.insert(key.key_code);
        Ok(())
    }

    fn rearm(&mut self) -> Option<SwitcherIntent> {
        match self.capture.rearm() {
            Ok(()) => {
                warn!("Захват перевооружён после приостановки");
                None
            }
            Err(e) => self.fail(format!("не удалось перевооружить захват: {}", e)),
        }
    }
}
