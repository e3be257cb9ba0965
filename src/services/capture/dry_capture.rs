use crate::error::{HopError, Result};
use crate::events::{CapturedEvent, KeyCode, KeyEvent, KeyState, Modifiers, VirtualKeyEvent};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::r#trait::InputCapture;

const LEFT_ALT: KeyCode = KeyCode(56);

/// Что захват отправил бы в систему вместо реальной клавиатуры
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emitted {
    Forwarded(VirtualKeyEvent),
    Masked(KeyCode),
}

/// Захват без устройства: проигрывает заранее заданный сценарий
pub struct DryRunCapture {
    script: Vec<(Duration, CapturedEvent)>,
    pending: VecDeque<(Duration, CapturedEvent)>,
    repeat: bool,
    running: bool,
    fail_start: bool,
    emitted: Arc<Mutex<Vec<Emitted>>>,
    rearms: Arc<Mutex<usize>>,
}

impl DryRunCapture {
    pub fn new(script: Vec<(Duration, CapturedEvent)>, repeat: bool) -> Self {
        Self {
            script,
            pending: VecDeque::new(),
            repeat,
            running: false,
            fail_start: false,
            emitted: Arc::new(Mutex::new(Vec::new())),
            rearms: Arc::new(Mutex::new(0)),
        }
    }

    /// Alt+Tab, ещё Tab, отпустить Alt: раз в несколько секунд
    pub fn demo() -> Self {
        let step = Duration::from_millis(400);
        let alt = Modifiers::new().with_alt(true);
        let script = vec![
            (Duration::from_secs(3), Self::key(LEFT_ALT, KeyState::Pressed, alt)),
            (step, Self::key(KeyCode::TAB, KeyState::Pressed, alt)),
            (Duration::ZERO, Self::key(KeyCode::TAB, KeyState::Released, alt)),
            (step, Self::key(KeyCode::TAB, KeyState::Pressed, alt)),
            (Duration::ZERO, Self::key(KeyCode::TAB, KeyState::Released, alt)),
            (step, Self::key(LEFT_ALT, KeyState::Released, Modifiers::new())),
        ];
        Self::new(script, true)
    }

    /// Сценарий без пауз, проигрывается один раз
    pub fn scripted(events: Vec<CapturedEvent>) -> Self {
        Self::new(events.into_iter().map(|e| (Duration::ZERO, e)).collect(), false)
    }

    /// Каждый start() будет завершаться ошибкой прав доступа
    pub fn failing() -> Self {
        let mut capture = Self::new(Vec::new(), false);
        capture.fail_start = true;
        capture
    }

    pub fn key(code: KeyCode, state: KeyState, modifiers: Modifiers) -> CapturedEvent {
        CapturedEvent::Key(KeyEvent::new(code, state, modifiers))
    }

    pub fn emitted(&self) -> Arc<Mutex<Vec<Emitted>>> {
        self.emitted.clone()
    }

    pub fn rearm_counter(&self) -> Arc<Mutex<usize>> {
        self.rearms.clone()
    }
}

#[async_trait::async_trait]
impl InputCapture for DryRunCapture {
    fn start(&mut self) -> Result<()> {
        if self.fail_start {
            return Err(HopError::Permission("[DRY RUN] захват запрещён сценарием".to_string()));
        }
        info!("[DRY RUN] Захват клавиатуры эмулируется, {} событий в сценарии", self.script.len());
        self.pending = self.script.iter().cloned().collect();
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        if self.running {
            info!("[DRY RUN] Захват клавиатуры остановлен");
        }
        self.running = false;
        self.pending.clear();
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn rearm(&mut self) -> Result<()> {
        *self.rearms.lock() += 1;
        debug!("[DRY RUN] Перевооружение захвата");
        Ok(())
    }

    async fn next_event(&mut self) -> Result<CapturedEvent> {
        if !self.running {
            return std::future::pending().await;
        }
        if self.pending.is_empty() && self.repeat {
            self.pending = self.script.iter().cloned().collect();
        }
        let Some(delay) = self.pending.front().map(|(delay, _)| *delay) else {
            return std::future::pending().await;
        };
        // Событие снимается только после паузы: future могут бросить в select!
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match self.pending.pop_front() {
            Some((_, event)) => Ok(event),
            None => std::future::pending().await,
        }
    }

    fn forward(&mut self, event: &KeyEvent) -> Result<()> {
        debug!("[DRY RUN] Проброс: {}", event);
        self.emitted.lock().push(Emitted::Forwarded(VirtualKeyEvent::from(event)));
        Ok(())
    }

    fn release_masked(&mut self, event: &KeyEvent) -> Result<()> {
        debug!("[DRY RUN] Отпускание {} за маской", event.key_code);
        let mut emitted = self.emitted.lock();
        emitted.push(Emitted::Masked(event.key_code));
        emitted.push(Emitted::Forwarded(VirtualKeyEvent::release(event.key_code)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_capture_replays_in_order_once_started() {
        let alt = Modifiers::new().with_alt(true);
        let mut capture = DryRunCapture::scripted(vec![
            DryRunCapture::key(LEFT_ALT, KeyState::Pressed, alt),
            CapturedEvent::Suspended,
        ]);
        assert!(!capture.is_running());

        capture.start().unwrap();
        assert!(matches!(capture.next_event().await.unwrap(), CapturedEvent::Key(_)));
        assert_eq!(capture.next_event().await.unwrap(), CapturedEvent::Suspended);
    }

    #[tokio::test]
    async fn demo_script_loops() {
        let mut capture = DryRunCapture::demo();
        capture.start().unwrap();
        tokio::time::pause();
        let len = capture.script.len();
        for _ in 0..len + 1 {
            capture.next_event().await.unwrap();
        }
        assert!(capture.is_running());
    }
}
