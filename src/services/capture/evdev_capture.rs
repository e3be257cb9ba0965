use crate::debug_if_enabled;
use crate::error::{HopError, Result};
use crate::events::{CapturedEvent, KeyCode, KeyEvent, KeyState, VirtualKeyEvent};
use crate::services::VirtualDevice;
use crate::utils::DeviceFinder;
use evdev::{Device, EventStream, EventType};
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{error, info, warn};

use super::modifier_state::ModifierState;
use super::r#trait::InputCapture;

const SYN_DROPPED: u16 = 3;
const VIRTUAL_DEVICE_NAME: &str = "HopSwitch Virtual Keyboard";

/// Захват через эксклюзивный grab evdev: поглощённое событие просто не
/// доходит до системы, пропущенное повторяется через uinput
pub struct EvdevCapture {
    device_path: String,
    mask_key: KeyCode,
    stream: Option<EventStream>,
    virtual_device: Option<VirtualDevice>,
    modifier_state: ModifierState,
    // Чтение упало: при перевооружении устройство нужно открыть заново
    device_lost: bool,
}

impl EvdevCapture {
    pub fn new(device_path: String, mask_key: KeyCode) -> Self {
        Self {
            device_path,
            mask_key,
            stream: None,
            virtual_device: None,
            modifier_state: ModifierState::new(),
            device_lost: false,
        }
    }

    fn open_grabbed(&self) -> Result<(PathBuf, Device)> {
        let device_path = DeviceFinder::find_keyboard_device(&self.device_path)?;

        let mut device = Device::open(&device_path).map_err(|e| {
            HopError::DeviceNotFound(format!("Не удалось открыть устройство {:?}: {}", device_path, e))
        })?;

        if let Err(e) = device.grab() {
            error!("Не удалось захватить устройство {:?}: {}", device_path, e);
            return Err(HopError::Permission(format!(
                "Не удалось захватить устройство эксклюзивно: {}. Возможно, его уже держит другой процесс",
                e
            )));
        }

        info!(
            "Устройство захвачено эксклюзивно: {:?} ({})",
            device_path,
            device.name().unwrap_or("Unknown")
        );
        Ok((device_path, device))
    }

    /// Состояние модификаторов могло разойтись с реальным, пока события терялись
    fn resync_modifiers(&mut self) {
        let Some(stream) = self.stream.as_ref() else {
            return;
        };
        let physical: BTreeSet<KeyCode> = match stream.device().get_key_state() {
            Ok(keys) => keys.iter().map(|key| KeyCode(key.code())).collect(),
            Err(e) => {
                warn!("Не удалось прочитать состояние клавиш: {}", e);
                return;
            }
        };

        self.modifier_state.resync(physical.iter().copied());
        debug_if_enabled!(
            "Зажатые модификаторы после синхронизации: {:?}",
            self.modifier_state.pressed_keys()
        );

        // Отпускания, потерянные вместе с событиями, дошлём сами
        if let Some(virtual_device) = self.virtual_device.as_mut() {
            match virtual_device.release_stale(&physical) {
                Ok(0) => {}
                Ok(released) => info!("Отпущено залипших клавиш: {}", released),
                Err(e) => warn!("Не удалось отпустить залипшие клавиши: {}", e),
            }
        }
    }

    fn send(&mut self, events: &[VirtualKeyEvent]) -> Result<()> {
        let Some(virtual_device) = self.virtual_device.as_mut() else {
            return Err(HopError::Internal("Захват не запущен".to_string()));
        };
        for event in events {
            virtual_device.send_event(*event)?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl InputCapture for EvdevCapture {
    fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        // Виртуальная клавиатура раньше grab: иначе при ошибке uinput
        // физическая клавиатура осталась бы захваченной впустую
        if self.virtual_device.is_none() {
            self.virtual_device = Some(VirtualDevice::new(VIRTUAL_DEVICE_NAME, false)?);
        }

        let (device_path, device) = self.open_grabbed()?;
        let stream = device.into_event_stream().map_err(|e| {
            HopError::Internal(format!("Не удалось открыть поток событий {:?}: {}", device_path, e))
        })?;

        self.stream = Some(stream);
        self.device_lost = false;
        self.resync_modifiers();
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.device_mut().ungrab() {
                warn!("Не удалось освободить устройство: {}", e);
            }
            info!("Захват клавиатуры остановлен");
        }
        if let Some(mut virtual_device) = self.virtual_device.take() {
            if let Err(e) = virtual_device.release_all_keys() {
                warn!("Не удалось отпустить клавиши: {}", e);
            }
        }
        self.modifier_state = ModifierState::new();
    }

    fn is_running(&self) -> bool {
        self.stream.is_some()
    }

    fn rearm(&mut self) -> Result<()> {
        if !self.device_lost {
            self.resync_modifiers();
            return Ok(());
        }

        warn!("Устройство потеряно, открываем заново");
        if let Some(mut stream) = self.stream.take() {
            // Дескриптор может быть уже мёртв
            let _ = stream.device_mut().ungrab();
        }
        if let Some(virtual_device) = self.virtual_device.as_mut() {
            virtual_device.release_all_keys()?;
        }
        self.start()
    }

    async fn next_event(&mut self) -> Result<CapturedEvent> {
        let Some(stream) = self.stream.as_mut() else {
            return std::future::pending().await;
        };

        loop {
            let event = match stream.next_event().await {
                Ok(event) => event,
                Err(e) => {
                    error!("Ошибка чтения событий: {}", e);
                    self.device_lost = true;
                    return Ok(CapturedEvent::Suspended);
                }
            };

            if event.event_type() == EventType::SYNCHRONIZATION && event.code() == SYN_DROPPED {
                warn!("Ядро сбросило часть событий (SYN_DROPPED)");
                return Ok(CapturedEvent::Suspended);
            }
            if event.event_type() != EventType::KEY {
                continue;
            }

            let key_code = KeyCode(event.code());
            let Some(state) = KeyState::from_evdev_value(event.value()) else {
                debug_if_enabled!("Неизвестное значение события: {}", event.value());
                continue;
            };

            self.modifier_state.update_key(key_code, state);
            let key_event = KeyEvent::new(key_code, state, self.modifier_state.to_modifiers());
            debug_if_enabled!("Событие клавиши: {}", key_event);
            return Ok(CapturedEvent::Key(key_event));
        }
    }

    fn forward(&mut self, event: &KeyEvent) -> Result<()> {
        self.send(&[VirtualKeyEvent::from(event)])
    }

    fn release_masked(&mut self, event: &KeyEvent) -> Result<()> {
        let mut batch: SmallVec<[VirtualKeyEvent; 3]> = SmallVec::new();
        batch.push(VirtualKeyEvent::press(self.mask_key));
        batch.push(VirtualKeyEvent::release(self.mask_key));
        batch.push(VirtualKeyEvent::release(event.key_code));
        self.send(&batch)
    }
}

impl Drop for EvdevCapture {
    fn drop(&mut self) {
        self.stop();
    }
}
