use crate::error::{HopError, Result};
use crate::events::{KeyCode, KeyState, VirtualKeyEvent};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Виртуальная клавиатура uinput, через которую пробрасываются
/// непоглощённые события захваченного устройства
pub struct VirtualDevice {
    device: Option<uinput::Device>,
    device_name: String,
    dry_run: bool,
    // Что мы сейчас держим нажатым от имени пользователя
    pressed: BTreeSet<KeyCode>,
}

impl VirtualDevice {
    pub fn new(device_name: &str, dry_run: bool) -> Result<Self> {
        info!("Инициализация VirtualDevice '{}' (dry_run: {})", device_name, dry_run);

        let device = if dry_run {
            None
        } else {
            Some(Self::create_virtual_device(device_name)?)
        };

        Ok(Self {
            device,
            device_name: device_name.to_string(),
            dry_run,
            pressed: BTreeSet::new(),
        })
    }

    fn create_virtual_device(device_name: &str) -> Result<uinput::Device> {
        info!("Создание виртуального устройства uinput '{}' для инъекции клавиш", device_name);

        let virtual_device = uinput::default()?
            .name(device_name)?
            .event(uinput::event::Keyboard::All)?
            .create()
            .map_err(|e| {
                HopError::Permission(format!(
                    "Не удалось создать виртуальное устройство '{}': {}",
                    device_name, e
                ))
            })?;

        info!("Виртуальное устройство '{}' создано успешно", device_name);
        Ok(virtual_device)
    }

    pub fn send_event(&mut self, event: VirtualKeyEvent) -> Result<()> {
        match event.state {
            KeyState::Pressed | KeyState::Repeat => {
                self.pressed.insert(event.key_code);
            }
            KeyState::Released => {
                self.pressed.remove(&event.key_code);
            }
        }

        if self.dry_run {
            debug!("[DRY RUN] Виртуальное событие: {:?}", event);
            return Ok(());
        }

        let Some(device) = &mut self.device else {
            return Err(HopError::Internal("Виртуальное устройство недоступно".to_string()));
        };

        let keycode = event.key_code.value() as i32;
        device.write(1, keycode, event.state.evdev_value()).map_err(|e| {
            HopError::Internal(format!("Не удалось отправить событие клавиши {}: {}", keycode, e))
        })?;

        // Синхронизируем события
        device
            .write(0, 0, 0)
            .map_err(|e| HopError::Internal(format!("Не удалось синхронизировать события: {}", e)))?;

        debug!("Виртуальное событие {} отправлено", event.key_code);
        Ok(())
    }

    /// Отпустить всё, что осталось нажатым, чтобы клавиши не залипали
    pub fn release_all_keys(&mut self) -> Result<()> {
        let held: Vec<KeyCode> = self.pressed.iter().copied().collect();
        if !held.is_empty() {
            info!("'{}': отпускаем {} удерживаемых клавиш", self.device_name, held.len());
        }
        for key in held {
            self.send_event(VirtualKeyEvent::release(key))?;
        }
        Ok(())
    }

    /// Отпустить то, что держим мы, но уже не держит пользователь
    pub fn release_stale(&mut self, physical: &BTreeSet<KeyCode>) -> Result<usize> {
        let stale: Vec<KeyCode> = self.pressed.difference(physical).copied().collect();
        for key in &stale {
            debug!("Отпускаем залипшую клавишу {}", key);
            self.send_event(VirtualKeyEvent::release(*key))?;
        }
        Ok(stale.len())
    }
}

impl Drop for VirtualDevice {
    fn drop(&mut self) {
        if let Err(e) = self.release_all_keys() {
            warn!("Не удалось выполнить release_all_keys: {}", e);
        }
        if !self.dry_run {
            info!("Закрытие виртуального устройства");
        }
    }
}
