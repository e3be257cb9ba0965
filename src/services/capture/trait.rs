use crate::config::Config;
use crate::error::Result;
use crate::events::{CapturedEvent, KeyEvent};
use crate::services::keycode_map::KeycodeMap;
use std::sync::Arc;

/// Низкоуровневый захват клавиатуры с семантикой «поглотить / пробросить»
#[async_trait::async_trait]
pub trait InputCapture: Send {
    /// Захватить устройство; ошибка прав доступа возвращается как `Permission`
    fn start(&mut self) -> Result<()>;

    /// Освободить устройство и отпустить всё, что держали от имени пользователя
    fn stop(&mut self);

    fn is_running(&self) -> bool;

    /// Восстановить захват после приостановки, не трогая автомат
    fn rearm(&mut self) -> Result<()>;

    /// Следующее событие; пока захват не запущен, future не завершается
    async fn next_event(&mut self) -> Result<CapturedEvent>;

    /// Пробросить событие дальше в систему
    fn forward(&mut self, event: &KeyEvent) -> Result<()>;

    /// Поглощённое отпускание модификатора: отпустить его за маской,
    /// чтобы он не залип и не стал «одиночным» нажатием
    fn release_masked(&mut self, event: &KeyEvent) -> Result<()>;
}

/// Factory function to create an appropriate input capture based on the dry_run flag
pub fn create_input_capture(config: Arc<Config>, dry_run: bool) -> Result<Box<dyn InputCapture>> {
    if dry_run {
        Ok(Box::new(super::dry_capture::DryRunCapture::demo()))
    } else {
        let mask_key = KeycodeMap::get_keycode(&config.input.mask_key)
            .map_err(|e| crate::error::HopError::Config(anyhow::anyhow!(e)))?;
        Ok(Box::new(super::evdev_capture::EvdevCapture::new(
            config.input.device_path.clone(),
            mask_key,
        )))
    }
}
