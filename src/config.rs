use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::services::keycode_map::KeycodeMap;
use crate::store::storage::{JsonFileBackend, APP_DIR};

pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub input: InputConfig,
    pub desktop: DesktopConfig,
    pub permissions: PermissionsConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "full" или "compact"
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    /// Путь к event-устройству или "auto"
    pub device_path: String,
    /// Клавиша, нажатие которой прячет отпускание модификатора после сессии
    pub mask_key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DesktopConfig {
    pub detection: String,
    pub polling_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PermissionsConfig {
    pub poll_interval_ms: u64,
    pub poll_attempts: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Файл состояния; по умолчанию в каталоге данных пользователя
    pub state_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            device_path: "auto".to_string(),
            mask_key: "f24".to_string(),
        }
    }
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            detection: "auto".to_string(),
            polling_interval_ms: 500,
        }
    }
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            poll_attempts: 120,
        }
    }
}

impl Config {
    /// Конфигурация по умолчанию: ~/.config/hopswitch/config.toml
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join(CONFIG_FILENAME)
    }

    /// Отсутствующий файл не ошибка: берутся значения по умолчанию
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("HOPSWITCH_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;
        Ok(config)
    }

    pub fn state_file(&self) -> PathBuf {
        self.storage
            .state_file
            .clone()
            .unwrap_or_else(JsonFileBackend::default_path)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "full" | "compact" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        if self.input.device_path.is_empty() {
            anyhow::bail!("input.device_path не может быть пустым (используйте \"auto\")");
        }

        let mask = KeycodeMap::get_keycode(&self.input.mask_key).map_err(anyhow::Error::msg)?;
        if KeycodeMap::is_modifier(mask) {
            anyhow::bail!("input.mask_key не может быть модификатором: {}", self.input.mask_key);
        }

        match self.desktop.detection.as_str() {
            "auto" | "kdotool" | "xdotool" | "wmctrl" | "sway" => {}
            _ => anyhow::bail!("Неверный метод детекции рабочего стола: {}", self.desktop.detection),
        }

        if self.desktop.polling_interval_ms < 100 {
            anyhow::bail!("desktop.polling_interval_ms должно быть минимум 100");
        }

        if self.permissions.poll_interval_ms == 0 {
            anyhow::bail!("permissions.poll_interval_ms должно быть больше 0");
        }

        Ok(())
    }
}
