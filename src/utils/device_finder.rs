use crate::error::{HopError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Устройства, которые называют себя клавиатурой, но ими не являются
const EXCLUDED_NAMES: [&str; 4] = ["mouse", "touchpad", "trackpoint", "deathadder"];

pub struct DeviceFinder;

impl DeviceFinder {
    /// Найти клавиатуру для захвата: явный путь из конфигурации или автопоиск
    pub fn find_keyboard_device(device_path: &str) -> Result<PathBuf> {
        if device_path != "auto" {
            let path = PathBuf::from(device_path);
            return if path.exists() {
                info!("Используется указанное устройство: {:?}", path);
                Ok(path)
            } else {
                HopError::device_not_found(format!("Указанное устройство не найдено: {:?}", path))
            };
        }

        Self::auto_find_keyboard()
    }

    fn auto_find_keyboard() -> Result<PathBuf> {
        info!("Автопоиск клавиатурного устройства...");

        if let Ok(device) = Self::find_by_id() {
            info!("Найдено устройство по ID: {:?}", device);
            return Ok(device);
        }

        if let Ok(device) = Self::find_by_event_devices() {
            info!("Найдено устройство среди event устройств: {:?}", device);
            return Ok(device);
        }

        HopError::device_not_found(
            "Не удалось найти клавиатуру. Убедитесь, что пользователь добавлен в группу 'input'",
        )
    }

    fn find_by_id() -> Result<PathBuf> {
        let by_id_dir = Path::new("/dev/input/by-id");
        if !by_id_dir.exists() {
            debug!("Директория /dev/input/by-id не существует");
            return HopError::device_not_found("Директория by-id не найдена");
        }

        let entries = fs::read_dir(by_id_dir)
            .map_err(|e| HopError::Permission(format!("Нет доступа к /dev/input/by-id: {}", e)))?;

        let mut candidates = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("")
                .to_string();

            if !name.contains("event") || !(name.contains("kbd") || name.contains("keyboard")) {
                continue;
            }
            if Self::is_excluded_name(&name) {
                debug!("Исключаем как мышь: {}", name);
                continue;
            }
            if !Self::is_device_accessible(&path) {
                warn!("Устройство {:?} недоступно", path);
                continue;
            }
            if Self::is_keyboard_device(&path) {
                let priority = Self::by_id_priority(&name);
                info!("Кандидат: {} (приоритет: {})", name, priority);
                candidates.push((path, priority));
            }
        }

        candidates.sort_by(|a, b| b.1.cmp(&a.1));
        match candidates.into_iter().next() {
            Some((keyboard, _)) => Ok(keyboard),
            None => HopError::device_not_found("Клавиатурное устройство не найдено в by-id"),
        }
    }

    fn find_by_event_devices() -> Result<PathBuf> {
        let entries = fs::read_dir("/dev/input")
            .map_err(|e| HopError::Permission(format!("Нет доступа к /dev/input: {}", e)))?;

        let mut event_devices = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_event = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("event"));
            if is_event {
                event_devices.push(path);
            }
        }
        event_devices.sort();

        event_devices
            .into_iter()
            .find(|path| Self::is_device_accessible(path) && Self::is_keyboard_device(path))
            .map(Ok)
            .unwrap_or_else(|| {
                HopError::device_not_found("Не найдено доступное клавиатурное устройство")
            })
    }

    /// `-event-kbd` надёжнее всего, затем всё, что называет себя keyboard
    fn by_id_priority(name: &str) -> u8 {
        if name.ends_with("event-kbd") {
            100
        } else if name.to_lowercase().contains("keyboard") {
            50
        } else {
            10
        }
    }

    fn is_excluded_name(name: &str) -> bool {
        let lower = name.to_lowercase();
        EXCLUDED_NAMES.iter().any(|excluded| lower.contains(excluded))
    }

    fn is_keyboard_device(device_path: &Path) -> bool {
        let device = match evdev::Device::open(device_path) {
            Ok(device) => device,
            Err(e) => {
                debug!("Не удалось открыть устройство {:?}: {}", device_path, e);
                return false;
            }
        };

        let device_name = device.name().unwrap_or("Unknown");
        if Self::is_excluded_name(device_name) {
            debug!("Исключаем устройство {:?} ({})", device_path, device_name);
            return false;
        }

        // Переключателю нужны Tab и Escape, а у настоящей клавиатуры много клавиш
        let has_keys = device.supported_keys().is_some_and(|keys| {
            keys.contains(evdev::KeyCode::KEY_TAB)
                && keys.contains(evdev::KeyCode::KEY_ESC)
                && keys.contains(evdev::KeyCode::KEY_A)
                && keys.iter().count() > 20
        });

        debug!("Устройство {:?} ({}): клавиатура = {}", device_path, device_name, has_keys);
        has_keys
    }

    fn is_device_accessible(device_path: &Path) -> bool {
        match fs::File::open(device_path) {
            Ok(_) => true,
            Err(e) => {
                debug!("Устройство {:?} недоступно: {}", device_path, e);
                false
            }
        }
    }
}
