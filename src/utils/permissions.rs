use crate::error::{HopError, Result};
use std::fs::{self, OpenOptions};
use std::path::Path;
use tracing::{debug, info, warn};

const INPUT_DIR: &str = "/dev/input";
const UINPUT_DEVICE: &str = "/dev/uinput";

/// Проверить, что процесс может читать клавиатуры и создавать виртуальную.
/// Без этого захват горячей клавиши невозможен.
pub fn check_permissions() -> Result<()> {
    check_input_devices_access()?;
    check_uinput_access()?;
    debug!("Права доступа к {} и {} подтверждены", INPUT_DIR, UINPUT_DEVICE);
    Ok(())
}

fn check_input_devices_access() -> Result<()> {
    let entries = fs::read_dir(INPUT_DIR).map_err(|e| {
        HopError::Permission(format!(
            "Нет доступа к {}: {}. Добавьте пользователя в группу 'input'",
            INPUT_DIR, e
        ))
    })?;

    // Читаемая директория ещё ничего не значит: нужен хотя бы один event-узел
    let readable = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("event"))
        })
        .any(|path| fs::File::open(path).is_ok());

    if readable {
        Ok(())
    } else {
        Err(HopError::Permission(format!(
            "Ни одно устройство в {} не доступно для чтения",
            INPUT_DIR
        )))
    }
}

fn check_uinput_access() -> Result<()> {
    if !Path::new(UINPUT_DEVICE).exists() {
        return Err(HopError::Permission(format!(
            "{} не существует, модуль uinput не загружен",
            UINPUT_DEVICE
        )));
    }

    OpenOptions::new()
        .write(true)
        .open(UINPUT_DEVICE)
        .map(|_| ())
        .map_err(|e| {
            HopError::Permission(format!(
                "Нет прав на запись в {}: {}. Добавьте пользователя в группу 'uinput' или 'input'",
                UINPUT_DEVICE, e
            ))
        })
}

/// Предупредить о запуске от root: работать будет, но так не задумано
pub fn warn_if_root() {
    match std::env::var("USER") {
        Ok(user) if user == "root" => {
            warn!("⚠️  Приложение запущено от имени root!");
            warn!("   Рекомендуется добавить пользователя в группы 'input' и 'uinput'");
            warn!("   и запускать приложение от имени обычного пользователя");
        }
        Ok(user) => info!("Приложение запущено от имени пользователя: {}", user),
        Err(_) => warn!("Не удалось определить пользователя"),
    }
}

/// Команды, которые нужно выполнить, чтобы выдать доступ к вводу
pub fn get_setup_commands() -> Vec<String> {
    vec![
        "# Добавить пользователя в необходимые группы:".to_string(),
        "sudo usermod -a -G input,uinput $USER".to_string(),
        "# Загрузить модуль uinput:".to_string(),
        "sudo modprobe uinput".to_string(),
        "# Автоматическая загрузка модуля при загрузке системы:".to_string(),
        "echo 'uinput' | sudo tee /etc/modules-load.d/uinput.conf".to_string(),
        "# После выполнения команд перезайдите в систему".to_string(),
    ]
}
