use crate::app::AppCommand;
use crate::config::PermissionsConfig;
use crate::services::Notifier;
use crate::store::Preferences;
use crate::utils::permissions::{check_permissions, get_setup_commands};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Может ли процесс захватывать клавиатуру прямо сейчас
pub trait PermissionProbe: Send + Sync {
    fn is_trusted(&self) -> bool;
}

/// Доступ к /dev/input и /dev/uinput
pub struct InputPermissions;

impl PermissionProbe for InputPermissions {
    fn is_trusted(&self) -> bool {
        match check_permissions() {
            Ok(()) => true,
            Err(e) => {
                debug!("Доступ к вводу не подтверждён: {}", e);
                false
            }
        }
    }
}

/// Фиксированный ответ: dry-run и тесты
pub struct StaticProbe(pub bool);

impl PermissionProbe for StaticProbe {
    fn is_trusted(&self) -> bool {
        self.0
    }
}

/// Однократная подсказка пользователю и ограниченный по времени опрос,
/// пока доступ не выдан
pub struct PermissionService {
    probe: Arc<dyn PermissionProbe>,
    preferences: Preferences,
    notifier: Notifier,
    poll_interval: Duration,
    poll_attempts: u32,
    poll: Option<JoinHandle<()>>,
}

impl PermissionService {
    pub fn new(
        probe: Arc<dyn PermissionProbe>,
        preferences: Preferences,
        notifier: Notifier,
        config: &PermissionsConfig,
    ) -> Self {
        Self {
            probe,
            preferences,
            notifier,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            poll_attempts: config.poll_attempts,
            poll: None,
        }
    }

    pub fn is_trusted(&self) -> bool {
        self.probe.is_trusted()
    }

    /// При старте: подсказать один раз за всё время и начать опрос
    pub async fn prompt_if_needed(&mut self, commands: UnboundedSender<AppCommand>) {
        if self.is_trusted() {
            return;
        }
        if self.preferences.has_prompted_permissions() {
            info!("Доступ к вводу не выдан, подсказка уже показывалась ранее");
        } else {
            self.show_prompt().await;
            self.preferences.mark_prompted_permissions();
        }
        self.start_polling(commands);
    }

    /// Явный запрос пользователя: подсказать снова и перезапустить опрос
    pub async fn request_access(&mut self, commands: UnboundedSender<AppCommand>) {
        self.show_prompt().await;
        self.stop_polling();
        self.start_polling(commands);
    }

    pub fn is_polling(&self) -> bool {
        self.poll.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn start_polling(&mut self, commands: UnboundedSender<AppCommand>) {
        if self.is_polling() {
            return;
        }

        let probe = self.probe.clone();
        let interval = self.poll_interval;
        let attempts = self.poll_attempts;
        debug!("Опрос прав доступа: {} попыток с интервалом {:?}", attempts, interval);

        self.poll = Some(tokio::spawn(async move {
            for _ in 0..attempts {
                tokio::time::sleep(interval).await;
                if probe.is_trusted() {
                    info!("Доступ к устройствам ввода получен");
                    let _ = commands.send(AppCommand::PermissionGranted);
                    return;
                }
            }
            warn!("Доступ к вводу так и не выдан; опрос остановлен. Повторить: kill -USR1 <pid>");
        }));
    }

    pub fn stop_polling(&mut self) {
        if let Some(handle) = self.poll.take() {
            handle.abort();
        }
    }

    async fn show_prompt(&self) {
        warn!("HopSwitch нужен доступ к клавиатуре и /dev/uinput:");
        for line in get_setup_commands() {
            warn!("   {}", line);
        }
        self.notifier
            .notify(
                "HopSwitch: нужен доступ к клавиатуре",
                "Добавьте пользователя в группы input и uinput и перезайдите. Команды есть в журнале.",
            )
            .await;
    }
}

impl Drop for PermissionService {
    fn drop(&mut self) {
        self.stop_polling();
    }
}
