use crate::config::Config;
use crate::error::Result;
use crate::events::{CapturedEvent, SwitcherIntent};
use crate::services::{
    create_app_activator, create_desktop_detector, create_input_capture, DesktopState,
    HotkeyService, HotkeyStatus, InputPermissions, LogOverlay, Notifier, PermissionProbe,
    PermissionService, StaticProbe, SwitcherSession,
};
use crate::store::{PinnedApp, Preferences, ProfileStore, SpaceId, Storage};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Всё, что фоновые задачи сообщают циклу событий
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    DesktopChanged(SpaceId),
    PermissionGranted,
    /// SIGUSR1: полный цикл stop/start захвата
    Retry,
    /// SIGHUP: перечитать состояние и пресет
    Reload,
    Shutdown,
}

/// Единственный владелец состояния переключателя. Автомат, контроллер,
/// хранилище и захват живут в одном цикле событий и не синхронизируются.
pub struct App {
    config: Arc<Config>,
    dry_run: bool,
    preferences: Preferences,
    store: ProfileStore,
    desktop: DesktopState,
    hotkeys: HotkeyService,
    session: SwitcherSession,
    permissions: PermissionService,
    notifier: Notifier,
    commands_tx: UnboundedSender<AppCommand>,
    commands_rx: UnboundedReceiver<AppCommand>,
    tasks: Vec<JoinHandle<()>>,
}

impl App {
    pub fn new(config: Arc<Config>, dry_run: bool) -> Result<Self> {
        let storage = if dry_run {
            Storage::memory()
        } else {
            Storage::open_file(config.state_file())
        };
        let preferences = Preferences::new(storage.clone());
        let desktop = DesktopState::new();

        let mut store = ProfileStore::load(storage.clone(), Arc::new(desktop.clone()));
        store.subscribe(Box::new(|store: &ProfileStore| {
            debug!(
                "Профили изменены (ревизия {}), активный: {:?}",
                store.revision(),
                store.active_profile().map(|p| p.name.as_str())
            );
        }));
        if dry_run && store.apps().is_empty() {
            for (identifier, name) in [("firefox", "Firefox"), ("kitty", "Kitty"), ("code", "Code")] {
                store.add(PinnedApp::new(identifier, name));
            }
        }

        let notifier = Notifier::new(dry_run);
        let probe: Arc<dyn PermissionProbe> = if dry_run {
            Arc::new(StaticProbe(true))
        } else {
            Arc::new(InputPermissions)
        };
        let permissions = PermissionService::new(
            probe.clone(),
            preferences.clone(),
            notifier.clone(),
            &config.permissions,
        );

        let preset = preferences.shortcut_preset();
        info!("Пресет горячей клавиши: {}", preset);
        let capture = create_input_capture(config.clone(), dry_run)?;
        let hotkeys = HotkeyService::new(preset.binding(), capture, probe);

        let session = SwitcherSession::new(
            Box::new(LogOverlay::new()),
            create_app_activator(dry_run),
            preferences.clone(),
        );

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        Ok(Self {
            config,
            dry_run,
            preferences,
            store,
            desktop,
            hotkeys,
            session,
            permissions,
            notifier,
            commands_tx,
            commands_rx,
            tasks: Vec::new(),
        })
    }

    pub async fn run(mut self) -> Result<()> {
        crate::utils::permissions::warn_if_root();

        let detector = create_desktop_detector(
            self.config.clone(),
            self.desktop.clone(),
            self.commands_tx.clone(),
            self.dry_run,
        )?;
        self.tasks.push(tokio::spawn(async move {
            if let Err(e) = detector.run().await {
                error!("Ошибка в DesktopDetector: {}", e);
            }
        }));
        self.tasks.push(spawn_signal_forwarder(self.commands_tx.clone())?);

        self.permissions
            .prompt_if_needed(self.commands_tx.clone())
            .await;
        self.start_hotkeys();

        info!("HopSwitch запущен, активный профиль: {:?}", self.active_profile_name());

        loop {
            tokio::select! {
                event = self.hotkeys.next_event() => match event {
                    Ok(event) => self.on_captured(event),
                    Err(e) => {
                        let previous = self.hotkeys.status().clone();
                        if let Some(intent) = self.hotkeys.fail(e.to_string()) {
                            self.session.handle(intent, &mut self.store);
                        }
                        self.report_status(&previous);
                    }
                },
                Some(command) = self.commands_rx.recv() => {
                    if !self.on_command(command).await {
                        break;
                    }
                }
            }
        }

        self.shutdown();
        Ok(())
    }

    fn on_captured(&mut self, event: CapturedEvent) {
        let previous = self.hotkeys.status().clone();
        if let Some(intent) = self.hotkeys.process(event) {
            self.session.handle(intent, &mut self.store);
        }
        self.report_status(&previous);
    }

    /// false: пора выходить
    async fn on_command(&mut self, command: AppCommand) -> bool {
        debug!("Команда: {:?}", command);
        match command {
            AppCommand::DesktopChanged(desktop) => {
                if self.store.apply_space(desktop) {
                    info!(
                        "Рабочий стол {}: активный профиль {:?}",
                        desktop,
                        self.active_profile_name()
                    );
                }
            }
            AppCommand::PermissionGranted => {
                if !self.hotkeys.is_running() {
                    self.start_hotkeys();
                }
            }
            AppCommand::Retry => {
                let previous = self.hotkeys.status().clone();
                self.end_session();
                self.hotkeys.retry();
                if !self.permissions.is_trusted() {
                    self.permissions
                        .request_access(self.commands_tx.clone())
                        .await;
                }
                self.report_status(&previous);
            }
            AppCommand::Reload => self.reload(),
            AppCommand::Shutdown => return false,
        }
        true
    }

    fn reload(&mut self) {
        info!("Перечитываем сохранённое состояние");
        self.end_session();
        // Хранилище общее с настройками: пресет ниже читается уже свежий
        self.store.reload();

        let previous = self.hotkeys.status().clone();
        let preset = self.preferences.shortcut_preset();
        if self.hotkeys.binding() != preset.binding() {
            info!("Новый пресет горячей клавиши: {}", preset);
            self.hotkeys.configure(preset.binding());
        }
        self.report_status(&previous);
    }

    fn start_hotkeys(&mut self) {
        let previous = self.hotkeys.status().clone();
        self.hotkeys.start();
        self.report_status(&previous);
    }

    /// Захват перезапускается: открытая полоса уже не получит commit
    fn end_session(&mut self) {
        if self.session.is_visible() {
            self.session.handle(SwitcherIntent::Cancel, &mut self.store);
        }
    }

    fn report_status(&self, previous: &HotkeyStatus) {
        let status = self.hotkeys.status();
        if status == previous {
            return;
        }
        info!("Статус горячей клавиши: {} -> {}", previous, status);

        if let HotkeyStatus::Failed { reason } = status {
            let notifier = self.notifier.clone();
            let body = format!(
                "{}. Выдайте доступ и повторите: kill -USR1 {}",
                reason,
                std::process::id()
            );
            tokio::spawn(async move {
                notifier
                    .notify("HopSwitch: горячая клавиша не работает", &body)
                    .await;
            });
        }
    }

    fn active_profile_name(&self) -> Option<String> {
        self.store.active_profile().map(|p| p.name.clone())
    }

    fn shutdown(&mut self) {
        info!("Завершение работы...");
        self.end_session();
        self.hotkeys.stop();
        self.permissions.stop_polling();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        info!("HopSwitch завершил работу");
    }
}

/// Сигналы превращаются в команды циклу событий
fn spawn_signal_forwarder(commands: UnboundedSender<AppCommand>) -> Result<JoinHandle<()>> {
    let mut retry = signal(SignalKind::user_defined1())?;
    let mut reload = signal(SignalKind::hangup())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        loop {
            let command = tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Получен сигнал завершения (Ctrl+C)");
                    AppCommand::Shutdown
                }
                _ = terminate.recv() => {
                    info!("Получен SIGTERM");
                    AppCommand::Shutdown
                }
                _ = retry.recv() => AppCommand::Retry,
                _ = reload.recv() => AppCommand::Reload,
            };
            let last = command == AppCommand::Shutdown;
            if commands.send(command).is_err() || last {
                break;
            }
        }
    }))
}
