use crate::app::AppCommand;
use crate::config::Config;
use crate::error::{HopError, Result};
use crate::store::SpaceId;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};

use super::kdotool::KdotoolDetector;
use super::r#trait::DesktopDetectorTrait;
use super::sway::SwayDetector;
use super::wmctrl::WmctrlDetector;
use super::xdotool::XdotoolDetector;
use super::DesktopState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkingMethod {
    Kdotool,
    Xdotool,
    Wmctrl,
    Sway,
}

impl WorkingMethod {
    const AUTO_ORDER: [WorkingMethod; 4] = [
        WorkingMethod::Kdotool,
        WorkingMethod::Xdotool,
        WorkingMethod::Wmctrl,
        WorkingMethod::Sway,
    ];

    /// Методы, которые разрешено пробовать при данной настройке
    pub fn candidates(detection: &str) -> Result<Vec<WorkingMethod>> {
        match detection {
            "auto" => Ok(Self::AUTO_ORDER.to_vec()),
            "kdotool" => Ok(vec![WorkingMethod::Kdotool]),
            "xdotool" => Ok(vec![WorkingMethod::Xdotool]),
            "wmctrl" => Ok(vec![WorkingMethod::Wmctrl]),
            "sway" => Ok(vec![WorkingMethod::Sway]),
            other => Err(HopError::Internal(format!("Неизвестный метод детекции: {}", other))),
        }
    }
}

pub struct RealDesktopDetector {
    config: Arc<Config>,
    state: DesktopState,
    commands: UnboundedSender<AppCommand>,
    candidates: Vec<WorkingMethod>,
    working_method: Option<WorkingMethod>,

    // Детекторы утилит
    kdotool: KdotoolDetector,
    xdotool: XdotoolDetector,
    wmctrl: WmctrlDetector,
    sway: SwayDetector,
}

impl RealDesktopDetector {
    pub fn new(
        config: Arc<Config>,
        state: DesktopState,
        commands: UnboundedSender<AppCommand>,
    ) -> Result<Self> {
        info!("Инициализация RealDesktopDetector");
        let candidates = WorkingMethod::candidates(&config.desktop.detection)?;

        Ok(Self {
            config,
            state,
            commands,
            candidates,
            working_method: None,
            kdotool: KdotoolDetector::new(),
            xdotool: XdotoolDetector::new(),
            wmctrl: WmctrlDetector::new(),
            sway: SwayDetector::new(),
        })
    }

    pub async fn run(mut self) -> Result<()> {
        let mut interval = interval(Duration::from_millis(self.config.desktop.polling_interval_ms));
        info!("Отслеживание рабочего стола запущено ({:?})", self.candidates);

        loop {
            interval.tick().await;

            let method = match self.working_method {
                Some(method) => method,
                None => match self.detect_working_method().await {
                    Some(method) => {
                        self.working_method = Some(method);
                        method
                    }
                    None => {
                        error!("Ни один метод не работает. Приостанавливаем детекцию на 10 секунд");
                        if !self.publish(None) {
                            return Ok(());
                        }
                        tokio::time::sleep(Duration::from_secs(10)).await;
                        continue;
                    }
                },
            };

            match self.query(method).await {
                Ok(desktop) => {
                    if !self.publish(Some(desktop)) {
                        return Ok(());
                    }
                }
                Err(e) => {
                    warn!("Рабочий метод {:?} перестал работать: {}. Переопределяем...", method, e);
                    self.working_method = None;
                }
            }
        }
    }

    async fn detect_working_method(&self) -> Option<WorkingMethod> {
        info!("Определяем рабочий метод детекции рабочего стола...");
        for method in &self.candidates {
            match self.query(*method).await {
                Ok(desktop) => {
                    info!("Используем {:?} (текущий стол: {})", method, desktop);
                    return Some(*method);
                }
                Err(e) => debug!("{:?} не подходит: {}", method, e),
            }
        }
        None
    }

    async fn query(&self, method: WorkingMethod) -> Result<SpaceId> {
        match method {
            WorkingMethod::Kdotool => self.kdotool.current_desktop().await,
            WorkingMethod::Xdotool => self.xdotool.current_desktop().await,
            WorkingMethod::Wmctrl => self.wmctrl.current_desktop().await,
            WorkingMethod::Sway => self.sway.current_desktop().await,
        }
    }

    /// false, если цикл событий уже завершился
    fn publish(&self, desktop: Option<SpaceId>) -> bool {
        if !self.state.set(desktop) {
            return true;
        }
        match desktop {
            Some(desktop) => {
                debug!("Смена рабочего стола: {}", desktop);
                self.commands.send(AppCommand::DesktopChanged(desktop)).is_ok()
            }
            None => {
                warn!("Текущий рабочий стол неизвестен");
                !self.commands.is_closed()
            }
        }
    }
}

/// Однократный запрос текущего стола, без фонового цикла
pub async fn probe_current_desktop(detection: &str) -> Option<SpaceId> {
    let candidates = WorkingMethod::candidates(detection).ok()?;
    for method in candidates {
        let result = match method {
            WorkingMethod::Kdotool => KdotoolDetector::new().current_desktop().await,
            WorkingMethod::Xdotool => XdotoolDetector::new().current_desktop().await,
            WorkingMethod::Wmctrl => WmctrlDetector::new().current_desktop().await,
            WorkingMethod::Sway => SwayDetector::new().current_desktop().await,
        };
        match result {
            Ok(desktop) => return Some(desktop),
            Err(e) => debug!("{:?} не подходит: {}", method, e),
        }
    }
    None
}

impl Drop for RealDesktopDetector {
    fn drop(&mut self) {
        info!("RealDesktopDetector завершает работу");
    }
}

#[async_trait::async_trait]
impl DesktopDetectorTrait for RealDesktopDetector {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run().await
    }
}
