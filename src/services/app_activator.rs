use crate::error::{HopError, Result};
use crate::store::PinnedApp;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// «Вывести приложение на передний план, запустив при необходимости».
/// Результат приходит асинхронно и только в журнал.
pub trait AppActivator: Send {
    fn activate(&self, app: &PinnedApp);
}

/// Поднять окно по WM_CLASS через wmctrl, иначе запустить .desktop через gtk-launch
pub struct DesktopActivator;

impl DesktopActivator {
    pub fn new() -> Self {
        Self
    }

    async fn raise_or_launch(identifier: &str) -> Result<()> {
        match Command::new("wmctrl").args(["-x", "-a", identifier]).status().await {
            Ok(status) if status.success() => {
                debug!("Окно {} поднято через wmctrl", identifier);
                return Ok(());
            }
            Ok(_) => debug!("{} не запущен, пробуем gtk-launch", identifier),
            Err(e) => debug!("wmctrl недоступен: {}", e),
        }

        let status = Command::new("gtk-launch")
            .arg(identifier)
            .status()
            .await
            .map_err(|e| HopError::ServiceUnavailable(format!("gtk-launch недоступен: {}", e)))?;

        if status.success() {
            info!("Запущено приложение {}", identifier);
            Ok(())
        } else {
            Err(HopError::Internal(format!("gtk-launch {} завершился с {}", identifier, status)))
        }
    }
}

impl AppActivator for DesktopActivator {
    fn activate(&self, app: &PinnedApp) {
        let identifier = app.identifier.clone();
        let name = app.display_name.clone();
        tokio::spawn(async move {
            if let Err(e) = Self::raise_or_launch(&identifier).await {
                warn!("Не удалось активировать {} ({}): {}", name, identifier, e);
            }
        });
    }
}

pub struct DryRunActivator;

impl AppActivator for DryRunActivator {
    fn activate(&self, app: &PinnedApp) {
        info!("[DRY RUN] Активация {} ({})", app.display_name, app.identifier);
    }
}

pub fn create_app_activator(dry_run: bool) -> Box<dyn AppActivator> {
    if dry_run {
        Box::new(DryRunActivator)
    } else {
        Box::new(DesktopActivator::new())
    }
}
