use crate::error::Result;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use zbus::zvariant::Value;
use zbus::Connection;

const NOTIFICATIONS_BUS: &str = "org.freedesktop.Notifications";
const NOTIFICATIONS_PATH: &str = "/org/freedesktop/Notifications";
const APP_NAME: &str = "HopSwitch";

/// Уведомления рабочего стола через org.freedesktop.Notifications
#[derive(Clone)]
pub struct Notifier {
    dry_run: bool,
}

impl Notifier {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Показать уведомление; отсутствие сервера уведомлений не ошибка для вызывающего
    pub async fn notify(&self, summary: &str, body: &str) {
        if self.dry_run {
            info!("[DRY RUN] Уведомление: {} | {}", summary, body);
            return;
        }
        if let Err(e) = self.send(summary, body).await {
            warn!("Не удалось показать уведомление '{}': {}", summary, e);
        }
    }

    async fn send(&self, summary: &str, body: &str) -> Result<()> {
        let connection = Connection::session().await?;
        let hints: HashMap<&str, Value<'_>> = HashMap::new();
        let actions: Vec<&str> = Vec::new();

        connection
            .call_method(
                Some(NOTIFICATIONS_BUS),
                NOTIFICATIONS_PATH,
                Some(NOTIFICATIONS_BUS),
                "Notify",
                &(APP_NAME, 0u32, "", summary, body, actions, hints, -1i32),
            )
            .await?;

        debug!("Уведомление отправлено: {}", summary);
        Ok(())
    }
}
