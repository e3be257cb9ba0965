use crate::error::{HopError, Result};
use crate::store::SpaceId;
use std::collections::HashMap;
use std::process::Command;
use tracing::debug;

use super::tool::{parse_number, run_tool};

/// kdotool ходит в KWin через сессионную шину; под sudo её адрес нужно подставить
fn build_env_overrides() -> HashMap<String, String> {
    let mut env_vars = HashMap::new();

    if std::env::var("USER").unwrap_or_default() == "root" {
        if let Ok(sudo_user) = std::env::var("SUDO_USER") {
            if let Ok(output) = Command::new("id").args(["-u", &sudo_user]).output() {
                if let Ok(uid_str) = String::from_utf8(output.stdout) {
                    let uid = uid_str.trim();
                    let user_runtime_dir = format!("/run/user/{}", uid);

                    debug!("Подставляем окружение пользователя {}: uid={}", sudo_user, uid);
                    env_vars.insert(
                        "DBUS_SESSION_BUS_ADDRESS".to_string(),
                        format!("unix:path={}/bus", user_runtime_dir),
                    );
                    env_vars.insert("XDG_RUNTIME_DIR".to_string(), user_runtime_dir);
                    env_vars.insert("USER".to_string(), sudo_user);
                }
            }
        }
    }

    env_vars
}

pub struct KdotoolDetector {
    envs: HashMap<String, String>,
}

impl KdotoolDetector {
    pub fn new() -> Self {
        Self {
            envs: build_env_overrides(),
        }
    }

    pub async fn current_desktop(&self) -> Result<SpaceId> {
        let stdout = run_tool("kdotool", &["get_desktop"], &self.envs).await?;
        parse_number(&stdout)
            .ok_or_else(|| HopError::ServiceUnavailable(format!("kdotool: неожиданный вывод '{}'", stdout.trim())))
    }
}
