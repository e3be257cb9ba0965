use crate::error::{HopError, Result};
use crate::store::SpaceId;
use std::collections::HashMap;

use super::tool::run_tool;

pub struct WmctrlDetector;

impl WmctrlDetector {
    pub fn new() -> Self {
        Self
    }

    pub async fn current_desktop(&self) -> Result<SpaceId> {
        let stdout = run_tool("wmctrl", &["-d"], &HashMap::new()).await?;
        parse_desktops(&stdout)
            .ok_or_else(|| HopError::ServiceUnavailable("wmctrl: текущий рабочий стол не найден".to_string()))
    }
}

/// Строка текущего стола помечена звёздочкой во второй колонке:
/// `1  * DG: 1920x1080  VP: 0,0  WA: 0,0 1920x1080  Work`
pub fn parse_desktops(stdout: &str) -> Option<SpaceId> {
    stdout.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        let index = parts.next()?;
        (parts.next()? == "*").then(|| index.parse().ok()).flatten()
    })
}
