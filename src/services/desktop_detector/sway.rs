use crate::error::{HopError, Result};
use crate::store::SpaceId;
use serde::Deserialize;
use std::collections::HashMap;

use super::tool::run_tool;

#[derive(Debug, Deserialize)]
struct SwayWorkspace {
    num: i64,
    #[serde(default)]
    focused: bool,
}

pub struct SwayDetector;

impl SwayDetector {
    pub fn new() -> Self {
        Self
    }

    pub async fn current_desktop(&self) -> Result<SpaceId> {
        let stdout = run_tool("swaymsg", &["-t", "get_workspaces", "-r"], &HashMap::new()).await?;
        parse_workspaces(&stdout)?
            .ok_or_else(|| HopError::ServiceUnavailable("Активный workspace в Sway не найден".to_string()))
    }
}

pub fn parse_workspaces(stdout: &str) -> Result<Option<SpaceId>> {
    let workspaces: Vec<SwayWorkspace> = serde_json::from_str(stdout)?;
    Ok(workspaces.into_iter().find(|w| w.focused).map(|w| w.num))
}
