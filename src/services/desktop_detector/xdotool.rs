use crate::error::{HopError, Result};
use crate::store::SpaceId;
use std::collections::HashMap;
use tracing::debug;

use super::tool::{parse_number, run_tool};

pub struct XdotoolDetector;

impl XdotoolDetector {
    pub fn new() -> Self {
        Self
    }

    pub async fn current_desktop(&self) -> Result<SpaceId> {
        let stdout = run_tool("xdotool", &["get_desktop"], &HashMap::new()).await?;
        debug!("xdotool get_desktop: '{}'", stdout.trim());
        parse_number(&stdout)
            .ok_or_else(|| HopError::ServiceUnavailable(format!("xdotool: неожиданный вывод '{}'", stdout.trim())))
    }
}
