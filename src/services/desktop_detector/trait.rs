use crate::app::AppCommand;
use crate::config::Config;
use crate::error::Result;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use super::DesktopState;

/// Trait for desktop detectors that can run in different modes
#[async_trait::async_trait]
pub trait DesktopDetectorTrait {
    /// Run the desktop detector until the event loop goes away
    async fn run(self: Box<Self>) -> Result<()>;
}

/// Factory function to create an appropriate desktop detector based on the dry_run flag
pub fn create_desktop_detector(
    config: Arc<Config>,
    state: DesktopState,
    commands: UnboundedSender<AppCommand>,
    dry_run: bool,
) -> Result<Box<dyn DesktopDetectorTrait + Send>> {
    if dry_run {
        Ok(Box::new(super::dry_run::DryRunDetector::new(state, commands)))
    } else {
        Ok(Box::new(super::desktop_detector::RealDesktopDetector::new(
            config, state, commands,
        )?))
    }
}
