use crate::app::AppCommand;
use crate::error::Result;
use crate::store::SpaceId;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{interval, Duration};
use tracing::info;

use super::r#trait::DesktopDetectorTrait;
use super::DesktopState;

const FAKE_DESKTOPS: [SpaceId; 3] = [1, 2, 3];

pub struct DryRunDetector {
    state: DesktopState,
    commands: UnboundedSender<AppCommand>,
}

impl DryRunDetector {
    pub fn new(state: DesktopState, commands: UnboundedSender<AppCommand>) -> Self {
        Self { state, commands }
    }

    async fn run_impl(self) -> Result<()> {
        info!("Dry-run режим - DesktopDetector работает в режиме эмуляции");

        let mut interval = interval(Duration::from_secs(15));
        for desktop in FAKE_DESKTOPS.iter().cycle() {
            interval.tick().await;

            info!("Dry-run: эмулируем переход на рабочий стол {}", desktop);
            if self.state.set(Some(*desktop))
                && self.commands.send(AppCommand::DesktopChanged(*desktop)).is_err()
            {
                break;
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DesktopDetectorTrait for DryRunDetector {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}
