//! DesktopDetector service: responsibility and boundaries
//!
//! Определяет ТОЛЬКО текущий виртуальный рабочий стол и кладёт его в
//! `DesktopState`. Решение, какой профиль сделать активным, принимает
//! цикл событий по `AppCommand::DesktopChanged`.

mod desktop_detector;
mod desktop_state;
mod dry_run;
mod kdotool;
mod sway;
mod tool;
mod r#trait;
mod wmctrl;
mod xdotool;

pub use self::desktop_detector::probe_current_desktop;
pub use self::desktop_state::DesktopState;
pub use self::r#trait::{create_desktop_detector, DesktopDetectorTrait};
