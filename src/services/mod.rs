pub mod app_activator;
pub mod capture;
pub mod desktop_detector;
pub mod hotkey;
pub mod keycode_map;
pub mod notifier;
pub mod overlay;
pub mod permissions;
pub mod switcher_session;
pub mod virtual_device;

pub use app_activator::create_app_activator;
pub use capture::create_input_capture;
pub use desktop_detector::{create_desktop_detector, DesktopState};
pub use hotkey::{HotkeyService, HotkeyStatus};
pub use notifier::Notifier;
pub use overlay::LogOverlay;
pub use permissions::{InputPermissions, PermissionProbe, PermissionService, StaticProbe};
pub use switcher_session::SwitcherSession;
pub use virtual_device::VirtualDevice;
