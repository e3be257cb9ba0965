pub mod dry_capture;
pub mod evdev_capture;
pub mod modifier_state;
pub mod r#trait;

pub use dry_capture::DryRunCapture;
pub use r#trait::{create_input_capture, InputCapture};
