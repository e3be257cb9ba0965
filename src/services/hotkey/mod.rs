pub mod service;
pub mod state_machine;

pub use service::{HotkeyService, HotkeyStatus};
pub use state_machine::{HotkeyStateMachine, SwitcherPhase, Transition};
