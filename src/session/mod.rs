// Session controller: the Idle/Exercising state machine and its display.

pub mod commands;
pub mod controller;
pub mod error;
pub mod event_loop;
pub mod render;
pub mod state;
#[cfg(test)]
pub(crate) mod testing;

pub use commands::UiCommand;
pub use controller::SessionController;
pub use error::SessionError;
pub use render::{DisplayState, DisplaySurface};
