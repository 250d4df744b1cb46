// Display surfaces: where the session's view ends up.

pub mod terminal;

pub use terminal::TerminalSurface;
