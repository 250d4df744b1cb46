use serde::Serialize;

use crate::session::state::{Session, WAITING_FEEDBACK};
use crate::transport::{ConnectionState, ResultPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionIndicator {
    Connected,
    Disconnected,
}

impl From<ConnectionState> for ConnectionIndicator {
    fn from(state: ConnectionState) -> Self {
        match state {
            ConnectionState::Open => Self::Connected,
            ConnectionState::Connecting | ConnectionState::Closed => Self::Disconnected,
        }
    }
}

/// Which controls the user may interact with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlAffordances {
    pub start_enabled: bool,
    pub stop_enabled: bool,
    pub selector_enabled: bool,
}

impl ControlAffordances {
    pub const fn idle() -> Self {
        Self {
            start_enabled: true,
            stop_enabled: false,
            selector_enabled: true,
        }
    }

    pub const fn exercising() -> Self {
        Self {
            start_enabled: false,
            stop_enabled: true,
            selector_enabled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSurface {
    Placeholder,
    /// Data URL of the last annotated frame.
    Frame(String),
}

/// Everything the user currently sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayState {
    pub connection: ConnectionIndicator,
    pub controls: ControlAffordances,
    pub rep_count: u32,
    pub feedback: String,
    pub image: ImageSurface,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            connection: ConnectionIndicator::Disconnected,
            controls: ControlAffordances::idle(),
            rep_count: 0,
            feedback: WAITING_FEEDBACK.to_string(),
            image: ImageSurface::Placeholder,
        }
    }
}

/// Output device for [`DisplayState`] updates.
pub trait DisplaySurface: Send {
    fn present(&mut self, view: &DisplayState);

    /// Blocking-style notice, e.g. a denied camera.
    fn alert(&mut self, message: &str);
}

/// Keeps the display model and pushes it to a [`DisplaySurface`].
///
/// Setters only change the model; callers decide when to `present`, so one
/// user action yields one update.
pub struct RenderSink {
    view: DisplayState,
    surface: Box<dyn DisplaySurface>,
}

impl RenderSink {
    pub fn new(surface: Box<dyn DisplaySurface>) -> Self {
        Self {
            view: DisplayState::default(),
            surface,
        }
    }

    pub fn view(&self) -> &DisplayState {
        &self.view
    }

    /// Show a result if the session is still exercising. Returns whether it
    /// was rendered.
    pub fn render(&mut self, session: &Session, result: &ResultPayload) -> bool {
        if !session.is_exercising() {
            return false;
        }
        self.view.rep_count = result.rep_count;
        self.view.feedback.clone_from(&result.feedback);
        self.view.image = ImageSurface::Frame(result.image.clone());
        self.present();
        true
    }

    pub fn set_connection(&mut self, indicator: ConnectionIndicator) {
        self.view.connection = indicator;
    }

    pub fn set_controls(&mut self, controls: ControlAffordances) {
        self.view.controls = controls;
    }

    pub fn reset_stats(&mut self) {
        self.view.rep_count = 0;
        self.view.feedback = WAITING_FEEDBACK.to_string();
    }

    pub fn show_placeholder(&mut self) {
        self.view.image = ImageSurface::Placeholder;
    }

    pub fn present(&mut self) {
        self.surface.present(&self.view);
    }

    pub fn alert(&mut self, message: &str) {
        self.surface.alert(message);
    }
}
