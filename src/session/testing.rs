use std::sync::Arc;

use parking_lot::Mutex;

use crate::session::render::{DisplayState, DisplaySurface};

#[derive(Default)]
struct Recorded {
    views: Vec<DisplayState>,
    alerts: Vec<String>,
}

/// Surface that keeps every update for later inspection. Clones share state.
#[derive(Clone, Default)]
pub(crate) struct RecordingSurface {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingSurface {
    pub(crate) fn present_count(&self) -> usize {
        self.inner.lock().views.len()
    }

    pub(crate) fn last_view(&self) -> Option<DisplayState> {
        self.inner.lock().views.last().cloned()
    }

    pub(crate) fn alerts(&self) -> Vec<String> {
        self.inner.lock().alerts.clone()
    }
}

impl DisplaySurface for RecordingSurface {
    fn present(&mut self, view: &DisplayState) {
        self.inner.lock().views.push(view.clone());
    }

    fn alert(&mut self, message: &str) {
        self.inner.lock().alerts.push(message.to_string());
    }
}
