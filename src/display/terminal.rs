use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::sampler::compress::parse_data_url;
use crate::session::render::{ConnectionIndicator, DisplayState, DisplaySurface, ImageSurface};

/// Renders the session view as log lines and, optionally, keeps the latest
/// annotated frame on disk as `latest.<ext>`.
pub struct TerminalSurface {
    output_dir: Option<PathBuf>,
    last: Option<DisplayState>,
    frames_written: u64,
}

impl TerminalSurface {
    pub fn new(output_dir: Option<PathBuf>) -> Self {
        Self {
            output_dir,
            last: None,
            frames_written: 0,
        }
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    fn write_frame(&mut self, url: &str) {
        let Some(dir) = self.output_dir.as_deref() else {
            return;
        };
        let Some(data) = parse_data_url(url) else {
            warn!("annotated frame is not a base64 data URL; not saved");
            return;
        };
        let Some(ext) = data.extension() else {
            warn!("annotated frame has unsupported type {}", data.mime_type);
            return;
        };

        match write_atomic(dir, &format!("latest.{ext}"), &data.bytes) {
            Ok(path) => {
                self.frames_written += 1;
                debug!("annotated frame written to {}", path.display());
            }
            Err(e) => warn!("failed to write annotated frame: {e}"),
        }
    }
}

fn changed(previous: Option<&DisplayState>, differs: impl Fn(&DisplayState) -> bool) -> bool {
    previous.map_or(true, differs)
}

/// Write to a temp file next to the target, then rename over it.
fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);
    let tmp = dir.join(format!("{name}.tmp"));
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, &path)?;
    Ok(path)
}

impl DisplaySurface for TerminalSurface {
    fn present(&mut self, view: &DisplayState) {
        let previous = self.last.replace(view.clone());
        let previous = previous.as_ref();

        if changed(previous, |p| p.connection != view.connection) {
            match view.connection {
                ConnectionIndicator::Connected => info!("Connected"),
                ConnectionIndicator::Disconnected => info!("Disconnected"),
            }
        }
        if changed(previous, |p| p.controls != view.controls) {
            if view.controls.stop_enabled {
                info!("session running (type `stop` to end it)");
            } else {
                info!("idle (type `start`, `select <exercise>` or `quit`)");
            }
        }
        if changed(previous, |p| {
            p.rep_count != view.rep_count || p.feedback != view.feedback
        }) {
            info!("reps: {} | {}", view.rep_count, view.feedback);
        }
        if changed(previous, |p| p.image != view.image) {
            match &view.image {
                ImageSurface::Frame(url) => self.write_frame(url),
                ImageSurface::Placeholder => debug!("camera off"),
            }
        }
    }

    fn alert(&mut self, message: &str) {
        eprintln!("{message}");
    }
}
