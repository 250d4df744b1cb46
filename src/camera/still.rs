use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::camera::backend::{CaptureHandle, CaptureSource};
use crate::camera::capture::{Frame, FrameBuffer};
use crate::camera::error::{CameraError, Result};
use crate::camera::types::{CaptureRequest, Resolution};

/// Serves a still image file as a live stream.
///
/// Useful for driving the remote endpoint with a known pose without a
/// webcam. The image's own size is the granted resolution.
pub struct StillImageCamera {
    path: PathBuf,
    name: String,
}

impl StillImageCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("Still image ({})", path.display());
        Self { path, name }
    }
}

fn load_frame(path: &Path) -> Result<Frame> {
    let img = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => {
            CameraError::DeviceUnavailable(format!("{} not found", path.display()))
        }
        other => CameraError::Capture(format!("failed to decode {}: {other}", path.display())),
    })?;
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(Frame {
        data: rgb.into_raw(),
        width,
        height,
        timestamp_us: 0,
    })
}

#[async_trait]
impl CaptureSource for StillImageCamera {
    fn name(&self) -> &str {
        &self.name
    }

    async fn acquire(&self, _request: &CaptureRequest) -> Result<Box<dyn CaptureHandle>> {
        let path = self.path.clone();
        let frame = tokio::task::spawn_blocking(move || load_frame(&path))
            .await
            .map_err(|e| CameraError::Capture(format!("image loader failed: {e}")))??;

        let resolution = frame.resolution();
        let buffer = FrameBuffer::new();
        buffer.push(frame);
        tracing::info!("{} streaming at {resolution}", self.name);

        Ok(Box::new(StillStream {
            resolution,
            buffer,
            stopped: false,
        }))
    }
}

/// Open stream of a still image.
pub struct StillStream {
    resolution: Resolution,
    buffer: FrameBuffer,
    stopped: bool,
}

impl CaptureHandle for StillStream {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn read_frame(&self) -> Result<Arc<Frame>> {
        if self.stopped {
            return Err(CameraError::Stopped);
        }
        self.buffer.latest().ok_or(CameraError::NoFrame)
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}
