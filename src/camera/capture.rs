use parking_lot::Mutex;
use std::sync::Arc;

use crate::camera::types::Resolution;

/// A single raster frame read from the camera.
#[derive(Debug)]
pub struct Frame {
    /// Raw pixel data (RGB24, row-major).
    pub data: Vec<u8>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Capture timestamp in microseconds since the stream started.
    pub timestamp_us: u64,
}

impl Frame {
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }
}

/// Latest-frame slot shared between a device's producer thread and the
/// sampler.
///
/// The sampler only ever wants the current frame, so older frames are
/// replaced rather than queued. Frames are wrapped in `Arc` so a read hands
/// out a pointer instead of copying the pixel buffer.
pub struct FrameBuffer {
    latest: Mutex<Option<Arc<Frame>>>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            latest: Mutex::new(None),
        }
    }

    /// Replace the current frame.
    pub fn push(&self, frame: Frame) {
        *self.latest.lock() = Some(Arc::new(frame));
    }

    /// The most recently pushed frame, if any.
    pub fn latest(&self) -> Option<Arc<Frame>> {
        self.latest.lock().clone()
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
