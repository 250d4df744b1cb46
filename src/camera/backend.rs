use std::sync::Arc;

use async_trait::async_trait;

use crate::camera::capture::Frame;
use crate::camera::error::Result;
use crate::camera::types::{CaptureRequest, Resolution};

/// A local video device that can be opened for a session.
///
/// Acquisition is the only capture operation allowed to suspend: a real
/// device may be waiting on a permission prompt.
#[async_trait]
pub trait CaptureSource: Send + Sync {
    /// Human-readable name used in logs and alerts.
    fn name(&self) -> &str;

    /// Open the device and start streaming.
    async fn acquire(&self, request: &CaptureRequest) -> Result<Box<dyn CaptureHandle>>;
}

/// Exclusive ownership of an open, streaming device.
pub trait CaptureHandle: Send {
    /// Resolution the device actually granted.
    fn resolution(&self) -> Resolution;

    /// The current frame of the live stream.
    fn read_frame(&self) -> Result<Arc<Frame>>;

    /// Stop the physical device. Idempotent.
    fn stop(&mut self);
}
