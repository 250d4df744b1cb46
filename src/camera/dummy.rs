use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::camera::backend::{CaptureHandle, CaptureSource};
use crate::camera::capture::{Frame, FrameBuffer};
use crate::camera::error::{CameraError, Result};
use crate::camera::types::{CaptureRequest, Resolution};

const DUMMY_DEVICE_NAME: &str = "Dummy Test Camera";
const DEFAULT_FPS: f32 = 30.0;
/// Frame rates the producer thread accepts.
pub const MIN_FPS: f32 = 0.1;
pub const MAX_FPS: f32 = 240.0;

/// Synthetic RGB test pattern: a diagonal gradient that drifts with `phase`
/// so consecutive frames differ.
fn test_pattern(resolution: Resolution, phase: u64) -> Vec<u8> {
    let shift = (phase % 256) as u32;
    let mut data = Vec::with_capacity(resolution.rgb_len());
    for y in 0..resolution.height {
        for x in 0..resolution.width {
            data.push(((x + shift) % 256) as u8);
            data.push(((y + shift) % 256) as u8);
            data.push(128);
        }
    }
    data
}

/// A fake camera for running without real hardware.
///
/// Streams a moving test pattern from a producer thread. By default it grants
/// whatever resolution is requested; `with_native_resolution` makes it behave
/// like a device that ignores the request.
///
/// Selected by default, or forced with `DUMMY_CAMERA=1`.
pub struct DummyCamera {
    native: Option<Resolution>,
    fps: f32,
    deny: Option<CameraError>,
    releases: Arc<AtomicUsize>,
}

impl DummyCamera {
    pub fn new() -> Self {
        Self {
            native: None,
            fps: DEFAULT_FPS,
            deny: None,
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A camera that refuses access, as if the user denied permission.
    pub fn denied() -> Self {
        Self {
            deny: Some(CameraError::PermissionDenied(
                "access to the dummy camera was refused".to_string(),
            )),
            ..Self::new()
        }
    }

    /// Grant this resolution regardless of what the session asks for.
    pub fn with_native_resolution(mut self, resolution: Resolution) -> Self {
        self.native = Some(resolution);
        self
    }

    pub fn with_fps(mut self, fps: f32) -> Self {
        self.fps = fps;
        self
    }

    /// Shared counter of how many streams have been released.
    pub fn release_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.releases)
    }

    /// Falls back to the default rate when `fps` is outside `MIN_FPS..=MAX_FPS`.
    fn frame_interval(&self) -> Duration {
        let fps = if (MIN_FPS..=MAX_FPS).contains(&self.fps) {
            self.fps
        } else {
            DEFAULT_FPS
        };
        Duration::try_from_secs_f32(1.0 / fps).unwrap_or(Duration::from_millis(33))
    }
}

impl Default for DummyCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureSource for DummyCamera {
    fn name(&self) -> &str {
        DUMMY_DEVICE_NAME
    }

    async fn acquire(&self, request: &CaptureRequest) -> Result<Box<dyn CaptureHandle>> {
        if let Some(err) = &self.deny {
            return Err(err.clone());
        }

        let resolution = self.native.unwrap_or(request.resolution);
        let stream = DummyStream::start(resolution, self.frame_interval(), &self.releases)?;
        tracing::info!("{DUMMY_DEVICE_NAME} streaming at {resolution}");
        Ok(Box::new(stream))
    }
}

/// Open stream of the dummy camera.
pub struct DummyStream {
    resolution: Resolution,
    buffer: Arc<FrameBuffer>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    releases: Arc<AtomicUsize>,
}

impl DummyStream {
    fn start(
        resolution: Resolution,
        interval: Duration,
        releases: &Arc<AtomicUsize>,
    ) -> Result<Self> {
        let buffer = Arc::new(FrameBuffer::new());
        // A real device has a frame ready once acquisition resolves.
        buffer.push(Frame {
            data: test_pattern(resolution, 0),
            width: resolution.width,
            height: resolution.height,
            timestamp_us: 0,
        });

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);
        let buffer_clone = Arc::clone(&buffer);

        let thread = std::thread::Builder::new()
            .name("dummy-camera".to_string())
            .spawn(move || produce_frames(resolution, &buffer_clone, &running_clone, interval))
            .map_err(|e| CameraError::Capture(format!("failed to spawn producer thread: {e}")))?;

        Ok(Self {
            resolution,
            buffer,
            running,
            thread: Some(thread),
            releases: Arc::clone(releases),
        })
    }
}

impl CaptureHandle for DummyStream {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn read_frame(&self) -> Result<Arc<Frame>> {
        if !self.running.load(Ordering::Acquire) {
            return Err(CameraError::Stopped);
        }
        self.buffer.latest().ok_or(CameraError::NoFrame)
    }

    fn stop(&mut self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(handle) = self.thread.take() {
            // The producer parks between frames.
            handle.thread().unpark();
            let _ = handle.join();
        }
        self.releases.fetch_add(1, Ordering::Relaxed);
        tracing::info!("{DUMMY_DEVICE_NAME} released");
    }
}

impl Drop for DummyStream {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Producer loop that runs on the camera thread.
fn produce_frames(
    resolution: Resolution,
    buffer: &FrameBuffer,
    running: &AtomicBool,
    interval: Duration,
) {
    let mut seq: u64 = 0;
    let mut next_frame = Instant::now() + interval;
    while running.load(Ordering::Acquire) {
        let now = Instant::now();
        if now < next_frame {
            std::thread::park_timeout(next_frame - now);
            continue;
        }
        next_frame = now + interval;
        seq += 1;
        buffer.push(Frame {
            data: test_pattern(resolution, seq),
            width: resolution.width,
            height: resolution.height,
            timestamp_us: seq * interval.as_micros() as u64,
        });
    }
}
