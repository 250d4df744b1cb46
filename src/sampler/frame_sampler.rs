use thiserror::Error;

use crate::camera::backend::CaptureHandle;
use crate::camera::error::CameraError;
use crate::camera::types::Resolution;
use crate::sampler::compress::{self, EncodeError, FrameEncoding};
use crate::transport::protocol::FramePayload;

#[derive(Debug, Error)]
pub enum SampleError {
    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// One sampled frame, ready for the transport.
#[derive(Debug)]
pub struct Sample {
    pub payload: FramePayload,
    /// Resolution the frame was encoded at.
    pub resolution: Resolution,
}

/// Turns the current frame of a live stream into a [`FramePayload`].
///
/// Holds no per-tick state: every call reads, encodes and wraps a fresh
/// frame at the stream's own resolution.
#[derive(Debug, Clone, Copy)]
pub struct FrameSampler {
    encoding: FrameEncoding,
    jpeg_quality: u8,
}

impl FrameSampler {
    pub fn new(encoding: FrameEncoding, jpeg_quality: u8) -> Self {
        Self {
            encoding,
            jpeg_quality,
        }
    }

    pub fn encoding(&self) -> FrameEncoding {
        self.encoding
    }

    pub fn sample(
        &self,
        stream: &dyn CaptureHandle,
        exercise_kind: &str,
    ) -> Result<Sample, SampleError> {
        let frame = stream.read_frame()?;
        let encoded = compress::encode_frame(&frame, self.encoding, self.jpeg_quality)?;
        Ok(Sample {
            payload: FramePayload {
                image: compress::to_data_url(&encoded, self.encoding.mime_type()),
                exercise_kind: exercise_kind.to_string(),
            },
            resolution: frame.resolution(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::backend::CaptureSource;
    use crate::camera::dummy::DummyCamera;
    use crate::camera::types::CaptureRequest;
    use crate::sampler::compress::{parse_data_url, DEFAULT_JPEG_QUALITY};

    #[tokio::test]
    async fn sample_encodes_at_the_granted_resolution() {
        let camera = DummyCamera::new().with_native_resolution(Resolution::new(1280, 720));
        let mut stream = camera.acquire(&CaptureRequest::default()).await.unwrap();
        let sampler = FrameSampler::new(FrameEncoding::Jpeg, DEFAULT_JPEG_QUALITY);

        let sample = sampler.sample(stream.as_ref(), "squat").unwrap();
        assert_eq!(sample.resolution, Resolution::new(1280, 720));
        assert_eq!(sample.payload.exercise_kind, "squat");

        let data = parse_data_url(&sample.payload.image).unwrap();
        assert_eq!(data.mime_type, "image/jpeg");
        let decoded = image::load_from_memory(&data.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1280, 720));
        stream.stop();
    }

    #[tokio::test]
    async fn png_encoding_is_labelled_png() {
        let camera = DummyCamera::new().with_native_resolution(Resolution::new(16, 16));
        let mut stream = camera.acquire(&CaptureRequest::default()).await.unwrap();
        let sampler = FrameSampler::new(FrameEncoding::Png, DEFAULT_JPEG_QUALITY);

        let sample = sampler.sample(stream.as_ref(), "push_up").unwrap();
        assert!(sample.payload.image.starts_with("data:image/png;base64,"));
        stream.stop();
    }

    #[tokio::test]
    async fn stopped_stream_yields_camera_error() {
        let camera = DummyCamera::new().with_native_resolution(Resolution::new(8, 8));
        let mut stream = camera.acquire(&CaptureRequest::default()).await.unwrap();
        stream.stop();

        let sampler = FrameSampler::new(FrameEncoding::Jpeg, DEFAULT_JPEG_QUALITY);
        let err = sampler.sample(stream.as_ref(), "squat").unwrap_err();
        assert!(matches!(err, SampleError::Camera(CameraError::Stopped)));
    }
}
