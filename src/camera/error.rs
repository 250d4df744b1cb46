use thiserror::Error;

/// Capture device errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),

    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("stream has not produced a frame yet")]
    NoFrame,

    #[error("capture stream stopped")]
    Stopped,

    #[error("capture failed: {0}")]
    Capture(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, CameraError>;
