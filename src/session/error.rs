use thiserror::Error;

use crate::camera::error::CameraError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("a session is already running")]
    AlreadyExercising,

    #[error("the exercise cannot be changed while a session is running")]
    SelectorLocked,

    #[error("unknown exercise {0:?}")]
    UnknownExercise(String),

    #[error(transparent)]
    Capture(#[from] CameraError),
}
