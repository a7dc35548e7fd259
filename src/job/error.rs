//! Job submission and lifecycle errors.

use std::time::Duration;

use crate::backend::BackendError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JobError {
    #[error("Load a video before submitting")]
    NoVideo,
    #[error("Unsupported video '{0}'; use mp4, avi, mov or mkv")]
    UnsupportedVideo(String),
    #[error("Draw at least one region before submitting")]
    NoRegions,
    #[error("Confidence threshold must be within [0, 1], got {0}")]
    InvalidConfidence(f32),
    #[error("Frame skip must be at least 1")]
    InvalidFrameSkip,
    #[error("A job is already running")]
    Busy,
    /// Reported by the backend; shown verbatim.
    #[error("{0}")]
    Backend(String),
    #[error("Connection problem: {0}")]
    Transport(String),
    #[error("Backend sent an unexpected status")]
    UnexpectedStatus,
    #[error("Timer unavailable: {0}")]
    TimerUnavailable(String),
    #[error("Job gave no result after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl From<BackendError> for JobError {
    fn from(e: BackendError) -> Self {
        if e.is_transport() {
            JobError::Transport(e.to_string())
        } else {
            JobError::Backend(e.user_message())
        }
    }
}
