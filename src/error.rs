//! Failure taxonomy shared by the recorder engine and its callers.

use std::path::PathBuf;
use thiserror::Error;

/// Every synchronous failure the recorder can report.
///
/// Capture failures that happen mid-recording never come back through a
/// `Result`; they end the session and ride on the stop event instead.
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("input device '{device}' unavailable: {reason}")]
    DeviceUnavailable { device: String, reason: String },

    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("no recording in progress")]
    NotRecording,

    #[error("no samples captured; nothing to save")]
    NoSamples,

    #[error("audio capture failed: {0}")]
    CaptureFailure(String),

    #[error("failed to write '{}': {source}", path.display())]
    PersistenceFailure {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("invalid silence settings: {0}")]
    InvalidSilenceConfig(String),

    #[error("failed to spawn capture thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}

impl RecorderError {
    /// True for the "nothing is (or was) being recorded" class of failures.
    pub fn is_not_recording(&self) -> bool {
        matches!(self, RecorderError::NotRecording | RecorderError::NoSamples)
    }

    /// Short stable label for logs and JSON output.
    pub fn label(&self) -> &'static str {
        match self {
            RecorderError::DeviceUnavailable { .. } => "device_unavailable",
            RecorderError::AlreadyRecording => "already_recording",
            RecorderError::NotRecording => "not_recording",
            RecorderError::NoSamples => "no_samples",
            RecorderError::CaptureFailure(_) => "capture_failure",
            RecorderError::PersistenceFailure { .. } => "persistence_failure",
            RecorderError::InvalidSilenceConfig(_) => "invalid_silence_config",
            RecorderError::WorkerSpawn(_) => "worker_spawn",
        }
    }
}
