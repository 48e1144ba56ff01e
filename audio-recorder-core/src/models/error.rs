use thiserror::Error;

use super::snapshot::SessionSnapshot;

/// Errors that can occur during recording and container operations.
///
/// State-machine transitions that fail with `ConfigError`, `SinkUnavailable`,
/// `FocusDenied` or `Device` leave the session status unchanged.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecorderError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("temp segment sink unavailable: {0}")]
    SinkUnavailable(String),

    #[error("segment source unreadable: {0}")]
    SourceUnreadable(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("audio focus denied")]
    FocusDenied,

    #[error("audio device error: {0}")]
    Device(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("encoder failed: {0}")]
    EncoderFailed(String),

    /// Capture completed and the session is `Stopped`, but the output
    /// container could not be produced. The temp segment is left on disk.
    #[error("recording captured but finalize failed: {reason}")]
    FinalizeFailed {
        snapshot: Box<SessionSnapshot>,
        reason: String,
    },

    /// The capture loop ended early on a source or sink failure. Reported
    /// by the `pause` or `stop` that follows it; that transition still
    /// completes and the snapshot covers the audio captured before the
    /// failure.
    #[error("capture ended early: {reason}")]
    CaptureInterrupted {
        snapshot: Box<SessionSnapshot>,
        reason: String,
    },
}

impl RecorderError {
    /// The snapshot carried by a finalize or capture failure, if any.
    pub fn captured_snapshot(&self) -> Option<&SessionSnapshot> {
        match self {
            Self::FinalizeFailed { snapshot, .. } | Self::CaptureInterrupted { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }
}
