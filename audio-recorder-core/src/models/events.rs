use serde::{Deserialize, Serialize};

use super::snapshot::LevelReading;
use super::state::SessionStatus;

/// Platform audio-focus / interruption notification.
///
/// Informational only: the session never pauses or resumes on its own
/// in response to one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InterruptionEvent {
    InterruptionBegan,
    InterruptionEndedWithResume,
    InterruptionEndedWithoutResume,
}

/// Everything a `RecorderDelegate` can observe, as a single queueable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum RecorderEvent {
    StatusChanged(SessionStatus),
    LevelsUpdated(LevelReading),
    Interruption(InterruptionEvent),
    Error(String),
}
