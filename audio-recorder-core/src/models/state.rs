use std::fmt;

use serde::{Deserialize, Serialize};

/// Recording session state machine.
///
/// State transitions:
/// ```text
/// unset → initialized → recording ⇄ paused
///              ↓            ↓         ↓
///              └────────→ stopped ←───┘
/// ```
///
/// `init` is accepted from every state and always lands in `Initialized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Unset,
    Initialized,
    Recording,
    Paused,
    Stopped,
}

impl SessionStatus {
    /// Host-facing status string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Initialized => "initialized",
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Whether `start` may be called from this state.
    pub fn can_start(&self) -> bool {
        matches!(self, Self::Initialized | Self::Paused)
    }

    /// Whether `stop` performs a finalize from this state.
    pub fn can_stop(&self) -> bool {
        matches!(self, Self::Initialized | Self::Recording | Self::Paused)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
