use serde::{Deserialize, Serialize};

use super::state::SessionStatus;

/// Level reported whenever there is nothing to meter.
pub const IDLE_FLOOR_DB: f64 = -120.0;

/// Metering snapshot on a decibel-like scale (`IDLE_FLOOR_DB` = silence).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelReading {
    pub peak_power: f64,
    pub average_power: f64,
}

impl LevelReading {
    pub const IDLE: Self = Self {
        peak_power: IDLE_FLOOR_DB,
        average_power: IDLE_FLOOR_DB,
    };

    pub fn is_idle(&self) -> bool {
        self.peak_power == IDLE_FLOOR_DB && self.average_power == IDLE_FLOOR_DB
    }
}

impl Default for LevelReading {
    fn default() -> Self {
        Self::IDLE
    }
}

/// Host-facing view of a recording session.
///
/// Serializes with the keys the host bridge expects
/// (`duration`, `path`, `audioFormat`, `peakPower`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Whole milliseconds captured. Serialized under the bridge's
    /// `duration` key rather than `durationMs`.
    #[serde(rename = "duration")]
    pub duration_ms: u64,
    pub path: String,
    pub audio_format: String,
    pub peak_power: f64,
    pub average_power: f64,
    pub is_metering_enabled: bool,
    pub status: SessionStatus,
}

impl SessionSnapshot {
    pub fn levels(&self) -> LevelReading {
        LevelReading {
            peak_power: self.peak_power,
            average_power: self.average_power,
        }
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            duration_ms: 0,
            path: String::new(),
            audio_format: String::new(),
            peak_power: IDLE_FLOOR_DB,
            average_power: IDLE_FLOOR_DB,
            is_metering_enabled: true,
            status: SessionStatus::Unset,
        }
    }
}
