//! Low-cost approximate level metering.
//!
//! Only the last sample of each captured block is inspected; this is not an
//! RMS meter. Peak mirrors average (no peak-hold window).

use crate::models::snapshot::LevelReading;
use crate::models::state::SessionStatus;

/// Full-scale reference for 16-bit samples.
const FULL_SCALE: f64 = 32768.0;

/// Calibration applied to the dB value to match the reference metering curve.
pub const SCALE_FACTOR: f64 = 0.25;

/// Measure a block of 16-bit samples.
///
/// Returns the idle floor when not recording, when the block is empty, or
/// when its last sample is zero.
pub fn measure(block: &[i16], status: SessionStatus) -> LevelReading {
    if !status.is_recording() {
        return LevelReading::IDLE;
    }
    let last = match block.last() {
        Some(&s) if s != 0 => s,
        _ => return LevelReading::IDLE,
    };

    let average = 20.0 * ((last as f64).abs() / FULL_SCALE).log10() * SCALE_FACTOR;
    LevelReading {
        peak_power: average,
        average_power: average,
    }
}
