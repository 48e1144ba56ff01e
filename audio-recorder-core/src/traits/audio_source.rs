use crate::models::error::RecorderError;

/// Interface for the microphone capture primitive.
///
/// Delivers blocks of signed 16-bit mono samples at the configured rate.
/// The capture loop calls `read_block` from a dedicated worker thread, one
/// block at a time, and checks its stop flag between calls. A source that
/// blocks forever stalls the loop; implementations should return `Ok(0)`
/// periodically when no audio is available.
pub trait AudioSource: Send {
    /// Platform minimum buffer size in bytes for `sample_rate`.
    ///
    /// `None` means the platform cannot record at that rate.
    fn min_block_bytes(&self, sample_rate: u32) -> Option<usize> {
        let _ = sample_rate;
        Some(0)
    }

    /// Begin delivering audio at `sample_rate`. Called on start and resume.
    fn start(&mut self, sample_rate: u32) -> Result<(), RecorderError>;

    /// Fill `buf` with up to `buf.len()` samples, returning how many were written.
    fn read_block(&mut self, buf: &mut [i16]) -> Result<usize, RecorderError>;

    /// Stop delivering audio. Called on pause and stop.
    fn stop(&mut self) -> Result<(), RecorderError>;

    /// Release the underlying device. Called once the session is stopped.
    fn release(&mut self) {}
}
