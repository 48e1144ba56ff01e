use std::path::{Path, PathBuf};

use crate::models::error::RecorderError;

/// Platform encoder for compressed output containers (AAC/M4A).
///
/// Treated as a black box: it receives the ordered raw-PCM segment files
/// and must leave a finished container at `destination`.
pub trait ContainerEncoder: Send + Sync {
    /// Encode `segments` (16-bit mono PCM at `sample_rate`) into `destination`.
    fn encode(
        &self,
        segments: &[PathBuf],
        sample_rate: u32,
        destination: &Path,
    ) -> Result<(), RecorderError>;

    /// Encoder identifier for logs (e.g., "AVAssetExportSession").
    fn name(&self) -> &str;
}
