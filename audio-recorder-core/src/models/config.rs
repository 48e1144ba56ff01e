use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::RecorderError;

/// Bytes per captured sample (16-bit mono).
pub const BYTES_PER_SAMPLE: usize = 2;

/// Highest sample rate whose byte rate still fits the header's 32-bit field.
pub const MAX_SAMPLE_RATE: u32 = u32::MAX / BYTES_PER_SAMPLE as u32;

/// Output container selected from the extension passed to `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputFormat {
    /// 44-byte RIFF header followed by 16-bit mono PCM.
    #[serde(rename = "pcm16-wav")]
    Pcm16Wav,
    /// Compressed container produced by a platform encoder (AAC/M4A).
    #[serde(rename = "opaque-container")]
    OpaqueContainer,
}

impl OutputFormat {
    /// `.wav` selects PCM; every other extension selects the compressed path.
    pub fn from_extension(extension: &str) -> Self {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "wav" => Self::Pcm16Wav,
            _ => Self::OpaqueContainer,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Pcm16Wav => "pcm16-wav",
            Self::OpaqueContainer => "opaque-container",
        }
    }
}

/// Value written to the WAV `BlockAlign` field.
///
/// Legacy recordings carry `1`. `Standard` writes `channels * bits / 8 = 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockAlign {
    #[default]
    Legacy,
    Standard,
}

impl BlockAlign {
    pub fn value(&self) -> u16 {
        match self {
            Self::Legacy => 1,
            Self::Standard => BYTES_PER_SAMPLE as u16,
        }
    }
}

/// Recorder-wide tuning, fixed for the lifetime of an `AudioRecorder`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderOptions {
    /// Lower bound on the capture block size in bytes (default: 1024).
    pub min_block_bytes: usize,

    /// Target capture block duration in milliseconds (default: 20).
    pub block_duration_ms: u32,

    /// Read buffer used while streaming segments into a container (default: 8192).
    pub copy_buffer_bytes: usize,

    /// `BlockAlign` header field policy (default: legacy `1`).
    pub block_align: BlockAlign,

    /// Sample rate used by `combine_files` before any `init` (default: 16000).
    pub default_sample_rate: u32,

    /// Suffix appended to the output path to name the temp segment (default: ".temp").
    pub temp_suffix: String,
}

impl RecorderOptions {
    pub fn validate(&self) -> Result<(), String> {
        if self.min_block_bytes == 0 || self.min_block_bytes % BYTES_PER_SAMPLE != 0 {
            return Err(format!(
                "minimum block size must be a positive multiple of {} bytes",
                BYTES_PER_SAMPLE
            ));
        }
        if self.copy_buffer_bytes == 0 {
            return Err("copy buffer must not be empty".into());
        }
        if self.default_sample_rate == 0 || self.default_sample_rate > MAX_SAMPLE_RATE {
            return Err(format!("unsupported default sample rate: {}", self.default_sample_rate));
        }
        if self.temp_suffix.is_empty() {
            return Err("temp suffix must not be empty".into());
        }
        Ok(())
    }
}

impl Default for RecorderOptions {
    fn default() -> Self {
        Self {
            min_block_bytes: 1024,
            block_duration_ms: 20,
            copy_buffer_bytes: 8192,
            block_align: BlockAlign::Legacy,
            default_sample_rate: 16_000,
            temp_suffix: ".temp".into(),
        }
    }
}

/// Per-session configuration, immutable between two `init` calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub sample_rate: u32,
    pub output_path: PathBuf,
    /// Extension string as supplied by the host (echoed as `audioFormat`).
    pub extension: String,
    pub format: OutputFormat,
    /// Capture block size in bytes; always a whole number of samples.
    pub block_bytes: usize,
    pub temp_path: PathBuf,
}

impl SessionConfig {
    /// Build a config, deriving the block size from the sample rate.
    ///
    /// `platform_min_bytes` is the audio source's own minimum buffer size;
    /// `None` means the platform could not compute one.
    pub fn new(
        sample_rate: u32,
        output_path: impl Into<PathBuf>,
        extension: &str,
        options: &RecorderOptions,
        platform_min_bytes: Option<usize>,
    ) -> Result<Self, RecorderError> {
        let output_path = output_path.into();
        if sample_rate == 0 || sample_rate > MAX_SAMPLE_RATE {
            return Err(RecorderError::ConfigError(format!(
                "unsupported sample rate: {}",
                sample_rate
            )));
        }
        if output_path.as_os_str().is_empty() {
            return Err(RecorderError::ConfigError("output path is empty".into()));
        }
        let platform_min = platform_min_bytes.ok_or_else(|| {
            RecorderError::ConfigError(format!(
                "audio source cannot provide a buffer size for {} Hz",
                sample_rate
            ))
        })?;

        let block_bytes = derive_block_bytes(sample_rate, options, platform_min);
        let temp_path = temp_segment_path(&output_path, &options.temp_suffix);

        Ok(Self {
            sample_rate,
            output_path,
            extension: extension.to_string(),
            format: OutputFormat::from_extension(extension),
            block_bytes,
            temp_path,
        })
    }

    /// Capture block size in samples.
    pub fn block_samples(&self) -> usize {
        self.block_bytes / BYTES_PER_SAMPLE
    }

    /// PCM bytes per second of audio.
    pub fn byte_rate(&self) -> u64 {
        self.sample_rate as u64 * BYTES_PER_SAMPLE as u64
    }

    /// Whole milliseconds of audio represented by `bytes` of PCM.
    pub fn duration_ms(&self, bytes: u64) -> u64 {
        bytes * 1000 / self.byte_rate()
    }
}

/// `<output>.temp` next to the final output file.
pub fn temp_segment_path(output_path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(output_path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn derive_block_bytes(sample_rate: u32, options: &RecorderOptions, platform_min: usize) -> usize {
    let per_duration =
        sample_rate as usize * BYTES_PER_SAMPLE * options.block_duration_ms as usize / 1000;
    let bytes = per_duration.max(options.min_block_bytes).max(platform_min);
    // Round up to a whole sample.
    bytes + bytes % BYTES_PER_SAMPLE
}
