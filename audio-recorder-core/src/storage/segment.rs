use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::models::error::RecorderError;
use crate::processing::wav_format::{WavHeader, WAV_HEADER_SIZE};

/// A readable run of raw 16-bit little-endian mono PCM with a known length.
///
/// Exists only for the duration of a finalize call.
pub struct AudioSegment {
    label: String,
    reader: Box<dyn Read + Send>,
    len: u64,
}

impl AudioSegment {
    /// Wrap an already-open byte source of `len` payload bytes.
    pub fn from_reader(label: impl Into<String>, reader: impl Read + Send + 'static, len: u64) -> Self {
        Self {
            label: label.into(),
            reader: Box::new(reader),
            len,
        }
    }

    /// Open a headerless PCM file; every byte is payload.
    pub fn open_raw(path: &Path) -> Result<Self, RecorderError> {
        let (file, len) = open_with_len(path)?;
        Ok(Self::from_reader(path.display().to_string(), BufReader::new(file), len))
    }

    /// Open a PCM file, skipping a canonical 44-byte WAV header if present.
    ///
    /// Lets previously finalized recordings be stitched without their
    /// headers leaking into the payload.
    pub fn open(path: &Path) -> Result<Self, RecorderError> {
        let (mut file, file_len) = open_with_len(path)?;
        let label = path.display().to_string();

        if file_len >= WAV_HEADER_SIZE as u64 {
            let mut head = [0u8; WAV_HEADER_SIZE];
            file.read_exact(&mut head).map_err(|e| unreadable(&label, e))?;

            if let Some(header) = WavHeader::parse(&head) {
                let payload = (header.data_size as u64).min(file_len - WAV_HEADER_SIZE as u64);
                log::debug!("{} carries a WAV header, using {} payload bytes", label, payload);
                let reader = BufReader::new(file).take(payload);
                return Ok(Self::from_reader(label, reader, payload));
            }
            file.seek(SeekFrom::Start(0)).map_err(|e| unreadable(&label, e))?;
        }

        Ok(Self::from_reader(label, BufReader::new(file), file_len))
    }

    /// Payload length in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn into_parts(self) -> (String, Box<dyn Read + Send>, u64) {
        (self.label, self.reader, self.len)
    }
}

impl fmt::Debug for AudioSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioSegment")
            .field("label", &self.label)
            .field("len", &self.len)
            .finish()
    }
}

fn open_with_len(path: &Path) -> Result<(File, u64), RecorderError> {
    let label = path.display().to_string();
    let file = File::open(path).map_err(|e| unreadable(&label, e))?;
    let len = file.metadata().map_err(|e| unreadable(&label, e))?.len();
    Ok((file, len))
}

fn unreadable(label: &str, e: std::io::Error) -> RecorderError {
    RecorderError::SourceUnreadable(format!("{}: {}", label, e))
}
