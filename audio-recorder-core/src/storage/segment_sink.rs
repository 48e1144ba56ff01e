use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::models::error::RecorderError;
use crate::processing::wav_format;

/// Append-only writer for the in-progress raw PCM temp segment.
///
/// Owned by exactly one capture session. No header is written; the file
/// holds only little-endian sample bytes.
#[derive(Debug)]
pub struct SegmentSink {
    path: PathBuf,
    writer: BufWriter<File>,
    scratch: Vec<u8>,
}

impl SegmentSink {
    /// Open `path`, truncating it when `fresh` and appending otherwise.
    pub fn open(path: &Path, fresh: bool) -> Result<Self, RecorderError> {
        let mut options = OpenOptions::new();
        options.create(true);
        if fresh {
            options.write(true).truncate(true);
        } else {
            options.append(true);
        }
        let file = options
            .open(path)
            .map_err(|e| RecorderError::SinkUnavailable(format!("{}: {}", path.display(), e)))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            scratch: Vec::new(),
        })
    }

    /// Append samples, returning the number of bytes written.
    pub fn write_samples(&mut self, samples: &[i16]) -> std::io::Result<usize> {
        self.scratch.clear();
        wav_format::samples_to_le_bytes(samples, &mut self.scratch);
        self.writer.write_all(&self.scratch)?;
        Ok(self.scratch.len())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }

    /// Flush buffered bytes to disk and close the file.
    pub fn close(mut self) -> Result<(), RecorderError> {
        self.writer
            .flush()
            .map_err(|e| RecorderError::SinkUnavailable(format!("{}: {}", self.path.display(), e)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
