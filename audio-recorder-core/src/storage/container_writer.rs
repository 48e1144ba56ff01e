use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::config::{BlockAlign, RecorderOptions};
use crate::models::error::RecorderError;
use crate::processing::wav_format::{self, WAV_HEADER_SIZE};
use crate::storage::segment::AudioSegment;

/// Largest payload a 32-bit RIFF size field can describe.
const MAX_DATA_SIZE: u64 = u32::MAX as u64 - 36;

/// Outcome of a finalize or combine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerReport {
    pub path: PathBuf,
    /// PCM payload bytes after the header (`Subchunk2Size`).
    pub data_bytes: u64,
    /// SHA-256 hex digest of the whole written file.
    pub checksum: String,
}

/// Streams one or more raw PCM segments into a single WAV container.
///
/// ## File Format
/// ```text
/// [44-byte WAV header, sizes computed from the summed segment lengths]
/// [segment 1 payload][segment 2 payload]...
/// ```
///
/// Payload is copied in `copy_buffer_bytes` blocks, so memory use does not
/// grow with segment size. On failure a partial destination file may be
/// left behind; removing it is the caller's job.
#[derive(Debug, Clone)]
pub struct ContainerWriter {
    copy_buffer_bytes: usize,
    block_align: BlockAlign,
}

impl ContainerWriter {
    pub fn new(copy_buffer_bytes: usize, block_align: BlockAlign) -> Self {
        Self {
            copy_buffer_bytes: copy_buffer_bytes.max(1),
            block_align,
        }
    }

    pub fn from_options(options: &RecorderOptions) -> Self {
        Self::new(options.copy_buffer_bytes, options.block_align)
    }

    /// Concatenate `segments` in order behind a header for `sample_rate`.
    pub fn finalize(
        &self,
        segments: Vec<AudioSegment>,
        sample_rate: u32,
        destination: &Path,
    ) -> Result<ContainerReport, RecorderError> {
        let total: u64 = segments.iter().map(AudioSegment::len).sum();
        if total > MAX_DATA_SIZE {
            return Err(RecorderError::StorageError(format!(
                "{} payload bytes exceed the WAV size limit",
                total
            )));
        }

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| RecorderError::StorageError(format!("failed to create directory: {}", e)))?;
        }
        let file = File::create(destination)
            .map_err(|e| RecorderError::StorageError(format!("failed to create {}: {}", destination.display(), e)))?;
        let mut out = HashingWriter::new(BufWriter::new(file));

        let header = wav_format::generate_wav_header(sample_rate, total as u32, self.block_align);
        out.write_all(&header).map_err(write_failed)?;

        let mut buf = vec![0u8; self.copy_buffer_bytes];
        for segment in segments {
            let (label, mut reader, len) = segment.into_parts();
            let copied = copy_exact(&mut reader, &mut out, &mut buf, len, &label)?;
            log::debug!("appended {} bytes from {}", copied, label);
        }

        let checksum = out.finish().map_err(write_failed)?;
        log::info!(
            "wrote {} ({} header + {} payload bytes, {} Hz)",
            destination.display(),
            WAV_HEADER_SIZE,
            total,
            sample_rate
        );

        Ok(ContainerReport {
            path: destination.to_path_buf(),
            data_bytes: total,
            checksum,
        })
    }

    /// Stitch existing PCM files, independent of any live session.
    ///
    /// Every source is opened before the destination is created, so a
    /// missing input never produces an output file.
    pub fn combine<P: AsRef<Path>>(
        &self,
        paths: &[P],
        sample_rate: u32,
        destination: &Path,
    ) -> Result<ContainerReport, RecorderError> {
        let segments = paths
            .iter()
            .map(|p| AudioSegment::open(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        self.finalize(segments, sample_rate, destination)
    }
}

impl Default for ContainerWriter {
    fn default() -> Self {
        Self::from_options(&RecorderOptions::default())
    }
}

/// Copy exactly `len` bytes; a source that ends early is unreadable.
fn copy_exact(
    reader: &mut dyn Read,
    out: &mut impl Write,
    buf: &mut [u8],
    len: u64,
    label: &str,
) -> Result<u64, RecorderError> {
    let mut remaining = len;
    while remaining > 0 {
        let want = remaining.min(buf.len() as u64) as usize;
        let n = match reader.read(&mut buf[..want]) {
            Ok(0) => {
                return Err(RecorderError::SourceUnreadable(format!(
                    "{} ended after {} of {} bytes",
                    label,
                    len - remaining,
                    len
                )))
            }
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(RecorderError::SourceUnreadable(format!("{}: {}", label, e))),
        };
        out.write_all(&buf[..n]).map_err(write_failed)?;
        remaining -= n as u64;
    }
    Ok(len)
}

fn write_failed(e: std::io::Error) -> RecorderError {
    RecorderError::StorageError(format!("write failed: {}", e))
}

/// Writer that hashes everything passing through it.
struct HashingWriter<W: Write> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> HashingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    /// Flush and return the hex digest.
    fn finish(mut self) -> std::io::Result<String> {
        self.inner.flush()?;
        Ok(hex_encode(&self.hasher.finalize()))
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(data)?;
        self.hasher.update(&data[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::wav_format::WavHeader;
    use std::io::Cursor;

    fn pattern(len: usize, seed: u8) -> Vec<u8> {
        (0..len).map(|i| (i as u8).wrapping_mul(7).wrapping_add(seed)).collect()
    }

    #[test]
    fn single_segment_header_fields() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("single.wav");
        let payload = pattern(1000, 3);

        let writer = ContainerWriter::default();
        let segment = AudioSegment::from_reader("mem", Cursor::new(payload.clone()), 1000);
        let report = writer.finalize(vec![segment], 22050, &out).unwrap();
        assert_eq!(report.data_bytes, 1000);
        assert_eq!(report.path, out);

        let bytes = fs::read(&out).unwrap();
        assert_eq!(bytes.len(), 44 + 1000);
        let header = WavHeader::parse(&bytes).unwrap();
        assert_eq!(header.chunk_size, 1036);
        assert_eq!(header.sample_rate, 22050);
        assert_eq!(header.byte_rate, 44100);
        assert_eq!(header.block_align, 1);
        assert_eq!(header.data_size, 1000);
        assert_eq!(&bytes[44..], &payload[..]);
    }

    #[test]
    fn combine_concatenates_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.pcm");
        let b = dir.path().join("b.pcm");
        let seg_a = pattern(3000, 1);
        let seg_b = pattern(777, 200);
        fs::write(&a, &seg_a).unwrap();
        fs::write(&b, &seg_b).unwrap();

        // Small copy buffer forces many partial blocks.
        let writer = ContainerWriter::new(64, BlockAlign::Legacy);
        let out = dir.path().join("out.wav");
        writer.combine(&[&a, &b], 16000, &out).unwrap();

        let bytes = fs::read(&out).unwrap();
        let header = WavHeader::parse(&bytes).unwrap();
        assert_eq!(header.data_size as usize, seg_a.len() + seg_b.len());
        let mut expected = seg_a.clone();
        expected.extend_from_slice(&seg_b);
        assert_eq!(&bytes[44..], &expected[..]);
    }

    #[test]
    fn combine_strips_headers_of_finished_recordings() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ContainerWriter::default();

        let first = dir.path().join("first.wav");
        let raw = dir.path().join("raw.pcm");
        fs::write(&raw, pattern(100, 0)).unwrap();
        writer.combine(&[&raw], 16000, &first).unwrap();

        let out = dir.path().join("joined.wav");
        writer.combine(&[&first, &raw], 16000, &out).unwrap();

        let bytes = fs::read(&out).unwrap();
        assert_eq!(WavHeader::parse(&bytes).unwrap().data_size, 200);
        assert_eq!(bytes.len(), 244);
    }

    #[test]
    fn combine_missing_source_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.wav");
        let err = ContainerWriter::default()
            .combine(&[dir.path().join("missing.pcm")], 16000, &out)
            .unwrap_err();
        assert!(matches!(err, RecorderError::SourceUnreadable(_)));
        assert!(!out.exists());
    }

    #[test]
    fn short_source_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("short.wav");
        let segment = AudioSegment::from_reader("short", Cursor::new(vec![0u8; 10]), 20);
        let err = ContainerWriter::default()
            .finalize(vec![segment], 16000, &out)
            .unwrap_err();
        assert!(matches!(err, RecorderError::SourceUnreadable(_)));
    }

    #[test]
    fn empty_segment_list_writes_bare_header() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/empty.wav");
        let report = ContainerWriter::new(128, BlockAlign::Standard)
            .finalize(Vec::new(), 8000, &out)
            .unwrap();
        assert_eq!(report.data_bytes, 0);

        let bytes = fs::read(&out).unwrap();
        let header = WavHeader::parse(&bytes).unwrap();
        assert_eq!(bytes.len(), 44);
        assert_eq!(header.chunk_size, 36);
        assert_eq!(header.block_align, 2);
    }

    #[test]
    fn checksum_matches_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("sum.wav");
        let segment = AudioSegment::from_reader("mem", Cursor::new(pattern(50, 9)), 50);
        let report = ContainerWriter::default()
            .finalize(vec![segment], 16000, &out)
            .unwrap();

        let digest = Sha256::digest(fs::read(&out).unwrap());
        assert_eq!(report.checksum, hex_encode(&digest));
        assert_eq!(report.checksum.len(), 64);
    }
}
