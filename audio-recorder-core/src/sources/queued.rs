//! Audio source fed by platform capture callbacks.
//!
//! Callback-driven backends push samples through a `QueueHandle`; the
//! capture loop pulls fixed-size blocks from the paired `QueuedSource`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::models::error::RecorderError;
use crate::processing::ring_buffer::RingBuffer;
use crate::traits::audio_source::AudioSource;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(20);

struct Shared {
    buffer: Mutex<RingBuffer>,
    ready: Condvar,
    // Written only while `buffer` is locked.
    active: AtomicBool,
}

/// Producer side, cheap to clone into callbacks.
#[derive(Clone)]
pub struct QueueHandle {
    shared: Arc<Shared>,
}

impl QueueHandle {
    /// Queue samples for the capture loop. Returns how many old samples
    /// were dropped because the queue was full.
    ///
    /// Samples pushed while the source is not started are discarded.
    pub fn push(&self, samples: &[i16]) -> usize {
        let dropped = {
            let mut buffer = self.shared.buffer.lock();
            if !self.shared.active.load(Ordering::SeqCst) {
                log::trace!("source inactive, discarding {} samples", samples.len());
                return 0;
            }
            buffer.write(samples)
        };
        if dropped > 0 {
            log::warn!("sample queue overflow, dropped {} samples", dropped);
        }
        self.shared.ready.notify_one();
        dropped
    }

    /// Samples queued but not yet read.
    pub fn pending(&self) -> usize {
        self.shared.buffer.lock().count()
    }

    /// Total samples lost to overflow.
    pub fn dropped(&self) -> u64 {
        self.shared.buffer.lock().dropped()
    }

    /// Whether pushed samples are currently accepted.
    pub fn is_accepting(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }
}

/// Consumer side, handed to a `CaptureSession`.
pub struct QueuedSource {
    shared: Arc<Shared>,
    poll_interval: Duration,
    min_block_bytes: usize,
}

impl QueuedSource {
    /// Create a source holding at most `capacity` samples.
    pub fn new(capacity: usize) -> (Self, QueueHandle) {
        let shared = Arc::new(Shared {
            buffer: Mutex::new(RingBuffer::new(capacity)),
            ready: Condvar::new(),
            active: AtomicBool::new(false),
        });
        let source = Self {
            shared: Arc::clone(&shared),
            poll_interval: DEFAULT_POLL_INTERVAL,
            min_block_bytes: 0,
        };
        (source, QueueHandle { shared })
    }

    /// Longest a read waits for samples before returning an empty block.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Minimum buffer size to report, mirroring the backing device.
    pub fn with_min_block_bytes(mut self, bytes: usize) -> Self {
        self.min_block_bytes = bytes;
        self
    }

    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    fn set_active(&self, active: bool) {
        let mut buffer = self.shared.buffer.lock();
        if active {
            // Drop anything left over from before this start.
            let stale = buffer.count();
            if stale > 0 {
                log::debug!("discarding {} stale queued samples", stale);
            }
            buffer.clear();
        }
        self.shared.active.store(active, Ordering::SeqCst);
    }
}

impl AudioSource for QueuedSource {
    fn min_block_bytes(&self, _sample_rate: u32) -> Option<usize> {
        Some(self.min_block_bytes)
    }

    fn start(&mut self, sample_rate: u32) -> Result<(), RecorderError> {
        log::debug!("queued source active at {} Hz", sample_rate);
        self.set_active(true);
        Ok(())
    }

    fn read_block(&mut self, buf: &mut [i16]) -> Result<usize, RecorderError> {
        if !self.is_active() {
            return Err(RecorderError::Device("queued source is not started".into()));
        }
        let mut buffer = self.shared.buffer.lock();
        if buffer.is_empty() {
            self.shared.ready.wait_for(&mut buffer, self.poll_interval);
        }
        Ok(buffer.read_into(buf))
    }

    fn stop(&mut self) -> Result<(), RecorderError> {
        self.set_active(false);
        Ok(())
    }

    fn release(&mut self) {
        let mut buffer = self.shared.buffer.lock();
        self.shared.active.store(false, Ordering::SeqCst);
        buffer.reset();
    }
}
