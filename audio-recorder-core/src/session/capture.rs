use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::config::{OutputFormat, RecorderOptions, SessionConfig};
use crate::models::error::RecorderError;
use crate::models::events::InterruptionEvent;
use crate::models::snapshot::{LevelReading, SessionSnapshot};
use crate::models::state::SessionStatus;
use crate::processing::level_meter;
use crate::storage::container_writer::ContainerWriter;
use crate::storage::segment::AudioSegment;
use crate::storage::segment_sink::SegmentSink;
use crate::traits::audio_focus::{AudioFocus, UnmanagedFocus};
use crate::traits::audio_source::AudioSource;
use crate::traits::delegate::RecorderDelegate;
use crate::traits::encoder::ContainerEncoder;

/// Values written only by the capture loop while recording.
#[derive(Debug, Clone, Copy)]
struct CaptureCounters {
    bytes_captured: u64,
    levels: LevelReading,
}

impl CaptureCounters {
    fn new() -> Self {
        Self {
            bytes_captured: 0,
            levels: LevelReading::IDLE,
        }
    }
}

/// One recording: state machine, temp-segment capture and finalization.
///
/// Data flow while recording:
/// ```text
/// [AudioSource] → capture loop ─┬→ [SegmentSink: <path>.temp]
///                               └→ [LevelMeter] → peak/average
/// stop: <path>.temp → [ContainerWriter] → <path>
/// ```
///
/// Transitions take `&mut self`, so they are serialized by construction.
/// The capture loop runs on its own thread and is the only writer of the
/// byte counter and metering; pausing or stopping joins it before returning.
pub struct CaptureSession<S: AudioSource + 'static> {
    source: Arc<Mutex<S>>,
    focus: Arc<dyn AudioFocus>,
    encoder: Option<Arc<dyn ContainerEncoder>>,
    delegate: Option<Arc<dyn RecorderDelegate>>,
    options: RecorderOptions,
    writer: ContainerWriter,

    status: SessionStatus,
    config: Option<SessionConfig>,
    counters: Arc<Mutex<CaptureCounters>>,

    // Temp segment, shared with the capture loop while it runs
    sink: Arc<Mutex<Option<SegmentSink>>>,
    segment_created: bool,

    // Capture loop control
    running: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
    // Failure that ended the capture loop, reported by the next pause/stop
    fault: Arc<Mutex<Option<RecorderError>>>,

    final_snapshot: Option<SessionSnapshot>,
    final_error: Option<RecorderError>,
}

impl<S: AudioSource + 'static> CaptureSession<S> {
    pub fn new(source: S, options: RecorderOptions) -> Result<Self, RecorderError> {
        options.validate().map_err(RecorderError::ConfigError)?;
        Ok(Self {
            source: Arc::new(Mutex::new(source)),
            focus: Arc::new(UnmanagedFocus),
            encoder: None,
            delegate: None,
            writer: ContainerWriter::from_options(&options),
            options,
            status: SessionStatus::Unset,
            config: None,
            counters: Arc::new(Mutex::new(CaptureCounters::new())),
            sink: Arc::new(Mutex::new(None)),
            segment_created: false,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
            fault: Arc::new(Mutex::new(None)),
            final_snapshot: None,
            final_error: None,
        })
    }

    pub fn with_focus(mut self, focus: Arc<dyn AudioFocus>) -> Self {
        self.focus = focus;
        self
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn ContainerEncoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn RecorderDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    pub fn options(&self) -> &RecorderOptions {
        &self.options
    }

    pub fn writer(&self) -> &ContainerWriter {
        &self.writer
    }

    pub fn encoder(&self) -> Option<&Arc<dyn ContainerEncoder>> {
        self.encoder.as_ref()
    }

    /// Failure that ended the capture loop early, if one is pending.
    pub fn capture_fault(&self) -> Option<RecorderError> {
        self.fault.lock().clone()
    }

    /// Raw PCM bytes captured since the last `init`.
    pub fn bytes_captured(&self) -> u64 {
        self.counters.lock().bytes_captured
    }

    /// Reset to a fresh `Initialized` session. Valid from any state.
    ///
    /// A capture in progress is halted and its temp segment discarded.
    /// On `ConfigError` nothing changes.
    pub fn init(
        &mut self,
        sample_rate: u32,
        output_path: impl AsRef<Path>,
        extension: &str,
    ) -> Result<SessionSnapshot, RecorderError> {
        let platform_min = self.source.lock().min_block_bytes(sample_rate);
        let config = SessionConfig::new(
            sample_rate,
            output_path.as_ref(),
            extension,
            &self.options,
            platform_min,
        )?;

        if self.status.is_recording() || self.status.is_paused() {
            log::warn!("init while {}, discarding the current capture", self.status);
            self.abandon_capture();
        }

        log::info!(
            "session initialized: {} Hz, {} ({}), block {} bytes",
            config.sample_rate,
            config.output_path.display(),
            config.format.tag(),
            config.block_bytes
        );

        *self.counters.lock() = CaptureCounters::new();
        *self.fault.lock() = None;
        self.config = Some(config);
        self.segment_created = false;
        self.final_snapshot = None;
        self.final_error = None;
        self.set_status(SessionStatus::Initialized);
        Ok(self.current())
    }

    /// Begin capturing. Valid from `Initialized`, or from `Paused` where it
    /// behaves like `resume`.
    pub fn start(&mut self) -> Result<(), RecorderError> {
        if !self.status.can_start() {
            return Err(RecorderError::InvalidState(format!(
                "cannot start while {}",
                self.status
            )));
        }
        self.begin_capture()
    }

    /// Pause capturing. Valid from `Recording`.
    ///
    /// If the capture loop had already ended on a failure the session is
    /// still paused and the failure is returned as `CaptureInterrupted`.
    pub fn pause(&mut self) -> Result<(), RecorderError> {
        if !self.status.is_recording() {
            return Err(RecorderError::InvalidState(format!(
                "cannot pause while {}",
                self.status
            )));
        }

        self.halt_capture();
        if let Err(e) = self.source.lock().stop() {
            log::error!("failed to stop audio source on pause: {}", e);
        }
        if let Some(sink) = self.sink.lock().as_mut() {
            if let Err(e) = sink.flush() {
                log::error!("failed to flush temp segment: {}", e);
            }
        }
        self.counters.lock().levels = LevelReading::IDLE;
        self.focus.abandon();
        self.set_status(SessionStatus::Paused);

        match self.fault.lock().take() {
            Some(fault) => Err(RecorderError::CaptureInterrupted {
                snapshot: Box::new(self.current()),
                reason: fault.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Resume capturing into the same temp segment. Valid from `Paused`.
    pub fn resume(&mut self) -> Result<(), RecorderError> {
        if !self.status.is_paused() {
            return Err(RecorderError::InvalidState(format!(
                "cannot resume while {}",
                self.status
            )));
        }
        self.begin_capture()
    }

    /// Stop capturing and produce the output file.
    ///
    /// Idempotent: once stopped, returns the same result without touching
    /// the filesystem. If the container cannot be written the session is
    /// still `Stopped` and the error carries the captured snapshot. A
    /// capture loop that ended early is reported as `CaptureInterrupted`
    /// after the output has been written.
    pub fn stop(&mut self) -> Result<SessionSnapshot, RecorderError> {
        if self.status.is_stopped() {
            return match &self.final_error {
                Some(e) => Err(e.clone()),
                None => Ok(self.current()),
            };
        }
        if !self.status.can_stop() {
            return Err(RecorderError::InvalidState(format!(
                "cannot stop while {}",
                self.status
            )));
        }
        let Some(config) = self.config.clone() else {
            return Err(RecorderError::InvalidState("session has no configuration".into()));
        };

        self.release_capture();
        let fault = self.fault.lock().take();

        self.counters.lock().levels = LevelReading::IDLE;
        self.set_status(SessionStatus::Stopped);
        let snapshot = self.build_snapshot(&config);
        self.final_snapshot = Some(snapshot.clone());

        let sink_closed = match self.sink.lock().take() {
            Some(sink) => sink.close(),
            None => Ok(()),
        };

        let produced = sink_closed.and_then(|_| self.produce_output(&config));
        let result = match produced {
            Ok(()) => {
                if config.temp_path.exists() {
                    if let Err(e) = fs::remove_file(&config.temp_path) {
                        log::warn!(
                            "failed to delete temp segment {}: {}",
                            config.temp_path.display(),
                            e
                        );
                    }
                }
                log::info!(
                    "recording stopped: {} ms written to {}",
                    snapshot.duration_ms,
                    config.output_path.display()
                );
                match fault {
                    Some(fault) => Err(RecorderError::CaptureInterrupted {
                        snapshot: Box::new(snapshot),
                        reason: fault.to_string(),
                    }),
                    None => Ok(snapshot),
                }
            }
            Err(e) => {
                log::error!(
                    "recording captured but not finalized, temp segment kept at {}: {}",
                    config.temp_path.display(),
                    e
                );
                Err(RecorderError::FinalizeFailed {
                    snapshot: Box::new(snapshot),
                    reason: e.to_string(),
                })
            }
        };
        self.final_error = result.as_ref().err().cloned();
        result
    }

    /// Read-only view of the session.
    pub fn current(&self) -> SessionSnapshot {
        if let Some(snapshot) = &self.final_snapshot {
            return snapshot.clone();
        }
        match &self.config {
            Some(config) => self.build_snapshot(config),
            None => SessionSnapshot::default(),
        }
    }

    /// Forward a platform interruption to the delegate. Never changes state.
    pub fn handle_interruption(&self, event: InterruptionEvent) {
        log::info!("audio interruption while {}: {:?}", self.status, event);
        if let Some(ref delegate) = self.delegate {
            delegate.on_interruption(&event);
        }
    }

    // --- Internal helpers ---

    fn set_status(&mut self, status: SessionStatus) {
        if self.status != status {
            log::debug!("status {} → {}", self.status, status);
        }
        self.status = status;
        if let Some(ref delegate) = self.delegate {
            delegate.on_status_changed(status);
        }
    }

    fn build_snapshot(&self, config: &SessionConfig) -> SessionSnapshot {
        let counters = *self.counters.lock();
        let path = if self.status.is_stopped() {
            &config.output_path
        } else {
            &config.temp_path
        };
        SessionSnapshot {
            duration_ms: config.duration_ms(counters.bytes_captured),
            path: path.display().to_string(),
            audio_format: config.extension.clone(),
            peak_power: counters.levels.peak_power,
            average_power: counters.levels.average_power,
            is_metering_enabled: true,
            status: self.status,
        }
    }

    /// Shared tail of `start` and `resume`. Leaves status untouched on error.
    fn begin_capture(&mut self) -> Result<(), RecorderError> {
        let config = self
            .config
            .clone()
            .ok_or_else(|| RecorderError::InvalidState("session has no configuration".into()))?;

        if !self.focus.request() {
            log::warn!("could not get audio focus");
            return Err(RecorderError::FocusDenied);
        }

        {
            let mut sink = self.sink.lock();
            if sink.is_none() {
                match SegmentSink::open(&config.temp_path, !self.segment_created) {
                    Ok(opened) => *sink = Some(opened),
                    Err(e) => {
                        self.focus.abandon();
                        return Err(e);
                    }
                }
            }
        }
        self.segment_created = true;

        if let Err(e) = self.source.lock().start(config.sample_rate) {
            self.focus.abandon();
            return Err(e);
        }

        let previous = self.status;
        self.set_status(SessionStatus::Recording);
        if let Err(e) = self.spawn_capture_loop(config.block_samples()) {
            if let Err(stop_err) = self.source.lock().stop() {
                log::error!("failed to stop audio source: {}", stop_err);
            }
            self.focus.abandon();
            self.set_status(previous);
            return Err(e);
        }
        Ok(())
    }

    fn spawn_capture_loop(&mut self, block_samples: usize) -> Result<(), RecorderError> {
        self.running.store(true, Ordering::SeqCst);

        let capture = CaptureLoop {
            running: Arc::clone(&self.running),
            source: Arc::clone(&self.source),
            sink: Arc::clone(&self.sink),
            counters: Arc::clone(&self.counters),
            fault: Arc::clone(&self.fault),
            delegate: self.delegate.clone(),
            block_samples,
        };

        let handle = thread::Builder::new()
            .name("audio-capture".into())
            .spawn(move || capture.run())
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                RecorderError::Device(format!("failed to spawn capture thread: {}", e))
            })?;

        self.worker = Some(handle);
        Ok(())
    }

    /// Signal the capture loop and wait until it has stopped appending.
    fn halt_capture(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                let error = RecorderError::Device("capture thread panicked".into());
                log::error!("{}", error);
                if let Some(ref delegate) = self.delegate {
                    delegate.on_error(&error);
                }
                *self.fault.lock() = Some(error);
            }
        }
    }

    /// Halt the loop and hand the device and focus back. A paused session
    /// already stopped its source and gave up focus.
    fn release_capture(&mut self) {
        let was_recording = self.status.is_recording();
        self.halt_capture();
        {
            let mut source = self.source.lock();
            if was_recording {
                if let Err(e) = source.stop() {
                    log::error!("failed to stop audio source: {}", e);
                }
            }
            source.release();
        }
        if was_recording {
            self.focus.abandon();
        }
    }

    /// Tear down a live capture without producing output.
    fn abandon_capture(&mut self) {
        self.release_capture();
        if let Some(sink) = self.sink.lock().take() {
            let path = sink.path().to_path_buf();
            if let Err(e) = sink.close() {
                log::warn!("failed to close abandoned temp segment: {}", e);
            }
            if let Err(e) = fs::remove_file(&path) {
                log::warn!("failed to delete abandoned temp segment {}: {}", path.display(), e);
            }
        }
    }

    fn produce_output(&self, config: &SessionConfig) -> Result<(), RecorderError> {
        let has_segment = config.temp_path.exists();

        if config.format == OutputFormat::OpaqueContainer {
            if let Some(ref encoder) = self.encoder {
                let segments: Vec<_> = has_segment.then(|| config.temp_path.clone()).into_iter().collect();
                log::debug!("delegating {} to {}", config.output_path.display(), encoder.name());
                return encoder.encode(&segments, config.sample_rate, &config.output_path);
            }
            log::warn!(
                "no encoder for {}, writing PCM WAV to {}",
                config.extension,
                config.output_path.display()
            );
        }

        let segments = if has_segment {
            vec![AudioSegment::open_raw(&config.temp_path)?]
        } else {
            Vec::new()
        };
        let report = self
            .writer
            .finalize(segments, config.sample_rate, &config.output_path)?;
        log::debug!("container checksum {}", report.checksum);
        Ok(())
    }
}

impl<S: AudioSource + 'static> Drop for CaptureSession<S> {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.halt_capture();
            if let Err(e) = self.source.lock().stop() {
                log::error!("failed to stop audio source on drop: {}", e);
            }
        }
    }
}

/// State moved onto the capture thread.
struct CaptureLoop<S: AudioSource> {
    running: Arc<AtomicBool>,
    source: Arc<Mutex<S>>,
    sink: Arc<Mutex<Option<SegmentSink>>>,
    counters: Arc<Mutex<CaptureCounters>>,
    fault: Arc<Mutex<Option<RecorderError>>>,
    delegate: Option<Arc<dyn RecorderDelegate>>,
    block_samples: usize,
}

impl<S: AudioSource> CaptureLoop<S> {
    /// Read a block, append it, meter it; check the stop flag between blocks.
    fn run(self) {
        log::debug!("capture loop started, {} samples per block", self.block_samples);
        let mut block = vec![0i16; self.block_samples];

        while self.running.load(Ordering::SeqCst) {
            let read = self.source.lock().read_block(&mut block);
            let count = match read {
                Ok(0) => continue,
                Ok(n) => n.min(block.len()),
                Err(e) => {
                    self.fail(e);
                    break;
                }
            };
            let samples = &block[..count];

            let written = match self.sink.lock().as_mut() {
                Some(sink) => sink.write_samples(samples),
                None => {
                    self.fail(RecorderError::SinkUnavailable("temp segment is closed".into()));
                    break;
                }
            };
            let bytes = match written {
                Ok(bytes) => bytes as u64,
                Err(e) => {
                    self.fail(RecorderError::SinkUnavailable(e.to_string()));
                    break;
                }
            };

            let levels = level_meter::measure(samples, SessionStatus::Recording);
            {
                let mut counters = self.counters.lock();
                counters.bytes_captured += bytes;
                counters.levels = levels;
            }
            log::trace!("captured {} bytes", bytes);

            if let Some(ref delegate) = self.delegate {
                delegate.on_levels_updated(&levels);
            }
        }

        log::debug!("capture loop exited");
    }

    fn fail(&self, error: RecorderError) {
        log::error!("capture loop stopped: {}", error);
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(&error);
        }
        *self.fault.lock() = Some(error);
    }
}
