use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::models::config::{OutputFormat, RecorderOptions};
use crate::models::error::RecorderError;
use crate::models::events::InterruptionEvent;
use crate::models::snapshot::SessionSnapshot;
use crate::session::capture::CaptureSession;
use crate::traits::audio_focus::AudioFocus;
use crate::traits::audio_source::AudioSource;
use crate::traits::delegate::RecorderDelegate;
use crate::traits::encoder::ContainerEncoder;
use crate::traits::permissions::{AlwaysGranted, PermissionProvider};

/// Host-facing recorder surface.
///
/// One instance is owned by the host integration layer and receives every
/// method call from the bridge. Arguments arrive in host types (`i64`,
/// strings); results are `SessionSnapshot`s or plain strings.
pub struct AudioRecorder<S: AudioSource + 'static> {
    session: CaptureSession<S>,
    permissions: Arc<dyn PermissionProvider>,
}

impl<S: AudioSource + 'static> AudioRecorder<S> {
    pub fn new(source: S, options: RecorderOptions) -> Result<Self, RecorderError> {
        Ok(Self {
            session: CaptureSession::new(source, options)?,
            permissions: Arc::new(AlwaysGranted),
        })
    }

    pub fn with_permissions(mut self, permissions: Arc<dyn PermissionProvider>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_focus(mut self, focus: Arc<dyn AudioFocus>) -> Self {
        self.session = self.session.with_focus(focus);
        self
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn ContainerEncoder>) -> Self {
        self.session = self.session.with_encoder(encoder);
        self
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn RecorderDelegate>) {
        self.session.set_delegate(delegate);
    }

    pub fn session(&self) -> &CaptureSession<S> {
        &self.session
    }

    /// Whether recording is permitted. Denial is `false`, not an error.
    pub fn has_permissions(&self) -> bool {
        let granted = self.permissions.has_permissions();
        log::debug!("has_permissions: {}", granted);
        granted
    }

    pub fn init(&mut self, sample_rate: i64, path: &str, extension: &str) -> Result<SessionSnapshot, RecorderError> {
        let sample_rate = u32::try_from(sample_rate)
            .map_err(|_| RecorderError::ConfigError(format!("unsupported sample rate: {}", sample_rate)))?;
        self.session.init(sample_rate, path, extension)
    }

    pub fn current(&self) -> SessionSnapshot {
        self.session.current()
    }

    pub fn start(&mut self) -> Result<(), RecorderError> {
        self.session.start()
    }

    pub fn pause(&mut self) -> Result<(), RecorderError> {
        self.session.pause()
    }

    pub fn resume(&mut self) -> Result<(), RecorderError> {
        self.session.resume()
    }

    pub fn stop(&mut self) -> Result<SessionSnapshot, RecorderError> {
        self.session.stop()
    }

    /// Stitch existing recordings into `output_path`, returning that path.
    ///
    /// Uses the sample rate of the current session, or the configured
    /// default before any `init`. A compressed output extension is handed
    /// to the encoder when one is installed.
    pub fn combine_files<P: AsRef<Path>>(&self, files: &[P], output_path: &str) -> Result<String, RecorderError> {
        let sample_rate = self
            .session
            .config()
            .map(|c| c.sample_rate)
            .unwrap_or(self.session.options().default_sample_rate);
        let destination = Path::new(output_path);
        let extension = destination
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();

        log::info!("combining {} files into {}", files.len(), output_path);

        if OutputFormat::from_extension(&extension) == OutputFormat::OpaqueContainer {
            if let Some(encoder) = self.session.encoder() {
                let sources: Vec<PathBuf> = files.iter().map(|f| f.as_ref().to_path_buf()).collect();
                encoder.encode(&sources, sample_rate, destination)?;
                return Ok(output_path.to_string());
            }
        }

        self.session.writer().combine(files, sample_rate, destination)?;
        Ok(output_path.to_string())
    }

    /// Forward a platform interruption; informational only.
    pub fn handle_interruption(&self, event: InterruptionEvent) {
        self.session.handle_interruption(event);
    }
}
