//! # audio-recorder-core
//!
//! Microphone recording engine behind a host-application control surface.
//!
//! Tracks the recording session state machine, streams captured 16-bit mono
//! PCM to a temp segment while metering levels, and finalizes one or more
//! raw segments into a byte-exact WAV container. Platform pieces (audio
//! source, focus, permissions, compressed encoder) plug in through traits.
//!
//! ## Architecture
//!
//! ```text
//! audio-recorder-core (this crate)
//! ├── traits/       ← AudioSource, AudioFocus, PermissionProvider, RecorderDelegate, ContainerEncoder
//! ├── models/       ← RecorderError, SessionStatus, SessionConfig, SessionSnapshot, events
//! ├── processing/   ← level meter, RingBuffer, WAV header generation
//! ├── session/      ← CaptureSession (state machine), AudioRecorder (host surface)
//! ├── sources/      ← QueuedSource for callback-driven backends
//! └── storage/      ← SegmentSink, AudioSegment, ContainerWriter
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod sources;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::{BlockAlign, OutputFormat, RecorderOptions, SessionConfig};
pub use models::error::RecorderError;
pub use models::events::{InterruptionEvent, RecorderEvent};
pub use models::snapshot::{LevelReading, SessionSnapshot, IDLE_FLOOR_DB};
pub use models::state::SessionStatus;
pub use processing::ring_buffer::RingBuffer;
pub use processing::wav_format::WavHeader;
pub use session::capture::CaptureSession;
pub use session::recorder::AudioRecorder;
pub use sources::queued::{QueueHandle, QueuedSource};
pub use storage::container_writer::{ContainerReport, ContainerWriter};
pub use storage::segment::AudioSegment;
pub use traits::audio_focus::{AudioFocus, UnmanagedFocus};
pub use traits::audio_source::AudioSource;
pub use traits::delegate::{EventQueue, RecorderDelegate};
pub use traits::encoder::ContainerEncoder;
pub use traits::permissions::{AlwaysGranted, PermissionProvider};
