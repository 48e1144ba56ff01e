use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::models::error::RecorderError;
use crate::models::events::{InterruptionEvent, RecorderEvent};
use crate::models::snapshot::LevelReading;
use crate::models::state::SessionStatus;

/// Event delegate for recorder notifications.
///
/// `on_levels_updated` is called from the capture thread once per block;
/// the rest are called from the control context. Implementations should
/// marshal to a UI thread if needed.
pub trait RecorderDelegate: Send + Sync {
    /// Called after every status transition.
    fn on_status_changed(&self, status: SessionStatus);

    /// Called with each new metering reading.
    fn on_levels_updated(&self, levels: &LevelReading);

    /// Called when the platform reports an audio interruption.
    fn on_interruption(&self, event: &InterruptionEvent);

    /// Called when the capture loop fails in the background.
    fn on_error(&self, error: &RecorderError);
}

/// Delegate that buffers events for a host to drain at its own pace.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Mutex<VecDeque<RecorderEvent>>,
    include_levels: bool,
}

impl EventQueue {
    /// Queue status, interruption and error events only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also queue every metering update.
    pub fn with_levels() -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            include_levels: true,
        }
    }

    /// Remove and return every queued event, oldest first.
    pub fn drain(&self) -> Vec<RecorderEvent> {
        self.events.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    fn push(&self, event: RecorderEvent) {
        self.events.lock().push_back(event);
    }
}

impl RecorderDelegate for EventQueue {
    fn on_status_changed(&self, status: SessionStatus) {
        self.push(RecorderEvent::StatusChanged(status));
    }

    fn on_levels_updated(&self, levels: &LevelReading) {
        if self.include_levels {
            self.push(RecorderEvent::LevelsUpdated(*levels));
        }
    }

    fn on_interruption(&self, event: &InterruptionEvent) {
        self.push(RecorderEvent::Interruption(*event));
    }

    fn on_error(&self, error: &RecorderError) {
        self.push(RecorderEvent::Error(error.to_string()));
    }
}
