use std::time::Duration;

use crate::error::AppError;

/// Notifications raised by a media backend, drained by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    MetadataLoaded { duration: f64 },
    TimeUpdate(f64),
    Ended,
    Error(String),
}

/// A single audio output, in the spirit of an HTML media element.
pub trait MediaBackend {
    /// Replace the current source. Metadata arrives later as an event.
    fn load(&mut self, data: Vec<u8>) -> Result<(), AppError>;
    fn play(&mut self) -> Result<(), AppError>;
    fn pause(&mut self);
    fn seek(&mut self, position: Duration) -> Result<(), AppError>;
    fn set_volume(&mut self, volume: f32);
    fn poll_event(&mut self) -> Option<MediaEvent>;
}

/// Backend that accepts every command and plays nothing. Useful when no
/// output device is available; metadata must be supplied by the caller.
#[derive(Debug, Default)]
pub struct NullBackend {
    pending: Vec<MediaEvent>,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event as if the device had raised it.
    pub fn push_event(&mut self, event: MediaEvent) {
        self.pending.push(event);
    }
}

impl MediaBackend for NullBackend {
    fn load(&mut self, _data: Vec<u8>) -> Result<(), AppError> {
        self.pending.clear();
        Ok(())
    }

    fn play(&mut self) -> Result<(), AppError> {
        Ok(())
    }

    fn pause(&mut self) {}

    fn seek(&mut self, _position: Duration) -> Result<(), AppError> {
        Ok(())
    }

    fn set_volume(&mut self, _volume: f32) {}

    fn poll_event(&mut self) -> Option<MediaEvent> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }
}
