use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use super::backend::{MediaBackend, MediaEvent};
use crate::error::AppError;

/// Plays audio on the default output device.
pub struct RodioBackend {
    // Dropping the stream silences the sink.
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
    data: Option<Arc<[u8]>>,
    volume: f32,
    offset: Duration,
    started: Option<Instant>,
    last_update: Option<Instant>,
    events: VecDeque<MediaEvent>,
}

const UPDATE_INTERVAL: Duration = Duration::from_millis(250);

impl RodioBackend {
    pub fn try_default() -> Result<Self, AppError> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| AppError::Media(format!("No audio output device: {}", e)))?;
        Ok(Self {
            _stream: stream,
            handle,
            sink: None,
            data: None,
            volume: 1.0,
            offset: Duration::ZERO,
            started: None,
            last_update: None,
            events: VecDeque::new(),
        })
    }

    fn position(&self) -> Duration {
        match self.started {
            Some(started) => self.offset + started.elapsed(),
            None => self.offset,
        }
    }

    fn decoder(&self) -> Result<Decoder<Cursor<Arc<[u8]>>>, AppError> {
        let data = self
            .data
            .clone()
            .ok_or_else(|| AppError::Media("No audio loaded".into()))?;
        Decoder::new(Cursor::new(data))
            .map_err(|e| AppError::Media(format!("Failed to decode audio: {}", e)))
    }

    /// Fresh sink holding the whole source, paused.
    fn rebuild_sink(&mut self) -> Result<(), AppError> {
        let source = self.decoder()?;
        let sink = Sink::try_new(&self.handle)
            .map_err(|e| AppError::Media(format!("Failed to open audio sink: {}", e)))?;
        sink.pause();
        sink.set_volume(self.volume);
        sink.append(source);
        self.sink = Some(sink);
        self.offset = Duration::ZERO;
        self.started = None;
        Ok(())
    }

    fn duration(&self) -> Result<f64, AppError> {
        let decoder = self.decoder()?;
        if let Some(total) = decoder.total_duration() {
            return Ok(total.as_secs_f64());
        }
        let per_second = decoder.channels() as f64 * decoder.sample_rate() as f64;
        if per_second == 0.0 {
            return Ok(0.0);
        }
        Ok(decoder.count() as f64 / per_second)
    }
}

impl MediaBackend for RodioBackend {
    fn load(&mut self, data: Vec<u8>) -> Result<(), AppError> {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.events.clear();
        self.data = Some(Arc::from(data));

        match self.rebuild_sink().and_then(|_| self.duration()) {
            Ok(duration) => self.events.push_back(MediaEvent::MetadataLoaded { duration }),
            Err(e) => self.events.push_back(MediaEvent::Error(e.to_string())),
        }
        Ok(())
    }

    fn play(&mut self) -> Result<(), AppError> {
        let finished = self.sink.as_ref().map_or(true, |s| s.empty());
        if finished {
            self.rebuild_sink()?;
        }
        if let Some(sink) = &self.sink {
            sink.play();
            self.started = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
        self.offset = self.position();
        self.started = None;
    }

    fn seek(&mut self, position: Duration) -> Result<(), AppError> {
        let sink = self
            .sink
            .as_ref()
            .ok_or_else(|| AppError::Media("No audio loaded".into()))?;
        sink.try_seek(position)
            .map_err(|e| AppError::Media(format!("Seek failed: {}", e)))?;
        self.offset = position;
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(sink) = &self.sink {
            sink.set_volume(volume);
        }
    }

    fn poll_event(&mut self) -> Option<MediaEvent> {
        if let Some(event) = self.events.pop_front() {
            return Some(event);
        }

        if self.started.is_none() {
            return None;
        }
        let ended = self.sink.as_ref().map_or(false, |s| s.empty());
        if ended {
            self.started = None;
            self.offset = Duration::ZERO;
            return Some(MediaEvent::Ended);
        }

        if self
            .last_update
            .is_some_and(|at| at.elapsed() < UPDATE_INTERVAL)
        {
            return None;
        }
        self.last_update = Some(Instant::now());
        Some(MediaEvent::TimeUpdate(self.position().as_secs_f64()))
    }
}
