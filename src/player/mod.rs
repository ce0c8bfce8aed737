//! Playback state machine for a single generated podcast.
//!
//! The controller owns a [`MediaBackend`] and mirrors what an HTML audio
//! element exposes: a source, a play/pause toggle, seeking, volume and a
//! stream of events (metadata, time updates, end, errors).

pub mod backend;
#[cfg(feature = "audio-playback")]
pub mod rodio_backend;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;

use crate::audio::PodcastAudio;
use crate::error::AppError;

pub use backend::{MediaBackend, MediaEvent, NullBackend};
#[cfg(feature = "audio-playback")]
pub use rodio_backend::RodioBackend;

/// Seconds moved by the skip buttons.
pub const SKIP_SECONDS: f64 = 10.0;

/// Volume change for one press of `+` or `-`.
pub const VOLUME_STEP: f32 = 0.1;

/// A listener request, typed at the keyboard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    TogglePlayPause,
    Skip(f64),
    Seek(f64),
    ChangeVolume(f32),
    ToggleMute,
    Quit,
}

impl PlayerCommand {
    /// Commands in one line of input.
    ///
    /// A bare number seeks to that second and an empty line toggles
    /// playback. Otherwise each key is a command: space or `p` toggles,
    /// `<`/`>` skip, `+`/`-` change volume, `m` mutes and `q` quits.
    /// Other keys are ignored.
    pub fn parse_line(line: &str) -> Vec<PlayerCommand> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return vec![PlayerCommand::TogglePlayPause];
        }
        if let Ok(seconds) = trimmed.parse::<f64>() {
            return vec![PlayerCommand::Seek(seconds)];
        }

        line.chars()
            .filter_map(|key| match key {
                ' ' | 'p' => Some(PlayerCommand::TogglePlayPause),
                '<' | ',' => Some(PlayerCommand::Skip(-SKIP_SECONDS)),
                '>' | '.' => Some(PlayerCommand::Skip(SKIP_SECONDS)),
                '+' | '=' => Some(PlayerCommand::ChangeVolume(VOLUME_STEP)),
                '-' => Some(PlayerCommand::ChangeVolume(-VOLUME_STEP)),
                'm' => Some(PlayerCommand::ToggleMute),
                'q' => Some(PlayerCommand::Quit),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Ended,
    Error,
}

impl PlaybackState {
    /// Seek and volume are accepted in these states.
    fn accepts_controls(self) -> bool {
        !matches!(self, Self::Idle | Self::Loading | Self::Error)
    }
}

type EndedCallback = Box<dyn FnMut() + Send>;

pub struct PlaybackController<B: MediaBackend> {
    backend: B,
    audio: Option<PodcastAudio>,
    state: PlaybackState,
    position: f64,
    duration: f64,
    volume: f32,
    error: Option<String>,
    on_ended: Option<EndedCallback>,
}

impl<B: MediaBackend> PlaybackController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            audio: None,
            state: PlaybackState::Idle,
            position: 0.0,
            duration: 0.0,
            volume: 1.0,
            error: None,
            on_ended: None,
        }
    }

    /// Register a callback fired each time playback reaches the end.
    pub fn on_ended(&mut self, callback: impl FnMut() + Send + 'static) {
        self.on_ended = Some(Box::new(callback));
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn audio(&self) -> Option<&PodcastAudio> {
        self.audio.as_ref()
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Assign a new source and wait for its metadata.
    pub fn load(&mut self, audio: PodcastAudio) {
        self.state = PlaybackState::Loading;
        self.position = 0.0;
        self.duration = 0.0;
        self.error = None;

        let loaded = audio
            .source
            .bytes()
            .and_then(|bytes| self.backend.load(bytes));
        self.audio = Some(audio);

        if let Err(e) = loaded {
            self.fail(e.to_string());
            return;
        }
        self.backend.set_volume(self.volume);
    }

    pub fn toggle_play_pause(&mut self) {
        match self.state {
            PlaybackState::Playing => {
                self.backend.pause();
                self.state = PlaybackState::Paused;
            }
            PlaybackState::Ready | PlaybackState::Paused | PlaybackState::Ended => {
                match self.backend.play() {
                    Ok(()) => self.state = PlaybackState::Playing,
                    Err(e) => self.fail(e.to_string()),
                }
            }
            PlaybackState::Idle | PlaybackState::Loading | PlaybackState::Error => {}
        }
    }

    /// Move to `seconds`, clamped to the known duration.
    pub fn seek(&mut self, seconds: f64) {
        if !self.state.accepts_controls() {
            return;
        }
        let target = if seconds.is_nan() {
            0.0
        } else {
            seconds.clamp(0.0, self.duration)
        };
        if let Err(e) = self.backend.seek(Duration::from_secs_f64(target)) {
            tracing::warn!("Seek to {:.1}s not applied by backend: {}", target, e);
        }
        self.position = target;
    }

    pub fn skip(&mut self, delta_seconds: f64) {
        self.seek(self.position + delta_seconds);
    }

    pub fn set_volume(&mut self, volume: f32) {
        if !self.state.accepts_controls() {
            return;
        }
        self.volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
        self.backend.set_volume(self.volume);
    }

    pub fn toggle_mute(&mut self) {
        let target = if self.volume > 0.0 { 0.0 } else { 1.0 };
        self.set_volume(target);
    }

    /// Apply a listener command. Returns `false` once playback should stop.
    pub fn apply(&mut self, command: PlayerCommand) -> bool {
        match command {
            PlayerCommand::TogglePlayPause => self.toggle_play_pause(),
            PlayerCommand::Skip(delta) => self.skip(delta),
            PlayerCommand::Seek(seconds) => self.seek(seconds),
            PlayerCommand::ChangeVolume(delta) => self.set_volume(self.volume + delta),
            PlayerCommand::ToggleMute => self.toggle_mute(),
            PlayerCommand::Quit => {
                if self.state == PlaybackState::Playing {
                    self.toggle_play_pause();
                }
                return false;
            }
        }
        true
    }

    /// Apply one backend event to the state machine.
    pub fn handle_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::MetadataLoaded { duration } => {
                if self.state == PlaybackState::Loading {
                    self.duration = if duration.is_finite() && duration > 0.0 {
                        duration
                    } else {
                        0.0
                    };
                    self.state = PlaybackState::Ready;
                }
            }
            MediaEvent::TimeUpdate(seconds) => {
                if matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
                    self.position = seconds.clamp(0.0, self.duration.max(seconds));
                }
            }
            MediaEvent::Ended => {
                if self.state.accepts_controls() {
                    self.state = PlaybackState::Ended;
                    self.position = 0.0;
                    if let Some(callback) = self.on_ended.as_mut() {
                        callback();
                    }
                }
            }
            MediaEvent::Error(message) => self.fail(message),
        }
    }

    /// Drain pending backend events. Returns the number applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.backend.poll_event() {
            self.handle_event(event);
            applied += 1;
        }
        applied
    }

    /// Write the current audio into `dir` and return the file path.
    pub fn download(&self, dir: &Path) -> Result<PathBuf, AppError> {
        let audio = self
            .audio
            .as_ref()
            .ok_or_else(|| AppError::Media("No audio to download".into()))?;
        let bytes = audio.source.bytes()?;
        let path = dir.join(audio.filename(Utc::now()));
        std::fs::write(&path, bytes)?;
        tracing::info!("Saved podcast to {}", path.display());
        Ok(path)
    }

    fn fail(&mut self, message: String) {
        tracing::error!("Audio playback error: {}", message);
        self.state = PlaybackState::Error;
        self.error = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioFormat, AudioMetadata, AudioSource};
    use crate::tts::{GenerationSettings, Voice};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingBackend {
        calls: Vec<String>,
        events: Vec<MediaEvent>,
        fail_play: bool,
    }

    impl MediaBackend for RecordingBackend {
        fn load(&mut self, data: Vec<u8>) -> Result<(), AppError> {
            self.calls.push(format!("load {}", data.len()));
            Ok(())
        }

        fn play(&mut self) -> Result<(), AppError> {
            self.calls.push("play".into());
            if self.fail_play {
                return Err(AppError::Media("device lost".into()));
            }
            Ok(())
        }

        fn pause(&mut self) {
            self.calls.push("pause".into());
        }

        fn seek(&mut self, position: Duration) -> Result<(), AppError> {
            self.calls.push(format!("seek {:.1}", position.as_secs_f64()));
            Ok(())
        }

        fn set_volume(&mut self, volume: f32) {
            self.calls.push(format!("volume {:.1}", volume));
        }

        fn poll_event(&mut self) -> Option<MediaEvent> {
            if self.events.is_empty() {
                None
            } else {
                Some(self.events.remove(0))
            }
        }
    }

    fn podcast(source: AudioSource) -> PodcastAudio {
        PodcastAudio {
            id: "1".into(),
            source,
            metadata: AudioMetadata::unknown(AudioFormat::Mp3),
            created_at: Utc::now(),
            settings: GenerationSettings::default(),
            voice: Voice::unknown("abc123"),
            original_text: "Hello world, this is a test.".into(),
        }
    }

    fn ready_controller(duration: f64) -> PlaybackController<RecordingBackend> {
        let mut player = PlaybackController::new(RecordingBackend::default());
        player.load(podcast(AudioSource::Buffer(vec![1, 2, 3])));
        player.handle_event(MediaEvent::MetadataLoaded { duration });
        player
    }

    #[test]
    fn test_load_moves_to_loading() {
        let mut player = PlaybackController::new(RecordingBackend::default());
        assert_eq!(player.state(), PlaybackState::Idle);
        player.load(podcast(AudioSource::Buffer(vec![0; 8])));
        assert_eq!(player.state(), PlaybackState::Loading);
        assert_eq!(player.backend_mut().calls[0], "load 8");
    }

    #[test]
    fn test_play_before_ready_is_noop() {
        let mut player = PlaybackController::new(RecordingBackend::default());
        player.toggle_play_pause();
        assert_eq!(player.state(), PlaybackState::Idle);

        player.load(podcast(AudioSource::Buffer(vec![1])));
        player.toggle_play_pause();
        assert_eq!(player.state(), PlaybackState::Loading);
        assert!(!player.backend_mut().calls.contains(&"play".to_string()));
    }

    #[test]
    fn test_metadata_makes_ready() {
        let player = ready_controller(42.0);
        assert_eq!(player.state(), PlaybackState::Ready);
        assert_eq!(player.duration(), 42.0);
    }

    #[test]
    fn test_toggle_cycles_between_playing_and_paused() {
        let mut player = ready_controller(30.0);
        player.toggle_play_pause();
        assert_eq!(player.state(), PlaybackState::Playing);
        player.toggle_play_pause();
        assert_eq!(player.state(), PlaybackState::Paused);
        player.toggle_play_pause();
        assert_eq!(player.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_seek_clamps_without_state_change() {
        let mut player = ready_controller(30.0);
        player.seek(99.0);
        assert_eq!(player.position(), 30.0);
        player.seek(-5.0);
        assert_eq!(player.position(), 0.0);
        assert_eq!(player.state(), PlaybackState::Ready);
    }

    #[test]
    fn test_seek_ignored_while_loading() {
        let mut player = PlaybackController::new(RecordingBackend::default());
        player.load(podcast(AudioSource::Buffer(vec![1])));
        player.seek(5.0);
        player.set_volume(0.2);
        assert_eq!(player.position(), 0.0);
        assert_eq!(player.volume(), 1.0);
    }

    #[test]
    fn test_skip_is_relative_and_clamped() {
        let mut player = ready_controller(25.0);
        player.skip(SKIP_SECONDS);
        player.skip(SKIP_SECONDS);
        assert_eq!(player.position(), 20.0);
        player.skip(SKIP_SECONDS);
        assert_eq!(player.position(), 25.0);
        player.skip(-100.0);
        assert_eq!(player.position(), 0.0);
    }

    #[test]
    fn test_volume_and_mute() {
        let mut player = ready_controller(10.0);
        player.set_volume(1.7);
        assert_eq!(player.volume(), 1.0);
        player.set_volume(0.4);
        assert_eq!(player.volume(), 0.4);
        player.toggle_mute();
        assert_eq!(player.volume(), 0.0);
        player.toggle_mute();
        assert_eq!(player.volume(), 1.0);
    }

    #[test]
    fn test_end_resets_position_and_notifies() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);

        let mut player = ready_controller(10.0);
        player.on_ended(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        player.toggle_play_pause();
        player.handle_event(MediaEvent::TimeUpdate(9.5));
        assert_eq!(player.position(), 9.5);

        player.handle_event(MediaEvent::Ended);
        assert_eq!(player.state(), PlaybackState::Ended);
        assert_eq!(player.position(), 0.0);
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        player.toggle_play_pause();
        assert_eq!(player.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_error_from_any_state_without_retry() {
        let mut player = ready_controller(10.0);
        player.toggle_play_pause();
        player.handle_event(MediaEvent::Error("decode failed".into()));
        assert_eq!(player.state(), PlaybackState::Error);
        assert_eq!(player.error(), Some("decode failed"));

        player.toggle_play_pause();
        assert_eq!(player.state(), PlaybackState::Error);
    }

    #[test]
    fn test_play_failure_is_error_state() {
        let mut player = ready_controller(10.0);
        player.backend_mut().fail_play = true;
        player.toggle_play_pause();
        assert_eq!(player.state(), PlaybackState::Error);
    }

    #[test]
    fn test_bad_data_url_fails_load() {
        let mut player = PlaybackController::new(RecordingBackend::default());
        player.load(podcast(AudioSource::DataUrl("data:audio/mpeg;base64,@@@".into())));
        assert_eq!(player.state(), PlaybackState::Error);
    }

    #[test]
    fn test_pump_drains_backend_events() {
        let mut player = PlaybackController::new(RecordingBackend::default());
        player.load(podcast(AudioSource::Buffer(vec![1])));
        player.backend_mut().events = vec![
            MediaEvent::MetadataLoaded { duration: 3.0 },
            MediaEvent::TimeUpdate(1.0),
        ];
        assert_eq!(player.pump(), 2);
        assert_eq!(player.state(), PlaybackState::Ready);
        assert_eq!(player.duration(), 3.0);
    }

    #[test]
    fn test_download_from_buffer_and_data_url() {
        let dir = tempfile::tempdir().unwrap();

        let mut player = ready_controller(1.0);
        let path = player.download(dir.path()).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("podcast_unknown_voice_hello_world,_this_is_a_test."));
        assert!(name.ends_with(".mp3"));

        player.load(podcast(AudioSource::data_url(AudioFormat::Mp3, b"mpeg!")));
        let path = player.download(dir.path()).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"mpeg!");
    }

    #[test]
    fn test_null_backend_replays_pushed_events() {
        let mut player = PlaybackController::new(NullBackend::new());
        player.load(podcast(AudioSource::Buffer(vec![9; 4])));
        player.backend_mut().push_event(MediaEvent::MetadataLoaded { duration: 12.5 });
        player.pump();
        assert_eq!(player.state(), PlaybackState::Ready);

        player.toggle_play_pause();
        player.backend_mut().push_event(MediaEvent::Ended);
        player.pump();
        assert_eq!(player.state(), PlaybackState::Ended);
    }

    #[test]
    fn test_parse_keyboard_line() {
        assert_eq!(PlayerCommand::parse_line(""), vec![PlayerCommand::TogglePlayPause]);
        assert_eq!(PlayerCommand::parse_line(" 42.5 "), vec![PlayerCommand::Seek(42.5)]);
        assert_eq!(
            PlayerCommand::parse_line(">>-mxq"),
            vec![
                PlayerCommand::Skip(SKIP_SECONDS),
                PlayerCommand::Skip(SKIP_SECONDS),
                PlayerCommand::ChangeVolume(-VOLUME_STEP),
                PlayerCommand::ToggleMute,
                PlayerCommand::Quit,
            ]
        );
        assert!(PlayerCommand::parse_line("xyz").is_empty());
    }

    #[test]
    fn test_keyboard_commands_drive_controller() {
        let mut player = ready_controller(60.0);
        for line in ["", ">", ">", "<", "-", "-"] {
            for command in PlayerCommand::parse_line(line) {
                assert!(player.apply(command));
            }
        }
        assert_eq!(player.state(), PlaybackState::Playing);
        assert_eq!(player.position(), SKIP_SECONDS);
        assert!((player.volume() - 0.8).abs() < 1e-6);

        assert!(player.apply(PlayerCommand::ToggleMute));
        assert_eq!(player.volume(), 0.0);
        assert!(player.apply(PlayerCommand::ChangeVolume(-VOLUME_STEP)));
        assert_eq!(player.volume(), 0.0);

        assert!(player.apply(PlayerCommand::Seek(45.0)));
        assert_eq!(player.position(), 45.0);
        assert!(player.apply(PlayerCommand::TogglePlayPause));
        assert_eq!(player.state(), PlaybackState::Paused);
        assert!(player.apply(PlayerCommand::TogglePlayPause));

        assert!(!player.apply(PlayerCommand::Quit));
        assert_eq!(player.state(), PlaybackState::Paused);
    }

    #[test]
    fn test_download_without_audio() {
        let player = PlaybackController::new(NullBackend::new());
        let dir = tempfile::tempdir().unwrap();
        assert!(player.download(dir.path()).is_err());
    }
}
