use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use podcast_tts::audio::{format_duration, format_file_size, PodcastAudio};
use podcast_tts::generator::PodcastGenerator;
use podcast_tts::player::{NullBackend, PlaybackController};
#[cfg(feature = "audio-playback")]
use podcast_tts::player::PlayerCommand;
#[cfg(feature = "audio-playback")]
use tokio::sync::mpsc;
use podcast_tts::tts::{GenerationSettings, Voice};
use podcast_tts::AppError;

/// Turn text into a podcast using a running podcast-tts-server.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Base URL of the podcast server
    #[arg(long, env = "PODCAST_SERVER_URL", default_value = "http://localhost:3000")]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the voices offered by the server
    Voices(VoicesArgs),
    /// Generate a podcast from text
    Generate(GenerateArgs),
}

#[derive(Args)]
struct VoicesArgs {
    /// Play the sample clip of this voice instead of listing
    #[arg(long, value_name = "VOICE_ID")]
    preview: Option<String>,
}

#[derive(Args)]
struct GenerateArgs {
    /// Text to speak
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    text: Option<String>,

    /// Read the text from a file
    #[arg(long)]
    file: Option<PathBuf>,

    /// Voice id; defaults to the first voice the server lists
    #[arg(long)]
    voice: Option<String>,

    #[arg(long, default_value_t = 0.5)]
    stability: f32,

    #[arg(long, default_value_t = 0.5)]
    similarity_boost: f32,

    #[arg(long, default_value_t = 0.0)]
    style: f32,

    #[arg(long)]
    speaker_boost: bool,

    #[arg(long, default_value_t = 1.0)]
    speed: f32,

    /// Directory to save the audio into
    #[arg(long)]
    out: Option<PathBuf>,

    /// Play the audio once generated
    #[arg(long)]
    play: bool,

    /// Playback volume between 0 and 1
    #[arg(long, default_value_t = 1.0)]
    volume: f32,
}

impl GenerateArgs {
    fn settings(&self) -> GenerationSettings {
        GenerationSettings {
            stability: self.stability,
            similarity_boost: self.similarity_boost,
            style: self.style,
            use_speaker_boost: self.speaker_boost,
            speed: self.speed,
        }
    }

    fn read_text(&self) -> Result<String, AppError> {
        match (&self.text, &self.file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => Ok(std::fs::read_to_string(path)?),
            (None, None) => Err(AppError::Validation("Text content is required".into())),
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let generator = PodcastGenerator::new(&cli.server);

    let result = match cli.command {
        Command::Voices(args) => match args.preview {
            Some(voice_id) => preview_voice(&generator, &voice_id).await,
            None => list_voices(&generator).await,
        },
        Command::Generate(args) => generate(&generator, args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn list_voices(generator: &PodcastGenerator) -> Result<(), AppError> {
    for voice in generator.voices().await? {
        println!(
            "{:<24} {:<20} {:<12} {}",
            voice.voice_id,
            voice.name,
            voice.category.as_str(),
            voice.summary()
        );
    }
    Ok(())
}

async fn preview_voice(generator: &PodcastGenerator, voice_id: &str) -> Result<(), AppError> {
    let voice = generator
        .voices()
        .await?
        .into_iter()
        .find(|v| v.voice_id == voice_id)
        .ok_or_else(|| AppError::VoiceNotFound(voice_id.to_string()))?;

    let clip = generator.preview(&voice).await?;
    println!("Preview: {} ({})", voice.name, voice.summary());
    play(clip, 1.0).await
}

async fn generate(generator: &PodcastGenerator, args: GenerateArgs) -> Result<(), AppError> {
    let text = args.read_text()?;
    let voice = select_voice(generator, args.voice.as_deref()).await?;

    let audio = generator.generate(&text, &voice, args.settings()).await?;
    print_summary(&audio);

    if let Some(dir) = &args.out {
        let mut player = PlaybackController::new(NullBackend::new());
        player.load(audio.clone());
        let path = player.download(dir)?;
        println!("Saved to {}", path.display());
    }

    if args.play {
        play(audio, args.volume).await?;
    }
    Ok(())
}

/// Resolve the requested voice, or pick the first one on offer.
async fn select_voice(generator: &PodcastGenerator, voice_id: Option<&str>) -> Result<Voice, AppError> {
    let voices = match generator.voices().await {
        Ok(voices) => voices,
        Err(e) if voice_id.is_some() => {
            tracing::warn!("Could not list voices: {}", e);
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    match voice_id {
        Some(id) => Ok(voices
            .into_iter()
            .find(|v| v.voice_id == id)
            .unwrap_or_else(|| Voice::unknown(id))),
        None => voices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Validation("No voices available".into())),
    }
}

fn print_summary(audio: &PodcastAudio) {
    println!("Voice:    {} ({})", audio.voice.name, audio.voice.voice_id);
    println!("Duration: {}", format_duration(audio.metadata.duration));
    println!("Size:     {}", format_file_size(audio.source.len_hint() as u64));
    if let (Some(rate), Some(channels)) = (audio.metadata.sample_rate, audio.metadata.channels) {
        println!("Format:   {} {} Hz, {} ch", audio.metadata.format.extension(), rate, channels);
    }
}

/// Play on the output device, off the async runtime.
async fn play(audio: PodcastAudio, volume: f32) -> Result<(), AppError> {
    tokio::task::spawn_blocking(move || play_blocking(audio, volume))
        .await
        .map_err(|e| AppError::Media(format!("Playback task failed: {}", e)))?
}

#[cfg(feature = "audio-playback")]
fn play_blocking(audio: PodcastAudio, volume: f32) -> Result<(), AppError> {
    use podcast_tts::player::{PlaybackState, RodioBackend, SKIP_SECONDS};
    use std::io::Write;
    use std::time::Duration;

    let mut player = PlaybackController::new(RodioBackend::try_default()?);
    player.on_ended(|| println!("\nFinished."));
    player.load(audio);

    println!(
        "Keys (then Enter): space play/pause, < > skip {}s, + - volume, m mute, <seconds> seek, q quit",
        SKIP_SECONDS
    );
    let mut commands = spawn_key_reader();

    loop {
        player.pump();
        while let Ok(command) = commands.try_recv() {
            if !player.apply(command) {
                println!();
                return Ok(());
            }
        }

        match player.state() {
            PlaybackState::Ready => {
                player.set_volume(volume);
                player.toggle_play_pause();
            }
            state @ (PlaybackState::Playing | PlaybackState::Paused) => {
                print!(
                    "\r{:?} {} / {}  vol {:>3}%   ",
                    state,
                    format_duration(player.position()),
                    format_duration(player.duration()),
                    (player.volume() * 100.0).round()
                );
                std::io::stdout().flush().ok();
            }
            PlaybackState::Ended => return Ok(()),
            PlaybackState::Error => {
                let message = player.error().unwrap_or("unknown error").to_string();
                return Err(AppError::Media(message));
            }
            PlaybackState::Idle | PlaybackState::Loading => {}
        }
        std::thread::sleep(Duration::from_millis(100));
    }
}

/// Forward keyboard lines to the playback loop.
#[cfg(feature = "audio-playback")]
fn spawn_key_reader() -> mpsc::UnboundedReceiver<PlayerCommand> {
    use std::io::BufRead;

    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            for command in PlayerCommand::parse_line(&line) {
                if tx.send(command).is_err() {
                    return;
                }
            }
        }
    });
    rx
}

#[cfg(not(feature = "audio-playback"))]
fn play_blocking(_audio: PodcastAudio, _volume: f32) -> Result<(), AppError> {
    Err(AppError::Media(
        "Playback requires the audio-playback feature".into(),
    ))
}
