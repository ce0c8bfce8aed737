use std::io::Cursor;

use super::{AudioFormat, AudioMetadata};
use crate::error::AppError;

/// Read duration, sample rate and channel count from encoded audio.
///
/// WAV headers are read directly. Compressed formats need the
/// `audio-playback` decoder and are decoded in full to count samples.
pub fn probe(bytes: &[u8], format: AudioFormat) -> Result<AudioMetadata, AppError> {
    if bytes.is_empty() {
        return Err(AppError::Media("Audio payload is empty".into()));
    }

    match format {
        AudioFormat::Wav => probe_wav(bytes),
        _ => probe_decoded(bytes, format),
    }
}

fn probe_wav(bytes: &[u8]) -> Result<AudioMetadata, AppError> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| AppError::Media(format!("Failed to read WAV header: {}", e)))?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(AppError::Media("WAV header has zero sample rate".into()));
    }

    Ok(AudioMetadata {
        format: AudioFormat::Wav,
        duration: reader.duration() as f64 / spec.sample_rate as f64,
        sample_rate: Some(spec.sample_rate),
        channels: Some(spec.channels),
    })
}

#[cfg(feature = "audio-playback")]
fn probe_decoded(bytes: &[u8], format: AudioFormat) -> Result<AudioMetadata, AppError> {
    use rodio::Source;

    let decoder = rodio::Decoder::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| AppError::Media(format!("Failed to decode audio: {}", e)))?;
    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    if channels == 0 || sample_rate == 0 {
        return Err(AppError::Media("Decoder reported no channels".into()));
    }

    let duration = match decoder.total_duration() {
        Some(d) => d.as_secs_f64(),
        None => {
            let samples = decoder.count() as f64;
            samples / (channels as f64 * sample_rate as f64)
        }
    };

    Ok(AudioMetadata {
        format,
        duration,
        sample_rate: Some(sample_rate),
        channels: Some(channels),
    })
}

#[cfg(not(feature = "audio-playback"))]
fn probe_decoded(_bytes: &[u8], format: AudioFormat) -> Result<AudioMetadata, AppError> {
    Err(AppError::Media(format!(
        "Cannot read {} metadata without the audio-playback feature",
        format.extension()
    )))
}
