use std::path::Path;

use claxon::FlacReader;
use hound::{SampleFormat, WavReader};

use super::downmix_to_mono;
use crate::error::AudioError;

/// Reads a WAV or FLAC file into mono f32 samples and its sample rate.
pub fn load_audio_file(path: impl AsRef<Path>) -> Result<(Vec<f32>, u32), AudioError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "wav" | "wave" => read_wav_mono(path),
        "flac" => read_flac_mono(path),
        _ => Err(AudioError::UnsupportedFormat { extension }),
    }
}

fn read_wav_mono(path: &Path) -> Result<(Vec<f32>, u32), AudioError> {
    let mut reader = WavReader::open(path).map_err(|e| wav_error("open WAV", e))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(AudioError::decode("open WAV", "file declares zero channels"));
    }

    let interleaved = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| wav_error("read WAV samples", e))?,
        SampleFormat::Int => {
            let max = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| wav_error("read WAV samples", e))?
        }
    };

    Ok((downmix_to_mono(&interleaved, channels), spec.sample_rate))
}

fn wav_error(context: &'static str, err: hound::Error) -> AudioError {
    match err {
        hound::Error::IoError(source) => AudioError::io(context, source),
        other => AudioError::decode(context, other),
    }
}

fn read_flac_mono(path: &Path) -> Result<(Vec<f32>, u32), AudioError> {
    let mut reader = FlacReader::open(path).map_err(|e| AudioError::decode("open FLAC", e))?;
    let streaminfo = reader.streaminfo();
    let channels = streaminfo.channels as usize;
    let bits_per_sample = streaminfo.bits_per_sample as i32;
    let scale = if bits_per_sample > 1 {
        ((1_i64 << (bits_per_sample - 1)) - 1) as f32
    } else {
        1.0
    };
    if channels == 0 {
        return Err(AudioError::decode("open FLAC", "file declares zero channels"));
    }

    let mut interleaved = Vec::new();
    for sample in reader.samples() {
        let sample = sample.map_err(|e| AudioError::decode("read FLAC samples", e))?;
        interleaved.push(sample as f32 / scale);
    }
    Ok((downmix_to_mono(&interleaved, channels), streaminfo.sample_rate))
}
