//! Buffer conversions between the host's PCM16 representation and the
//! normalized f32 audio that models consume.

mod io;
mod resample;

pub use io::load_audio_file;
pub use resample::resample;

use crate::error::AudioError;

/// Divisor used to map PCM16 samples into roughly [-1, 1].
pub const PCM16_SCALE: f32 = 32767.0;

/// Decodes little-endian signed 16-bit PCM into normalized f32 samples.
pub fn decode_pcm16_le(bytes: &[u8]) -> Result<Vec<f32>, AudioError> {
    if bytes.len() % 2 != 0 {
        return Err(AudioError::OddByteLength { len: bytes.len() });
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / PCM16_SCALE)
        .collect())
}

/// Quantizes f32 samples to PCM16, truncating toward zero and saturating at
/// the i16 range.
pub fn quantize_pcm16(samples: &[f32]) -> Vec<i16> {
    samples.iter().map(|&s| (s * PCM16_SCALE) as i16).collect()
}

pub fn encode_pcm16_le(samples: &[f32]) -> Vec<u8> {
    quantize_pcm16(samples)
        .into_iter()
        .flat_map(i16::to_le_bytes)
        .collect()
}

/// Averages interleaved frames down to one channel.
pub fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Decodes a host PCM16 buffer and brings it to `target_rate_hz`.
pub fn pcm16_to_model_rate(
    bytes: &[u8],
    sample_rate_hz: u32,
    target_rate_hz: u32,
) -> Result<Vec<f32>, AudioError> {
    if sample_rate_hz == 0 {
        return Err(AudioError::InvalidSampleRate { sample_rate_hz });
    }
    let samples = decode_pcm16_le(bytes)?;
    if sample_rate_hz == target_rate_hz {
        return Ok(samples);
    }
    tracing::info!(
        from_rate_hz = sample_rate_hz,
        to_rate_hz = target_rate_hz,
        samples = samples.len(),
        "resampling audio buffer"
    );
    resample(&samples, sample_rate_hz, target_rate_hz)
}
