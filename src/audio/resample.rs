use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::AudioError;

const SINC_LEN: usize = 256;

/// Band-limited resampling of a mono signal.
///
/// The output holds exactly `round(len * to / from)` samples: the input is
/// zero-padded so the filter tail flushes, and the filter delay is trimmed
/// from the front.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, AudioError> {
    if from_rate == 0 {
        return Err(AudioError::InvalidSampleRate {
            sample_rate_hz: from_rate,
        });
    }
    if to_rate == 0 {
        return Err(AudioError::InvalidSampleRate {
            sample_rate_hz: to_rate,
        });
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let expected_len = (samples.len() as f64 * ratio).round() as usize;

    let mut padded = Vec::with_capacity(samples.len() + SINC_LEN);
    padded.extend_from_slice(samples);
    padded.resize(samples.len() + SINC_LEN, 0.0);

    let params = SincInterpolationParameters {
        sinc_len: SINC_LEN,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, padded.len(), 1)
        .map_err(AudioError::resample)?;
    let delay = resampler.output_delay();
    let input = vec![padded];
    let output = resampler
        .process(&input, None)
        .map_err(AudioError::resample)?;

    let mut out: Vec<f32> = output
        .into_iter()
        .next()
        .unwrap_or_default()
        .into_iter()
        .skip(delay)
        .take(expected_len)
        .collect();
    out.resize(expected_len, 0.0);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_rate_is_identity() {
        let samples = vec![0.1, -0.2, 0.3];
        assert_eq!(resample(&samples, 16_000, 16_000).expect("resample"), samples);
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(resample(&[], 48_000, 16_000).expect("resample").is_empty());
    }

    #[test]
    fn downsampling_scales_length() {
        let samples = vec![0.0f32; 4_800];
        let out = resample(&samples, 48_000, 16_000).expect("resample");
        assert_eq!(out.len(), 1_600);
    }

    #[test]
    fn upsampling_scales_length() {
        let samples = vec![0.0f32; 800];
        let out = resample(&samples, 8_000, 16_000).expect("resample");
        assert_eq!(out.len(), 1_600);
    }

    #[test]
    fn non_integer_ratio_rounds_length() {
        let samples = vec![0.0f32; 44_100];
        let out = resample(&samples, 44_100, 16_000).expect("resample");
        assert_eq!(out.len(), 16_000);
    }

    #[test]
    fn tone_energy_survives_resampling() {
        let from = 24_000u32;
        let samples: Vec<f32> = (0..from as usize)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / from as f32).sin() * 0.5)
            .collect();
        let out = resample(&samples, from, 16_000).expect("resample");
        let rms = (out.iter().map(|x| x * x).sum::<f32>() / out.len() as f32).sqrt();
        // A 0.5-amplitude sine has RMS ~0.354.
        assert!((rms - 0.354).abs() < 0.05, "rms was {rms}");
    }

    #[test]
    fn zero_rate_is_rejected() {
        assert!(resample(&[0.0], 0, 16_000).is_err());
        assert!(resample(&[0.0], 16_000, 0).is_err());
    }
}
