use std::collections::HashMap;

use crate::error::AlignmentError;
use crate::pipeline::traits::{
    AlignmentModel, EmissionBackend, SequenceAligner, Tokenizer, WordGrouper,
};
use crate::types::{AlignedSegment, AlignmentInput, AlignmentResult};

/// Forced aligner over a CTC acoustic model.
pub struct CtcAligner {
    emission_backend: Box<dyn EmissionBackend>,
    vocab: HashMap<char, usize>,
    blank_id: usize,
    word_sep_id: usize,
    frame_stride_secs: f64,
    expected_sample_rate_hz: u32,
    tokenizer: Box<dyn Tokenizer>,
    sequence_aligner: Box<dyn SequenceAligner>,
    word_grouper: Box<dyn WordGrouper>,
}

pub(crate) struct CtcAlignerParts {
    pub emission_backend: Box<dyn EmissionBackend>,
    pub vocab: HashMap<char, usize>,
    pub blank_id: usize,
    pub word_sep_id: usize,
    pub frame_stride_secs: f64,
    pub expected_sample_rate_hz: u32,
    pub tokenizer: Box<dyn Tokenizer>,
    pub sequence_aligner: Box<dyn SequenceAligner>,
    pub word_grouper: Box<dyn WordGrouper>,
}

impl CtcAligner {
    pub(crate) fn from_parts(parts: CtcAlignerParts) -> Self {
        Self {
            emission_backend: parts.emission_backend,
            vocab: parts.vocab,
            blank_id: parts.blank_id,
            word_sep_id: parts.word_sep_id,
            frame_stride_secs: parts.frame_stride_secs,
            expected_sample_rate_hz: parts.expected_sample_rate_hz,
            tokenizer: parts.tokenizer,
            sequence_aligner: parts.sequence_aligner,
            word_grouper: parts.word_grouper,
        }
    }

    pub fn frame_stride_secs(&self) -> f64 {
        self.frame_stride_secs
    }

    pub fn device_label(&self) -> String {
        self.emission_backend.device_label()
    }

    pub fn align_input(&self, input: &AlignmentInput) -> Result<AlignmentResult, AlignmentError> {
        self.align_samples(input.sample_rate_hz, &input.samples, &input.transcript)
    }

    fn align_samples(
        &self,
        sample_rate_hz: u32,
        samples: &[f32],
        transcript: &str,
    ) -> Result<AlignmentResult, AlignmentError> {
        if samples.is_empty() || transcript.trim().is_empty() {
            return Ok(AlignmentResult::default());
        }

        if sample_rate_hz != self.expected_sample_rate_hz {
            tracing::warn!(
                expected_rate_hz = self.expected_sample_rate_hz,
                actual_rate_hz = sample_rate_hz,
                "CTC aligner expects a specific sample rate; quality may degrade"
            );
        }

        let token_sequence = self.tokenizer.tokenize(
            transcript,
            &self.vocab,
            self.blank_id,
            self.word_sep_id,
        );
        if token_sequence.normalized_words.is_empty() {
            tracing::debug!("transcript has no characters in the model vocabulary");
            return Ok(AlignmentResult::default());
        }

        let normalized = normalize_audio(samples);
        let log_probs = self.emission_backend.infer(&normalized)?;

        let t_len = log_probs.len();
        let min_frames = (token_sequence.tokens.len() + 1) / 2;
        if t_len < min_frames {
            return Err(AlignmentError::invalid_input(format!(
                "audio too short for transcript: {t_len} frames < {min_frames} required"
            )));
        }

        let path = self
            .sequence_aligner
            .align_path(&log_probs, &token_sequence.tokens)?;
        let words = self.word_grouper.group_words(
            &path,
            &token_sequence,
            self.blank_id,
            self.frame_stride_secs,
        );
        tracing::debug!(
            frames = t_len,
            words = words.len(),
            "CTC alignment finished"
        );

        Ok(AlignmentResult {
            segments: vec![AlignedSegment { words }],
        })
    }
}

impl AlignmentModel for CtcAligner {
    fn sample_rate_hz(&self) -> u32 {
        self.expected_sample_rate_hz
    }

    fn align(
        &self,
        samples: &[f32],
        transcript: &str,
        _language: &str,
    ) -> Result<AlignmentResult, AlignmentError> {
        self.align_samples(self.expected_sample_rate_hz, samples, transcript)
    }
}

/// Zero-mean, unit-variance scaling expected by wav2vec2-style encoders.
fn normalize_audio(samples: &[f32]) -> Vec<f32> {
    let n = samples.len() as f64;
    let mean = samples.iter().map(|&x| x as f64).sum::<f64>() / n;
    let var = samples
        .iter()
        .map(|&x| {
            let d = x as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    let std = var.sqrt().max(1e-7);
    samples
        .iter()
        .map(|&x| ((x as f64 - mean) / std) as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_audio_centers_and_scales() {
        let out = normalize_audio(&[1.0, 3.0]);
        assert!((out[0] + 1.0).abs() < 1e-6);
        assert!((out[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_audio_handles_silence() {
        let out = normalize_audio(&[0.0; 8]);
        assert!(out.iter().all(|x| *x == 0.0));
    }
}
