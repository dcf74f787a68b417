use std::collections::HashMap;

use rand::rngs::StdRng;

use crate::error::{AlignmentError, SynthesisError};
use crate::types::{AlignedWord, AlignmentResult, GenerationParams, TokenSequence, VoicePrompt};

/// A loaded forced-alignment model.
pub trait AlignmentModel: Send {
    /// Rate the model expects its input audio at.
    fn sample_rate_hz(&self) -> u32;

    /// Aligns `transcript` against mono `samples` already at
    /// [`sample_rate_hz`](Self::sample_rate_hz).
    fn align(
        &self,
        samples: &[f32],
        transcript: &str,
        language: &str,
    ) -> Result<AlignmentResult, AlignmentError>;
}

/// Produces an alignment model on first use of a session.
pub trait AlignmentModelLoader: Send {
    fn load(&self) -> Result<Box<dyn AlignmentModel>, AlignmentError>;
}

impl<F> AlignmentModelLoader for F
where
    F: Fn() -> Result<Box<dyn AlignmentModel>, AlignmentError> + Send,
{
    fn load(&self) -> Result<Box<dyn AlignmentModel>, AlignmentError> {
        self()
    }
}

/// Everything a speech model receives for one generation call.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisRequest<'a> {
    pub text: &'a str,
    pub voice: &'a VoicePrompt,
    pub params: &'a GenerationParams,
}

/// A loaded text-to-speech model.
///
/// Models draw all randomness from `rng`; the session owns it and decides
/// when it is reseeded.
pub trait SpeechModel: Send {
    fn sample_rate_hz(&self) -> u32;

    fn generate(
        &mut self,
        request: SynthesisRequest<'_>,
        rng: &mut StdRng,
    ) -> Result<Vec<f32>, SynthesisError>;
}

pub trait SpeechModelLoader: Send {
    fn load(&self) -> Result<Box<dyn SpeechModel>, SynthesisError>;
}

impl<F> SpeechModelLoader for F
where
    F: Fn() -> Result<Box<dyn SpeechModel>, SynthesisError> + Send,
{
    fn load(&self) -> Result<Box<dyn SpeechModel>, SynthesisError> {
        self()
    }
}

/// Acoustic model stage of the CTC aligner: normalized audio in, per-frame
/// log-probabilities over the vocabulary out.
pub trait EmissionBackend: Send + Sync {
    fn infer(&self, normalized_audio: &[f32]) -> Result<Vec<Vec<f32>>, AlignmentError>;

    fn device_label(&self) -> String;
}

pub trait Tokenizer: Send + Sync {
    fn tokenize(
        &self,
        transcript: &str,
        vocab: &HashMap<char, usize>,
        blank_id: usize,
        word_sep_id: usize,
    ) -> TokenSequence;
}

pub trait SequenceAligner: Send + Sync {
    fn align_path(
        &self,
        log_probs: &[Vec<f32>],
        tokens: &[usize],
    ) -> Result<Vec<(usize, usize)>, AlignmentError>;
}

pub trait WordGrouper: Send + Sync {
    fn group_words(
        &self,
        path: &[(usize, usize)],
        token_sequence: &TokenSequence,
        blank_id: usize,
        stride_secs: f64,
    ) -> Vec<AlignedWord>;
}
