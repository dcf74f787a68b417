//! Host-owned context pairing one alignment session with one synthesis session.

use std::path::Path;

use crate::alignment::session::AlignmentSession;
use crate::audio::encode_pcm16_le;
use crate::error::SynthesisError;
use crate::synthesis::session::SynthesisSession;
use crate::types::{GenerationParams, SynthesizedAudio, WordTimestamp};

/// Synthesized speech together with where each word lands in it.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedSpeech {
    pub audio: SynthesizedAudio,
    pub timestamps: Vec<WordTimestamp>,
}

pub struct SpeechBridge {
    aligner: AlignmentSession,
    synthesizer: SynthesisSession,
}

impl SpeechBridge {
    pub fn new(aligner: AlignmentSession, synthesizer: SynthesisSession) -> Self {
        Self {
            aligner,
            synthesizer,
        }
    }

    pub fn aligner(&mut self) -> &mut AlignmentSession {
        &mut self.aligner
    }

    pub fn synthesizer(&mut self) -> &mut SynthesisSession {
        &mut self.synthesizer
    }

    /// Synthesizes `text`, then aligns the same text against the result.
    ///
    /// Synthesis errors are returned. Alignment goes through the JSON
    /// fallback path, so a failed alignment leaves `timestamps` empty.
    pub fn generate_with_timestamps(
        &mut self,
        text: &str,
        voice_path: impl AsRef<Path>,
        params: &GenerationParams,
    ) -> Result<TimedSpeech, SynthesisError> {
        let audio = self.synthesizer.generate(text, voice_path, params)?;
        let pcm = encode_pcm16_le(&audio.samples);
        let json = self
            .aligner
            .get_word_timestamps_from_buffer(&pcm, audio.sample_rate_hz, text);
        let timestamps = match serde_json::from_str::<Vec<WordTimestamp>>(&json) {
            Ok(timestamps) => timestamps,
            Err(err) => {
                tracing::warn!(error = %err, "discarding unreadable alignment output");
                Vec::new()
            }
        };
        tracing::info!(
            samples = audio.samples.len(),
            words = timestamps.len(),
            "generated speech with word timestamps"
        );
        Ok(TimedSpeech { audio, timestamps })
    }
}
