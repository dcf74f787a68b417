//! Host-facing forced-alignment facade.
//!
//! An [`AlignmentSession`] loads its model on first use and keeps it for its
//! lifetime. Each operation comes in two flavours: a typed one returning
//! [`AlignmentError`], and a JSON one that logs any failure and answers `"[]"`.

use std::path::Path;

use crate::audio::{load_audio_file, pcm16_to_model_rate, resample};
use crate::config::AlignerConfig;
use crate::error::{AlignmentError, AudioError};
use crate::pipeline::traits::{AlignmentModel, AlignmentModelLoader};
use crate::types::WordTimestamp;

/// JSON returned whenever alignment fails.
pub const EMPTY_JSON_ARRAY: &str = "[]";

pub struct AlignmentSession {
    loader: Box<dyn AlignmentModelLoader>,
    model: Option<Box<dyn AlignmentModel>>,
    language: String,
}

impl AlignmentSession {
    pub fn new(loader: impl AlignmentModelLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            model: None,
            language: AlignerConfig::DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Wraps an already loaded model; the session never calls a loader.
    pub fn with_model(model: Box<dyn AlignmentModel>) -> Self {
        let mut session = Self::new(|| -> Result<Box<dyn AlignmentModel>, AlignmentError> {
            Err(AlignmentError::model_load("session was built around a preloaded model"))
        });
        session.model = Some(model);
        session
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Loads the model now instead of on the first alignment call.
    pub fn load(&mut self) -> Result<(), AlignmentError> {
        self.ensure_loaded().map(|_| ())
    }

    fn ensure_loaded(&mut self) -> Result<&dyn AlignmentModel, AlignmentError> {
        if self.model.is_none() {
            tracing::info!(language = %self.language, "Loading alignment model...");
            let model = self.loader.load()?;
            tracing::info!(
                sample_rate_hz = model.sample_rate_hz(),
                "alignment model loaded"
            );
            self.model = Some(model);
        }
        match self.model.as_deref() {
            Some(model) => Ok(model),
            None => Err(AlignmentError::model_load("model missing after load")),
        }
    }

    /// Aligns `text` against the audio file at `path`.
    pub fn word_timestamps(
        &mut self,
        path: impl AsRef<Path>,
        text: &str,
    ) -> Result<Vec<WordTimestamp>, AlignmentError> {
        let path = path.as_ref();
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let (mono, sample_rate_hz) = load_audio_file(path)?;
        if mono.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.ensure_loaded()?;
        let target_rate_hz = model.sample_rate_hz();
        let mono = if sample_rate_hz == target_rate_hz {
            mono
        } else {
            tracing::info!(
                path = %path.display(),
                from_rate_hz = sample_rate_hz,
                to_rate_hz = target_rate_hz,
                "resampling audio file"
            );
            resample(&mono, sample_rate_hz, target_rate_hz)?
        };
        self.align_samples(&mono, text)
    }

    /// Aligns `text` against little-endian PCM16 mono `bytes` at `sample_rate_hz`.
    pub fn word_timestamps_from_buffer(
        &mut self,
        bytes: &[u8],
        sample_rate_hz: u32,
        text: &str,
    ) -> Result<Vec<WordTimestamp>, AlignmentError> {
        if bytes.len() % 2 != 0 {
            return Err(AudioError::OddByteLength { len: bytes.len() }.into());
        }
        if sample_rate_hz == 0 {
            return Err(AudioError::InvalidSampleRate { sample_rate_hz }.into());
        }
        if bytes.is_empty() || text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let target_rate_hz = self.ensure_loaded()?.sample_rate_hz();
        let samples = pcm16_to_model_rate(bytes, sample_rate_hz, target_rate_hz)?;
        self.align_samples(&samples, text)
    }

    /// JSON form of [`word_timestamps`](Self::word_timestamps).
    pub fn get_word_timestamps(&mut self, path: impl AsRef<Path>, text: &str) -> String {
        let path = path.as_ref();
        let result = self.word_timestamps(path, text);
        to_json_or_empty(result, |err| {
            tracing::error!(path = %path.display(), error = %err, "alignment failed");
        })
    }

    /// JSON form of [`word_timestamps_from_buffer`](Self::word_timestamps_from_buffer).
    pub fn get_word_timestamps_from_buffer(
        &mut self,
        bytes: &[u8],
        sample_rate_hz: u32,
        text: &str,
    ) -> String {
        let result = self.word_timestamps_from_buffer(bytes, sample_rate_hz, text);
        to_json_or_empty(result, |err| {
            tracing::error!(
                bytes = bytes.len(),
                sample_rate_hz,
                error = %err,
                "alignment from buffer failed"
            );
        })
    }

    fn align_samples(
        &mut self,
        samples: &[f32],
        text: &str,
    ) -> Result<Vec<WordTimestamp>, AlignmentError> {
        let language = self.language.clone();
        let model = self.ensure_loaded()?;
        let result = model.align(samples, text, &language)?;
        let words = result.into_word_timestamps();
        tracing::debug!(words = words.len(), "alignment finished");
        Ok(words)
    }
}

fn to_json_or_empty(
    result: Result<Vec<WordTimestamp>, AlignmentError>,
    on_error: impl FnOnce(&AlignmentError),
) -> String {
    let serialized = result.and_then(|words| {
        serde_json::to_string_pretty(&words)
            .map_err(|e| AlignmentError::json("serialize word timestamps", e))
    });
    match serialized {
        Ok(json) => json,
        Err(err) => {
            on_error(&err);
            EMPTY_JSON_ARRAY.to_string()
        }
    }
}
