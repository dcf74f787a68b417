use std::path::Path;

use serde::Deserialize;

use crate::error::AlignmentError;

/// Settings for building the CTC alignment model.
///
/// Deserializable so hosts on the other side of the C boundary can hand over a
/// JSON object; every field is optional there and falls back to [`Default`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlignerConfig {
    pub model_path: String,
    pub config_path: String,
    pub vocab_path: String,
    pub device: String,
    pub expected_sample_rate_hz: u32,
    pub language: String,
}

impl AlignerConfig {
    pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 16_000;
    pub const DEFAULT_LANGUAGE: &'static str = "en";

    /// Points every path at the conventional file names inside `dir`.
    pub fn from_model_dir(dir: impl AsRef<Path>, model_filename: &str) -> Self {
        let dir = dir.as_ref();
        let join = |name: &str| -> String { dir.join(name).to_string_lossy().into_owned() };
        Self {
            model_path: join(model_filename),
            config_path: join("config.json"),
            vocab_path: join("vocab.json"),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, AlignmentError> {
        serde_json::from_str(json).map_err(|e| AlignmentError::json("parse aligner config", e))
    }

    pub(crate) fn sample_rate_or_default(&self) -> u32 {
        if self.expected_sample_rate_hz == 0 {
            Self::DEFAULT_SAMPLE_RATE_HZ
        } else {
            self.expected_sample_rate_hz
        }
    }
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            model_path: String::new(),
            config_path: String::new(),
            vocab_path: String::new(),
            device: "cpu".to_string(),
            expected_sample_rate_hz: Self::DEFAULT_SAMPLE_RATE_HZ,
            language: Self::DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// The subset of a wav2vec2-style `config.json` the aligner needs.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CtcModelConfig {
    pub conv_stride: Vec<usize>,
    pub pad_token_id: usize,
    #[serde(default)]
    pub vocab_size: Option<usize>,
}

impl CtcModelConfig {
    pub(crate) fn load(path: &Path) -> Result<Self, AlignmentError> {
        let data =
            std::fs::read_to_string(path).map_err(|e| AlignmentError::io("read config.json", e))?;
        serde_json::from_str(&data).map_err(|e| AlignmentError::json("parse config.json", e))
    }

    pub(crate) fn frame_stride_secs(&self, sample_rate: u32) -> f64 {
        let stride_samples: usize = self.conv_stride.iter().product();
        stride_samples as f64 / sample_rate as f64
    }
}
