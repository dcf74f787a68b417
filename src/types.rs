use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Mono audio at the rate the alignment model expects, plus its transcript.
#[derive(Debug, Clone)]
pub struct AlignmentInput {
    pub sample_rate_hz: u32,
    pub samples: Vec<f32>,
    pub transcript: String,
}

/// One word as an alignment model reports it. Times are in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedWord {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignedSegment {
    pub words: Vec<AlignedWord>,
}

/// Nested segment/word output of an alignment model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignmentResult {
    pub segments: Vec<AlignedSegment>,
}

impl AlignmentResult {
    /// Flattens segments into a single list in segment-then-word order,
    /// trimming surrounding whitespace from every word.
    pub fn into_word_timestamps(self) -> Vec<WordTimestamp> {
        self.segments
            .into_iter()
            .flat_map(|segment| segment.words)
            .map(|w| WordTimestamp {
                word: w.word.trim().to_string(),
                start: w.start,
                end: w.end,
            })
            .collect()
    }
}

/// Flat word record handed to the host. Field names on the wire are
/// capitalized to match the host's record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTimestamp {
    #[serde(rename = "Word")]
    pub word: String,
    #[serde(rename = "Start")]
    pub start: f64,
    #[serde(rename = "End")]
    pub end: f64,
}

#[derive(Debug, Clone)]
pub struct TokenSequence {
    pub tokens: Vec<usize>,
    pub chars: Vec<Option<char>>,
    /// Transcript normalized with the same logic as emitted token chars.
    pub normalized_words: Vec<String>,
    /// Transcript spelling of each entry in `normalized_words`.
    pub original_words: Vec<String>,
}

/// Decoding knobs forwarded to the speech model untouched.
///
/// No field is range-checked; whatever the host sends is what the model sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    #[serde(default = "default_exaggeration")]
    pub exaggeration: f32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Classifier-free guidance weight.
    #[serde(default = "default_cfg_weight")]
    pub cfg_weight: f32,
    /// Drops tokens whose probability is below `min_p * max_probability`.
    #[serde(default = "default_min_p")]
    pub min_p: f32,
    /// Nucleus sampling mass.
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_repetition_penalty")]
    pub repetition_penalty: f32,
    /// Zero keeps the session RNG as is; anything else reseeds it.
    #[serde(default)]
    pub seed: u64,
}

fn default_exaggeration() -> f32 {
    0.5
}

fn default_temperature() -> f32 {
    0.8
}

fn default_cfg_weight() -> f32 {
    0.5
}

fn default_min_p() -> f32 {
    0.05
}

fn default_top_p() -> f32 {
    1.0
}

fn default_repetition_penalty() -> f32 {
    1.2
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            exaggeration: default_exaggeration(),
            temperature: default_temperature(),
            cfg_weight: default_cfg_weight(),
            min_p: default_min_p(),
            top_p: default_top_p(),
            repetition_penalty: default_repetition_penalty(),
            seed: 0,
        }
    }
}

impl GenerationParams {
    pub fn with_exaggeration(mut self, exaggeration: f32) -> Self {
        self.exaggeration = exaggeration;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_cfg_weight(mut self, cfg_weight: f32) -> Self {
        self.cfg_weight = cfg_weight;
        self
    }

    pub fn with_min_p(mut self, min_p: f32) -> Self {
        self.min_p = min_p;
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    pub fn with_repetition_penalty(mut self, repetition_penalty: f32) -> Self {
        self.repetition_penalty = repetition_penalty;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Voice-conditioning audio for synthesis.
#[derive(Debug, Clone, PartialEq)]
pub enum VoicePrompt {
    Path(PathBuf),
    Buffer { samples: Vec<f32>, sample_rate_hz: u32 },
}

/// Single-channel waveform produced by a speech model.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub sample_rate_hz: u32,
    pub samples: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, start: f64, end: f64) -> AlignedWord {
        AlignedWord {
            word: text.to_string(),
            start,
            end,
        }
    }

    #[test]
    fn flattening_keeps_segment_then_word_order_and_trims() {
        let result = AlignmentResult {
            segments: vec![
                AlignedSegment {
                    words: vec![word(" Hello", 0.0, 0.4), word(" world ", 0.4, 0.9)],
                },
                AlignedSegment { words: vec![] },
                AlignedSegment {
                    words: vec![word("again", 1.2, 1.6)],
                },
            ],
        };
        let flat = result.into_word_timestamps();
        let words: Vec<&str> = flat.iter().map(|w| w.word.as_str()).collect();
        assert_eq!(words, ["Hello", "world", "again"]);
        assert_eq!(flat[2].start, 1.2);
        assert_eq!(flat[2].end, 1.6);
    }

    #[test]
    fn word_timestamp_serializes_with_capitalized_keys() {
        let json = serde_json::to_string(&WordTimestamp {
            word: "test".to_string(),
            start: 0.5,
            end: 1.0,
        })
        .expect("serialize");
        assert_eq!(json, r#"{"Word":"test","Start":0.5,"End":1.0}"#);
    }

    #[test]
    fn generation_params_defaults_fill_missing_fields() {
        let params: GenerationParams =
            serde_json::from_str(r#"{"temperature": 0.3, "seed": 7}"#).expect("parse");
        assert_eq!(params.temperature, 0.3);
        assert_eq!(params.seed, 7);
        assert_eq!(params.cfg_weight, 0.5);
        assert_eq!(params.top_p, 1.0);
    }

    #[test]
    fn generation_params_builders_do_not_validate() {
        let params = GenerationParams::default()
            .with_temperature(-3.0)
            .with_top_p(7.5)
            .with_min_p(-1.0)
            .with_repetition_penalty(0.0)
            .with_cfg_weight(100.0)
            .with_exaggeration(9.0)
            .with_seed(42);
        assert_eq!(params.temperature, -3.0);
        assert_eq!(params.top_p, 7.5);
        assert_eq!(params.min_p, -1.0);
        assert_eq!(params.repetition_penalty, 0.0);
        assert_eq!(params.cfg_weight, 100.0);
        assert_eq!(params.exaggeration, 9.0);
        assert_eq!(params.seed, 42);
    }
}
