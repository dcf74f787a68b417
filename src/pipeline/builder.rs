use std::collections::HashMap;
use std::path::Path;

use crate::config::{AlignerConfig, CtcModelConfig};
use crate::error::AlignmentError;
use crate::pipeline::defaults::{CaseAwareTokenizer, SpanWordGrouper, ViterbiSequenceAligner};
use crate::pipeline::model_runtime::build_emission_backend;
use crate::pipeline::runtime::{CtcAligner, CtcAlignerParts};
use crate::pipeline::traits::{
    AlignmentModel, AlignmentModelLoader, EmissionBackend, SequenceAligner, Tokenizer,
    WordGrouper,
};

pub struct CtcAlignerBuilder {
    config: AlignerConfig,
    emission_backend: Option<Box<dyn EmissionBackend>>,
    tokenizer: Option<Box<dyn Tokenizer>>,
    sequence_aligner: Option<Box<dyn SequenceAligner>>,
    word_grouper: Option<Box<dyn WordGrouper>>,
}

impl CtcAlignerBuilder {
    pub fn new(config: AlignerConfig) -> Self {
        Self {
            config,
            emission_backend: None,
            tokenizer: None,
            sequence_aligner: None,
            word_grouper: None,
        }
    }

    pub fn with_emission_backend(mut self, emission_backend: Box<dyn EmissionBackend>) -> Self {
        self.emission_backend = Some(emission_backend);
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: Box<dyn Tokenizer>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    pub fn with_sequence_aligner(mut self, sequence_aligner: Box<dyn SequenceAligner>) -> Self {
        self.sequence_aligner = Some(sequence_aligner);
        self
    }

    pub fn with_word_grouper(mut self, word_grouper: Box<dyn WordGrouper>) -> Self {
        self.word_grouper = Some(word_grouper);
        self
    }

    pub fn build(self) -> Result<CtcAligner, AlignmentError> {
        let model_cfg = CtcModelConfig::load(Path::new(&self.config.config_path))?;
        let expected_sample_rate_hz = self.config.sample_rate_or_default();
        let frame_stride_secs = model_cfg.frame_stride_secs(expected_sample_rate_hz);
        let blank_id = model_cfg.pad_token_id;

        let vocab = load_vocab(Path::new(&self.config.vocab_path))?;
        let word_sep_id = vocab.get(&'|').copied().unwrap_or(0);
        if let Some(vocab_size) = model_cfg.vocab_size {
            if let Some((&c, &id)) = vocab.iter().find(|&(_, &id)| id >= vocab_size) {
                return Err(AlignmentError::invalid_input(format!(
                    "vocab entry '{c}' has id {id}, outside model vocab_size {vocab_size}"
                )));
            }
        }

        let emission_backend = match self.emission_backend {
            Some(emission_backend) => emission_backend,
            None => build_emission_backend(&self.config)?,
        };

        tracing::info!(
            vocab = vocab.len(),
            frame_stride_secs,
            device = %emission_backend.device_label(),
            "CTC aligner built"
        );

        Ok(CtcAligner::from_parts(CtcAlignerParts {
            emission_backend,
            vocab,
            blank_id,
            word_sep_id,
            frame_stride_secs,
            expected_sample_rate_hz,
            tokenizer: self
                .tokenizer
                .unwrap_or_else(|| Box::new(CaseAwareTokenizer)),
            sequence_aligner: self
                .sequence_aligner
                .unwrap_or_else(|| Box::new(ViterbiSequenceAligner)),
            word_grouper: self
                .word_grouper
                .unwrap_or_else(|| Box::new(SpanWordGrouper)),
        }))
    }
}

/// Loader that builds a [`CtcAligner`] with the default pipeline from a config.
#[derive(Debug, Clone)]
pub struct CtcAlignerLoader {
    config: AlignerConfig,
}

impl CtcAlignerLoader {
    pub fn new(config: AlignerConfig) -> Self {
        Self { config }
    }
}

impl AlignmentModelLoader for CtcAlignerLoader {
    fn load(&self) -> Result<Box<dyn AlignmentModel>, AlignmentError> {
        let aligner = CtcAlignerBuilder::new(self.config.clone())
            .build()
            .map_err(AlignmentError::model_load)?;
        Ok(Box::new(aligner))
    }
}

fn load_vocab(path: &Path) -> Result<HashMap<char, usize>, AlignmentError> {
    let data =
        std::fs::read_to_string(path).map_err(|e| AlignmentError::io("read vocab.json", e))?;
    let raw: HashMap<String, usize> =
        serde_json::from_str(&data).map_err(|e| AlignmentError::json("parse vocab.json", e))?;

    Ok(raw
        .into_iter()
        .filter_map(|(k, v)| {
            let mut it = k.chars();
            let c = it.next()?;
            if it.next().is_some() {
                return None;
            }
            Some((c, v))
        })
        .collect())
}
