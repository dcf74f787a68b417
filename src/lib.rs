pub mod alignment;
pub mod audio;
pub mod bridge;
pub mod config;
pub mod error;
pub mod ffi;
pub mod pipeline;
pub mod synthesis;
pub mod types;

pub use alignment::session::AlignmentSession;
pub use bridge::{SpeechBridge, TimedSpeech};
pub use config::AlignerConfig;
pub use error::{AlignmentError, AudioError, SynthesisError};
pub use pipeline::builder::{CtcAlignerBuilder, CtcAlignerLoader};
pub use pipeline::runtime::CtcAligner;
pub use pipeline::traits::{
    AlignmentModel, AlignmentModelLoader, EmissionBackend, SequenceAligner, SpeechModel,
    SpeechModelLoader, SynthesisRequest, Tokenizer, WordGrouper,
};
pub use synthesis::sampling::TokenSampler;
pub use synthesis::session::SynthesisSession;
pub use types::{
    AlignedSegment, AlignedWord, AlignmentInput, AlignmentResult, GenerationParams,
    SynthesizedAudio, TokenSequence, VoicePrompt, WordTimestamp,
};
