use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("PCM16 buffer has an odd byte length ({len})")]
    OddByteLength { len: usize },
    #[error("invalid sample rate: {sample_rate_hz} Hz")]
    InvalidSampleRate { sample_rate_hz: u32 },
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{context}: {message}")]
    Decode {
        context: &'static str,
        message: String,
    },
    #[error("resampling failed: {message}")]
    Resample { message: String },
    #[error("unsupported audio format: {extension}")]
    UnsupportedFormat { extension: String },
}

impl AudioError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn decode(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            context,
            message: err.to_string(),
        }
    }

    pub(crate) fn resample(err: impl std::fmt::Display) -> Self {
        Self::Resample {
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AlignmentError {
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to load alignment model: {message}")]
    ModelLoad { message: String },
    #[error("{context}: {message}")]
    Runtime {
        context: &'static str,
        message: String,
    },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl AlignmentError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub fn model_load(err: impl std::fmt::Display) -> Self {
        Self::ModelLoad {
            message: err.to_string(),
        }
    }

    pub fn runtime(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Runtime {
            context,
            message: err.to_string(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the synthesis facade. Nothing here is caught locally;
/// every variant reaches the caller as the model produced it.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error("failed to load speech model: {message}")]
    ModelLoad { message: String },
    #[error("{context}: {message}")]
    Runtime {
        context: &'static str,
        message: String,
    },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl SynthesisError {
    pub fn model_load(err: impl std::fmt::Display) -> Self {
        Self::ModelLoad {
            message: err.to_string(),
        }
    }

    pub fn runtime(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Runtime {
            context,
            message: err.to_string(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
