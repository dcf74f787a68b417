use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::SynthesisError;
use crate::pipeline::traits::{SpeechModel, SpeechModelLoader, SynthesisRequest};
use crate::types::{GenerationParams, SynthesizedAudio, VoicePrompt};

/// Host-facing text-to-speech facade.
///
/// Errors from the loader or the model are returned as they are; the session
/// adds no handling of its own.
pub struct SynthesisSession {
    loader: Box<dyn SpeechModelLoader>,
    model: Option<Box<dyn SpeechModel>>,
    rng: StdRng,
}

impl SynthesisSession {
    pub fn new(loader: impl SpeechModelLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            model: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Wraps an already loaded model; the session never calls a loader.
    pub fn with_model(model: Box<dyn SpeechModel>) -> Self {
        let mut session = Self::new(|| -> Result<Box<dyn SpeechModel>, SynthesisError> {
            Err(SynthesisError::model_load("session was built around a preloaded model"))
        });
        session.model = Some(model);
        session
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Loads the model now and reports its output rate.
    pub fn load(&mut self) -> Result<u32, SynthesisError> {
        Ok(self.ensure_loaded()?.sample_rate_hz())
    }

    /// Synthesizes `text` in the voice of the audio file at `voice_path`.
    pub fn generate(
        &mut self,
        text: &str,
        voice_path: impl AsRef<Path>,
        params: &GenerationParams,
    ) -> Result<SynthesizedAudio, SynthesisError> {
        let voice = VoicePrompt::Path(voice_path.as_ref().to_path_buf());
        self.run(text, &voice, params)
    }

    /// Synthesizes `text` in the voice of in-memory mono samples.
    pub fn generate_from_buffer(
        &mut self,
        text: &str,
        voice_samples: &[f32],
        voice_sample_rate_hz: u32,
        params: &GenerationParams,
    ) -> Result<SynthesizedAudio, SynthesisError> {
        let voice = VoicePrompt::Buffer {
            samples: voice_samples.to_vec(),
            sample_rate_hz: voice_sample_rate_hz,
        };
        self.run(text, &voice, params)
    }

    fn ensure_loaded(&mut self) -> Result<&mut (dyn SpeechModel + 'static), SynthesisError> {
        if self.model.is_none() {
            tracing::info!("Loading speech model...");
            let model = self.loader.load()?;
            tracing::info!(sample_rate_hz = model.sample_rate_hz(), "speech model loaded");
            self.model = Some(model);
        }
        match self.model.as_deref_mut() {
            Some(model) => Ok(model),
            None => Err(SynthesisError::model_load("model missing after load")),
        }
    }

    fn run(
        &mut self,
        text: &str,
        voice: &VoicePrompt,
        params: &GenerationParams,
    ) -> Result<SynthesizedAudio, SynthesisError> {
        self.ensure_loaded()?;
        if params.seed != 0 {
            self.rng = StdRng::seed_from_u64(params.seed);
        }

        let request = SynthesisRequest {
            text,
            voice,
            params,
        };
        let Self { model, rng, .. } = self;
        let model = match model.as_deref_mut() {
            Some(model) => model,
            None => return Err(SynthesisError::model_load("model missing after load")),
        };
        let samples = model.generate(request, rng)?;
        let sample_rate_hz = model.sample_rate_hz();
        tracing::debug!(
            sample_rate_hz,
            samples = samples.len(),
            seed = params.seed,
            "speech generated"
        );
        Ok(SynthesizedAudio {
            sample_rate_hz,
            samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use rand::Rng;

    use super::*;

    /// Emits one random sample per character, scaled by the temperature.
    struct NoiseModel;

    impl SpeechModel for NoiseModel {
        fn sample_rate_hz(&self) -> u32 {
            24_000
        }

        fn generate(
            &mut self,
            request: SynthesisRequest<'_>,
            rng: &mut StdRng,
        ) -> Result<Vec<f32>, SynthesisError> {
            Ok(request
                .text
                .chars()
                .map(|_| rng.gen_range(-1.0f32..1.0) * request.params.temperature)
                .collect())
        }
    }

    /// Reports which kind of voice prompt it was given.
    struct VoiceEcho;

    impl SpeechModel for VoiceEcho {
        fn sample_rate_hz(&self) -> u32 {
            22_050
        }

        fn generate(
            &mut self,
            request: SynthesisRequest<'_>,
            _rng: &mut StdRng,
        ) -> Result<Vec<f32>, SynthesisError> {
            match request.voice {
                VoicePrompt::Path(path) if path.ends_with("voice.wav") => Ok(vec![1.0]),
                VoicePrompt::Buffer {
                    samples,
                    sample_rate_hz: 16_000,
                } => Ok(vec![2.0; samples.len()]),
                _ => Err(SynthesisError::invalid_input("unexpected voice prompt")),
            }
        }
    }

    #[test]
    fn nonzero_seed_is_reproducible() {
        let mut session = SynthesisSession::with_model(Box::new(NoiseModel));
        let params = GenerationParams::default().with_seed(1234);
        let first = session.generate("hello there", "v.wav", &params).expect("gen");
        let second = session.generate("hello there", "v.wav", &params).expect("gen");
        assert_eq!(first, second);
        assert_eq!(first.sample_rate_hz, 24_000);
    }

    #[test]
    fn zero_seed_keeps_advancing_the_stream() {
        let mut session = SynthesisSession::with_model(Box::new(NoiseModel));
        let seeded = GenerationParams::default().with_seed(99);
        let unseeded = GenerationParams::default();
        session.generate("x", "v.wav", &seeded).expect("seed");
        let first = session.generate("hello there", "v.wav", &unseeded).expect("gen");
        let second = session.generate("hello there", "v.wav", &unseeded).expect("gen");
        assert_ne!(first.samples, second.samples);
    }

    #[test]
    fn voice_prompt_matches_entry_point() {
        let mut session = SynthesisSession::with_model(Box::new(VoiceEcho));
        let params = GenerationParams::default();
        let from_path = session
            .generate("hi", "/voices/voice.wav", &params)
            .expect("path prompt");
        assert_eq!(from_path.samples, vec![1.0]);
        let from_buffer = session
            .generate_from_buffer("hi", &[0.0; 3], 16_000, &params)
            .expect("buffer prompt");
        assert_eq!(from_buffer.samples, vec![2.0; 3]);
        assert_eq!(from_buffer.sample_rate_hz, 22_050);
    }

    #[test]
    fn model_errors_propagate_unchanged() {
        let mut session = SynthesisSession::with_model(Box::new(VoiceEcho));
        let err = session
            .generate_from_buffer("hi", &[0.0], 8_000, &GenerationParams::default())
            .expect_err("wrong prompt");
        assert!(matches!(err, SynthesisError::InvalidInput { .. }));
    }

    #[test]
    fn loads_lazily_and_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let mut session = SynthesisSession::new(move || -> Result<Box<dyn SpeechModel>, SynthesisError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(NoiseModel))
        });
        assert!(!session.is_loaded());
        assert_eq!(session.load().expect("load"), 24_000);
        session
            .generate("abc", "v.wav", &GenerationParams::default())
            .expect("gen");
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn load_errors_propagate() {
        let mut session = SynthesisSession::new(|| -> Result<Box<dyn SpeechModel>, SynthesisError> {
            Err(SynthesisError::model_load("checkpoint missing"))
        });
        let err = session
            .generate("abc", "v.wav", &GenerationParams::default())
            .expect_err("load fails");
        assert!(matches!(err, SynthesisError::ModelLoad { .. }));
        assert!(!session.is_loaded());
    }
}
