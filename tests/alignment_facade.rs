use std::path::PathBuf;

use speech_bridge::audio::encode_pcm16_le;
use speech_bridge::{
    AlignerConfig, AlignmentError, AlignmentSession, AudioError, CtcAlignerBuilder,
    EmissionBackend, WordTimestamp,
};

const CONFIG_JSON: &str = r#"{
    "conv_stride": [5, 2, 2, 2, 2, 2, 2],
    "pad_token_id": 0,
    "vocab_size": 8
}"#;

const VOCAB_JSON: &str = r#"{"<pad>": 0, "|": 1, "t": 2, "e": 3, "s": 4, "h": 5, "i": 6, "o": 7}"#;

/// Same distribution over the vocabulary at every 320-sample frame.
struct UniformBackend {
    vocab_size: usize,
}

impl EmissionBackend for UniformBackend {
    fn infer(&self, normalized_audio: &[f32]) -> Result<Vec<Vec<f32>>, AlignmentError> {
        let frames = normalized_audio.len() / 320;
        let log_p = -(self.vocab_size as f32).ln();
        Ok(vec![vec![log_p; self.vocab_size]; frames])
    }

    fn device_label(&self) -> String {
        "uniform".to_string()
    }
}

struct ModelDir {
    dir: PathBuf,
}

impl ModelDir {
    fn create(tag: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("speech_bridge_facade_{tag}"));
        std::fs::create_dir_all(&dir).expect("create model dir");
        std::fs::write(dir.join("config.json"), CONFIG_JSON).expect("write config");
        std::fs::write(dir.join("vocab.json"), VOCAB_JSON).expect("write vocab");
        Self { dir }
    }

    fn session(&self) -> AlignmentSession {
        let config = AlignerConfig::from_model_dir(&self.dir, "model.onnx");
        let aligner = CtcAlignerBuilder::new(config)
            .with_emission_backend(Box::new(UniformBackend { vocab_size: 8 }))
            .build()
            .expect("build aligner");
        AlignmentSession::with_model(Box::new(aligner))
    }
}

impl Drop for ModelDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

#[test]
fn one_second_of_silence_yields_json_array() {
    let model_dir = ModelDir::create("silence");
    let mut session = model_dir.session();
    let pcm = encode_pcm16_le(&vec![0.0; 16_000]);

    let json = session.get_word_timestamps_from_buffer(&pcm, 16_000, "test");
    let words: Vec<WordTimestamp> = serde_json::from_str(&json).expect("JSON array");
    assert_eq!(words.len(), 1);
    assert_eq!(words[0].word, "test");
    assert!(words[0].start < words[0].end);
    assert!(words[0].end <= 1.0 + 1e-9);
}

#[test]
fn words_come_back_in_transcript_order() {
    let model_dir = ModelDir::create("order");
    let mut session = model_dir.session();
    let pcm = encode_pcm16_le(&vec![0.0; 32_000]);

    let words = session
        .word_timestamps_from_buffer(&pcm, 16_000, "Hi, this test")
        .expect("align");
    let spelled: Vec<&str> = words.iter().map(|w| w.word.as_str()).collect();
    assert_eq!(spelled, ["Hi,", "this", "test"]);
    for pair in words.windows(2) {
        assert!(pair[0].end <= pair[1].start);
    }
}

#[test]
fn resampled_buffer_is_aligned_at_model_rate() {
    let model_dir = ModelDir::create("resample");
    let mut session = model_dir.session();
    let pcm = encode_pcm16_le(&vec![0.0; 44_100]);

    let words = session
        .word_timestamps_from_buffer(&pcm, 44_100, "test")
        .expect("align");
    assert_eq!(words.len(), 1);
    assert!(words[0].end <= 1.0 + 1e-9);
}

#[test]
fn degenerate_inputs_yield_empty_array() {
    let model_dir = ModelDir::create("degenerate");
    let mut session = model_dir.session();
    let pcm = encode_pcm16_le(&[0.0; 1_600]);

    assert_eq!(session.get_word_timestamps_from_buffer(&[], 16_000, "test"), "[]");
    assert_eq!(session.get_word_timestamps_from_buffer(&pcm, 16_000, ""), "[]");
    assert_eq!(session.get_word_timestamps_from_buffer(&pcm[..3], 16_000, "test"), "[]");
    assert_eq!(session.get_word_timestamps_from_buffer(&pcm, 0, "test"), "[]");

    let err = session
        .word_timestamps_from_buffer(&pcm[..3], 16_000, "test")
        .expect_err("odd length");
    assert!(matches!(
        err,
        AlignmentError::Audio(AudioError::OddByteLength { len: 3 })
    ));
}

#[test]
fn too_short_audio_is_reported_by_typed_api_only() {
    let model_dir = ModelDir::create("short");
    let mut session = model_dir.session();
    // one frame cannot hold two words
    let pcm = encode_pcm16_le(&[0.0; 320]);

    let err = session
        .word_timestamps_from_buffer(&pcm, 16_000, "this test")
        .expect_err("too short");
    assert!(matches!(err, AlignmentError::InvalidInput { .. }));
    assert_eq!(
        session.get_word_timestamps_from_buffer(&pcm, 16_000, "this test"),
        "[]"
    );
}

#[test]
fn aligns_wav_file_on_disk() {
    let model_dir = ModelDir::create("wav");
    let mut session = model_dir.session();
    let wav_path = model_dir.dir.join("clip.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 22_050,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&wav_path, spec).expect("create wav");
    for _ in 0..22_050 {
        writer.write_sample(0i16).expect("write sample");
    }
    writer.finalize().expect("finalize");

    let json = session.get_word_timestamps(&wav_path, "hi this test");
    let words: Vec<WordTimestamp> = serde_json::from_str(&json).expect("JSON array");
    assert_eq!(words.len(), 3);
    assert_eq!(session.get_word_timestamps(model_dir.dir.join("clip.mp3"), "hi"), "[]");
}
