use std::path::PathBuf;

use clap::Parser;
use speech_bridge::{AlignerConfig, AlignmentSession, CtcAlignerLoader};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "align_words")]
#[command(about = "Print word-level timestamps for a transcript spoken in an audio file")]
struct Args {
    /// WAV or FLAC file to align.
    audio_file_path: PathBuf,
    /// Transcript of the audio.
    text: String,
    #[arg(long, env = "SPEECH_BRIDGE_MODEL_DIR", default_value = "models/wav2vec2")]
    model_dir: PathBuf,
    #[arg(long, env = "SPEECH_BRIDGE_MODEL_FILE", default_value = "model.onnx")]
    model_file: String,
    #[arg(long, env = "SPEECH_BRIDGE_DEVICE", default_value = "cpu")]
    device: String,
    #[arg(long, env = "SPEECH_BRIDGE_LANGUAGE", default_value = AlignerConfig::DEFAULT_LANGUAGE)]
    language: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = AlignerConfig {
        device: args.device,
        language: args.language.clone(),
        ..AlignerConfig::from_model_dir(&args.model_dir, &args.model_file)
    };
    tracing::debug!(?config, "aligner configuration");

    let mut session =
        AlignmentSession::new(CtcAlignerLoader::new(config)).with_language(args.language);
    let json = session.get_word_timestamps(&args.audio_file_path, &args.text);
    println!("{json}");
}
