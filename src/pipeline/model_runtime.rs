use crate::config::AlignerConfig;
use crate::error::AlignmentError;
use crate::pipeline::traits::EmissionBackend;

pub(crate) fn build_emission_backend(
    config: &AlignerConfig,
) -> Result<Box<dyn EmissionBackend>, AlignmentError> {
    #[cfg(feature = "onnx")]
    {
        Ok(Box::new(onnx::OnnxEmissionBackend::load(config)?))
    }

    #[cfg(not(feature = "onnx"))]
    {
        let _ = config;
        Err(AlignmentError::runtime(
            "build emission backend",
            "ONNX runtime support is disabled; enable the `onnx` cargo feature",
        ))
    }
}

/// Splits flat `[1, T, V]` or `[T, V]` logits into per-frame log-probabilities.
#[cfg(any(feature = "onnx", test))]
pub(crate) fn logits_to_log_probs(
    dims: &[i64],
    logits: &[f32],
) -> Result<Vec<Vec<f32>>, AlignmentError> {
    let (num_frames, vocab_size) = parse_output_shape(dims, logits.len())?;
    Ok((0..num_frames)
        .map(|t| log_softmax_row(&logits[t * vocab_size..(t + 1) * vocab_size]))
        .collect())
}

#[cfg(any(feature = "onnx", test))]
fn parse_output_shape(dims: &[i64], logits_len: usize) -> Result<(usize, usize), AlignmentError> {
    let (num_frames, vocab_size) = match dims {
        [batch, t, v] => {
            if *batch != 1 {
                return Err(AlignmentError::invalid_input(format!(
                    "logits batch size must be 1, got {batch}"
                )));
            }
            (positive_dim(*t, "time")?, positive_dim(*v, "vocab")?)
        }
        [t, v] => (positive_dim(*t, "time")?, positive_dim(*v, "vocab")?),
        _ => {
            return Err(AlignmentError::invalid_input(format!(
                "unsupported logits rank {}; expected [1, T, V] or [T, V]",
                dims.len()
            )));
        }
    };

    let expected_len = num_frames
        .checked_mul(vocab_size)
        .ok_or_else(|| AlignmentError::invalid_input("logits shape is too large"))?;
    if expected_len != logits_len {
        return Err(AlignmentError::invalid_input(format!(
            "logits shape/data mismatch: shape implies {expected_len} values, got {logits_len}"
        )));
    }
    Ok((num_frames, vocab_size))
}

#[cfg(any(feature = "onnx", test))]
fn positive_dim(value: i64, name: &'static str) -> Result<usize, AlignmentError> {
    if value <= 0 {
        return Err(AlignmentError::invalid_input(format!(
            "logits {name} dimension must be > 0, got {value}"
        )));
    }
    Ok(value as usize)
}

#[cfg(any(feature = "onnx", test))]
fn log_softmax_row(logits: &[f32]) -> Vec<f32> {
    let max_logit = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let sum_exp: f64 = logits.iter().map(|&x| ((x - max_logit) as f64).exp()).sum();
    let log_denom = max_logit + sum_exp.ln() as f32;
    logits.iter().map(|&x| x - log_denom).collect()
}

#[cfg(feature = "onnx")]
mod onnx {
    use std::path::Path;
    use std::sync::Mutex;

    use super::logits_to_log_probs;
    use crate::config::AlignerConfig;
    use crate::error::AlignmentError;
    use crate::pipeline::traits::EmissionBackend;

    pub(crate) struct OnnxEmissionBackend {
        session: Mutex<ort::session::Session>,
        device_label: String,
    }

    impl OnnxEmissionBackend {
        pub(crate) fn load(config: &AlignerConfig) -> Result<Self, AlignmentError> {
            let device_label = parse_device(&config.device)?;
            let session = ort::session::Session::builder()
                .map_err(|e| AlignmentError::runtime("onnx session builder", e))?
                .with_execution_providers(execution_providers(device_label))
                .map_err(|e| AlignmentError::runtime("onnx execution providers", e))?
                .commit_from_file(Path::new(&config.model_path))
                .map_err(|e| AlignmentError::runtime("onnx model load", e))?;

            tracing::info!(
                model_path = %config.model_path,
                device = device_label,
                "ONNX emission backend loaded"
            );

            Ok(Self {
                session: Mutex::new(session),
                device_label: device_label.to_string(),
            })
        }
    }

    impl EmissionBackend for OnnxEmissionBackend {
        fn infer(&self, normalized_audio: &[f32]) -> Result<Vec<Vec<f32>>, AlignmentError> {
            let input = ort::value::TensorRef::from_array_view((
                [1usize, normalized_audio.len()],
                normalized_audio,
            ))
            .map_err(|e| AlignmentError::runtime("onnx input tensor", e))?;
            let mut session = self
                .session
                .lock()
                .map_err(|_| AlignmentError::runtime("onnx session lock", "session mutex poisoned"))?;
            let outputs = session
                .run(ort::inputs![input])
                .map_err(|e| AlignmentError::runtime("onnx forward pass", e))?;
            if outputs.len() == 0 {
                return Err(AlignmentError::runtime(
                    "onnx forward pass",
                    "model produced no outputs",
                ));
            }
            let (shape, logits) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| AlignmentError::runtime("onnx extract logits", e))?;
            let dims: Vec<i64> = shape.iter().copied().collect();
            logits_to_log_probs(&dims, logits)
        }

        fn device_label(&self) -> String {
            self.device_label.clone()
        }
    }

    fn execution_providers(device: &str) -> Vec<ort::ep::ExecutionProviderDispatch> {
        match device {
            "cuda" => vec![
                ort::ep::CUDA::default().with_device_id(0).build(),
                ort::ep::CPU::default().build(),
            ],
            _ => vec![ort::ep::CPU::default().build()],
        }
    }

    fn parse_device(device: &str) -> Result<&'static str, AlignmentError> {
        if device.eq_ignore_ascii_case("cpu") {
            Ok("cpu")
        } else if device.eq_ignore_ascii_case("cuda") {
            Ok("cuda")
        } else {
            Err(AlignmentError::invalid_input(format!(
                "unsupported ONNX device '{device}', expected 'cpu' or 'cuda'"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batched_logits_become_log_probs() {
        let logits = vec![0.0f32, 0.0, 2.0, 0.0];
        let log_probs = logits_to_log_probs(&[1, 2, 2], &logits).expect("valid shape");
        assert_eq!(log_probs.len(), 2);
        let expected = -(2.0f32).ln();
        assert!((log_probs[0][0] - expected).abs() < 1e-6);
        let row_sum: f32 = log_probs[1].iter().map(|x| x.exp()).sum();
        assert!((row_sum - 1.0).abs() < 1e-5);
        assert!(log_probs[1][0] > log_probs[1][1]);
    }

    #[test]
    fn rejects_non_unit_batch() {
        let err = logits_to_log_probs(&[2, 1, 2], &[0.0; 4]).expect_err("batch of 2");
        assert!(err.to_string().contains("batch size must be 1"));
    }

    #[test]
    fn rejects_len_mismatch() {
        let err = logits_to_log_probs(&[3, 2], &[0.0; 5]).expect_err("mismatch");
        assert!(err.to_string().contains("shape/data mismatch"));
    }

    #[test]
    fn rejects_unsupported_rank() {
        assert!(logits_to_log_probs(&[6], &[0.0; 6]).is_err());
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn default_backend_requires_onnx_feature() {
        let err = build_emission_backend(&AlignerConfig::default())
            .err()
            .expect("backend must be unavailable");
        assert!(err.to_string().contains("onnx"));
    }
}
