use super::*;
use crate::core::config::OrtSessionConfig;
use ort::logging::LogLevel;
use std::path::Path;

impl OrtInfer {
    /// Creates an engine with default runtime settings and a single session.
    pub fn new(model_path: impl AsRef<Path>, input_name: &str) -> Result<Self, OCRError> {
        Self::from_config(None, model_path, input_name, None)
    }

    /// Creates an engine, applying the optional session configuration to every
    /// session in the pool.
    pub fn from_config(
        config: Option<&OrtSessionConfig>,
        model_path: impl AsRef<Path>,
        input_name: &str,
        output_name: Option<&str>,
    ) -> Result<Self, OCRError> {
        let path = model_path.as_ref();
        if !path.is_file() {
            return Err(OCRError::model_load_error(
                path,
                "weights file does not exist",
                Some("pass the path of an exported .onnx model"),
                None::<std::io::Error>,
            ));
        }

        let pool_size = config.map(OrtSessionConfig::pool_size).unwrap_or(1);
        let mut sessions = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let builder = Session::builder()?.with_log_level(LogLevel::Error)?;
            let builder = match config {
                Some(cfg) => Self::apply_ort_config(builder, cfg)?,
                None => builder,
            };
            let session = builder.commit_from_file(path).map_err(|e| {
                OCRError::model_load_error(
                    path,
                    "failed to create ONNX session",
                    Some("check the execution provider configuration and the model file"),
                    Some(e),
                )
            })?;
            sessions.push(Mutex::new(session));
        }

        let model_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown_model")
            .to_string();

        tracing::debug!(
            "loaded model '{}' with {} session(s), input '{}'",
            model_name,
            sessions.len(),
            input_name
        );

        Ok(OrtInfer {
            sessions,
            next_idx: std::sync::atomic::AtomicUsize::new(0),
            input_name: input_name.to_string(),
            output_name: output_name.map(str::to_string),
            model_path: path.to_path_buf(),
            model_name,
        })
    }
}
