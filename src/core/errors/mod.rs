//! Error types for the OCR pipeline.
//!
//! All fallible operations in the crate return [`OcrResult`]. Errors carry enough
//! context (model name, file path, processing stage) to be logged as a single
//! actionable message at the component boundary.
//!
//! # Usage
//!
//! ```rust
//! use tibetan_ocr::core::errors::OCRError;
//!
//! let error = OCRError::config_error("line model path is empty");
//! assert!(error.to_string().contains("line model"));
//!
//! let error = OCRError::data_integrity("charset lookup", "character 'x' is not in the charset");
//! assert!(error.to_string().contains("charset lookup"));
//! ```

pub mod constructors;

use thiserror::Error;

pub use constructors::SimpleError;

/// Convenient result alias for OCR operations.
pub type OcrResult<T> = Result<T, OCRError>;

/// Stage of the pipeline in which a processing error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Tensor construction or reshaping.
    TensorOperation,
    /// Contrast enhancement and pixel scaling.
    Normalization,
    /// Resizing and padding.
    Resize,
    /// Batch assembly.
    BatchProcessing,
    /// Mask and contour post-processing.
    PostProcessing,
    /// Sequence decoding.
    Decoding,
    /// Writing exports.
    Export,
    /// Anything else.
    Generic,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProcessingStage::TensorOperation => "tensor operation",
            ProcessingStage::Normalization => "normalization",
            ProcessingStage::Resize => "resize",
            ProcessingStage::BatchProcessing => "batch processing",
            ProcessingStage::PostProcessing => "post-processing",
            ProcessingStage::Decoding => "decoding",
            ProcessingStage::Export => "export",
            ProcessingStage::Generic => "processing",
        };
        f.write_str(name)
    }
}

/// Errors that can occur anywhere in the OCR pipeline.
#[derive(Error, Debug)]
pub enum OCRError {
    /// An image could not be opened or decoded.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// A processing step failed.
    #[error("{kind} failed: {context}")]
    Processing {
        kind: ProcessingStage,
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Inference failed outside of the forward pass itself.
    #[error("inference failed in model '{model_name}': {context}")]
    Inference {
        model_name: String,
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The forward pass of a model failed.
    #[error(
        "model '{model_name}' failed during {operation} (batch {batch_index}, input shape {input_shape:?}): {context}"
    )]
    ModelInference {
        model_name: String,
        operation: String,
        batch_index: usize,
        input_shape: Vec<usize>,
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Model weights could not be loaded.
    #[error(
        "failed to load model '{}': {}{}",
        .model_path.display(),
        .reason,
        suggestion_suffix(.suggestion)
    )]
    ModelLoad {
        model_path: std::path::PathBuf,
        reason: String,
        suggestion: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A component was disabled at construction and cannot run.
    #[error("component '{component}' is disabled: {reason}")]
    ComponentDisabled { component: String, reason: String },

    /// Data does not satisfy an integrity requirement (charset lookup, label length).
    #[error("data integrity violation in {context}: {message}")]
    DataIntegrity { context: String, message: String },

    /// Invalid input.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Invalid configuration.
    #[error("configuration: {message}")]
    ConfigError { message: String },

    /// Tensor shape did not match what the operation expects.
    #[error("tensor operation '{operation}' expected shape {expected_shape:?}, got {actual_shape:?}: {context}")]
    TensorOperation {
        operation: String,
        expected_shape: Vec<usize>,
        actual_shape: Vec<usize>,
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Remote request failed.
    #[error("network request to '{url}' failed")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from ndarray reshaping.
    #[error("tensor shape")]
    Tensor(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("json")]
    Json(#[from] serde_json::Error),
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    suggestion
        .as_deref()
        .map(|s| format!(" ({s})"))
        .unwrap_or_default()
}

impl From<image::ImageError> for OCRError {
    fn from(error: image::ImageError) -> Self {
        Self::ImageLoad(error)
    }
}

impl From<crate::core::config::ConfigError> for OCRError {
    fn from(error: crate::core::config::ConfigError) -> Self {
        Self::ConfigError {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_load_error_message_includes_suggestion() {
        let err = OCRError::model_load_error(
            std::path::Path::new("models/lines.onnx"),
            "file not found",
            Some("check the --line-model flag"),
            None::<std::io::Error>,
        );
        let msg = err.to_string();
        assert!(msg.contains("models/lines.onnx"));
        assert!(msg.contains("file not found"));
        assert!(msg.contains("check the --line-model flag"));
    }

    #[test]
    fn test_processing_stage_display() {
        assert_eq!(ProcessingStage::PostProcessing.to_string(), "post-processing");
        assert_eq!(ProcessingStage::Export.to_string(), "export");
    }

    #[test]
    fn test_config_error_conversion() {
        let err: OCRError = crate::core::config::ConfigError::InvalidConfig {
            message: "bad threshold".to_string(),
        }
        .into();
        assert!(matches!(err, OCRError::ConfigError { .. }));
        assert!(err.to_string().contains("bad threshold"));
    }
}
