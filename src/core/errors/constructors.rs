//! Helper constructors for [`OCRError`].

use super::{OCRError, ProcessingStage};
use std::path::Path;

/// Plain message error used as a source when no underlying error exists.
#[derive(Debug)]
pub struct SimpleError {
    message: String,
}

impl SimpleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SimpleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SimpleError {}

impl OCRError {
    /// Creates a processing error for the given stage.
    pub fn processing_error(
        kind: ProcessingStage,
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates a post-processing error.
    pub fn post_processing(
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::processing_error(ProcessingStage::PostProcessing, context, error)
    }

    /// Creates an export error.
    pub fn export_error(context: &str, error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::processing_error(ProcessingStage::Export, context, error)
    }

    /// Creates an inference error with model context.
    pub fn inference_error(
        model_name: &str,
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference {
            model_name: model_name.to_string(),
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates an error for a failed forward pass.
    pub fn model_inference_error(
        model_name: &str,
        operation: &str,
        batch_index: usize,
        input_shape: &[usize],
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ModelInference {
            model_name: model_name.to_string(),
            operation: operation.to_string(),
            batch_index,
            input_shape: input_shape.to_vec(),
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates a model loading error.
    ///
    /// # Arguments
    ///
    /// * `model_path` - Path of the weights file that failed to load.
    /// * `reason` - Short description of the failure.
    /// * `suggestion` - Optional hint shown to the user.
    /// * `source` - Optional underlying error.
    pub fn model_load_error<E>(
        model_path: &Path,
        reason: &str,
        suggestion: Option<&str>,
        source: Option<E>,
    ) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ModelLoad {
            model_path: model_path.to_path_buf(),
            reason: reason.to_string(),
            suggestion: suggestion.map(str::to_string),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Creates an error for a tensor whose shape does not match.
    pub fn tensor_operation_error(
        operation: &str,
        expected_shape: &[usize],
        actual_shape: &[usize],
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::TensorOperation {
            operation: operation.to_string(),
            expected_shape: expected_shape.to_vec(),
            actual_shape: actual_shape.to_vec(),
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Creates a data integrity error.
    pub fn data_integrity(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataIntegrity {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Creates an error for a component that was disabled at construction.
    pub fn component_disabled(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ComponentDisabled {
            component: component.into(),
            reason: reason.into(),
        }
    }

    /// Creates a network error for the given URL.
    pub fn network_error(url: &str, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.to_string(),
            source,
        }
    }
}
