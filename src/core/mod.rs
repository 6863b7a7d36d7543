//! The core module of the OCR pipeline.
//!
//! Contains error handling, configuration, the ONNX Runtime inference engine,
//! shared constants, tensor aliases and validation helpers.

pub mod batch;
pub mod config;
pub mod constants;
pub mod errors;
pub mod inference;
pub mod validation;

pub use batch::{Tensor1D, Tensor2D, Tensor3D, Tensor4D};
pub use config::{ConfigError, ConfigValidator, OrtSessionConfig};
pub use constants::*;
pub use errors::{OCRError, OcrResult, ProcessingStage};
pub use inference::OrtInfer;
