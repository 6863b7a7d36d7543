//! Configuration types and validation.

pub mod dataset;
pub mod errors;
pub mod onnx;
pub mod pipeline;

pub use dataset::DatasetConfig;
pub use errors::{ConfigError, ConfigValidator};
pub use onnx::{OrtExecutionProvider, OrtGraphOptimizationLevel, OrtSessionConfig};
pub use pipeline::{
    DownloadPolicy, InferenceMode, LineDetectorConfig, OcrModelConfig, OutputEncoding,
    PipelineConfig, RunOptions,
};
