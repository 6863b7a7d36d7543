//! ONNX Runtime session settings.

use serde::{Deserialize, Serialize};

/// Graph optimization levels for ONNX Runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrtGraphOptimizationLevel {
    /// Disable all optimizations.
    DisableAll,
    /// Basic optimizations.
    #[default]
    Level1,
    /// Extended optimizations.
    Level2,
    /// All optimizations.
    Level3,
}

/// Execution providers, in order of preference.
///
/// Everything except [`OrtExecutionProvider::CPU`] requires the matching cargo feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum OrtExecutionProvider {
    /// CPU execution provider (always available).
    #[default]
    CPU,
    /// NVIDIA CUDA.
    CUDA {
        device_id: Option<i32>,
        /// Memory limit in bytes.
        gpu_mem_limit: Option<usize>,
    },
    /// NVIDIA TensorRT.
    TensorRT {
        device_id: Option<i32>,
        fp16_enable: Option<bool>,
    },
    /// Apple CoreML.
    CoreML {
        /// Restrict to CPU and Neural Engine.
        ane_only: Option<bool>,
    },
    /// Windows DirectML.
    DirectML { device_id: Option<i32> },
}

/// Configuration for ONNX Runtime sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrtSessionConfig {
    /// Threads used to parallelize execution within nodes.
    pub intra_threads: Option<usize>,
    /// Threads used to parallelize execution across nodes.
    pub inter_threads: Option<usize>,
    pub optimization_level: Option<OrtGraphOptimizationLevel>,
    pub execution_providers: Option<Vec<OrtExecutionProvider>>,
    /// Number of sessions kept for concurrent callers.
    pub session_pool_size: Option<usize>,
}

impl OrtSessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = Some(threads);
        self
    }

    pub fn with_inter_threads(mut self, threads: usize) -> Self {
        self.inter_threads = Some(threads);
        self
    }

    pub fn with_optimization_level(mut self, level: OrtGraphOptimizationLevel) -> Self {
        self.optimization_level = Some(level);
        self
    }

    pub fn with_execution_providers(mut self, providers: Vec<OrtExecutionProvider>) -> Self {
        self.execution_providers = Some(providers);
        self
    }

    /// Adds one execution provider to the end of the preference list.
    pub fn add_execution_provider(mut self, provider: OrtExecutionProvider) -> Self {
        self.execution_providers
            .get_or_insert_with(Vec::new)
            .push(provider);
        self
    }

    pub fn with_session_pool_size(mut self, size: usize) -> Self {
        self.session_pool_size = Some(size);
        self
    }

    /// Number of sessions to create, at least one.
    pub fn pool_size(&self) -> usize {
        self.session_pool_size.unwrap_or(1).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let config = OrtSessionConfig::new()
            .with_intra_threads(4)
            .with_optimization_level(OrtGraphOptimizationLevel::Level3)
            .add_execution_provider(OrtExecutionProvider::CPU);
        assert_eq!(config.intra_threads, Some(4));
        assert_eq!(
            config.optimization_level,
            Some(OrtGraphOptimizationLevel::Level3)
        );
        assert_eq!(
            config.execution_providers,
            Some(vec![OrtExecutionProvider::CPU])
        );
    }

    #[test]
    fn test_pool_size_never_zero() {
        assert_eq!(OrtSessionConfig::new().pool_size(), 1);
        assert_eq!(OrtSessionConfig::new().with_session_pool_size(0).pool_size(), 1);
        assert_eq!(OrtSessionConfig::new().with_session_pool_size(3).pool_size(), 3);
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: OrtSessionConfig = serde_json::from_str(
            r#"{"intra_threads": 2, "execution_providers": [{"CUDA": {"device_id": 1, "gpu_mem_limit": null}}]}"#,
        )
        .unwrap();
        assert_eq!(config.intra_threads, Some(2));
        assert_eq!(
            config.execution_providers,
            Some(vec![OrtExecutionProvider::CUDA {
                device_id: Some(1),
                gpu_mem_limit: None
            }])
        );
    }
}
