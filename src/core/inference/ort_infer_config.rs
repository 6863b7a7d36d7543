use super::*;
use crate::core::config::{
    OrtExecutionProvider as EP, OrtGraphOptimizationLevel as OG, OrtSessionConfig,
};
use ort::execution_providers::ExecutionProviderDispatch;
use ort::session::builder::{GraphOptimizationLevel as GOL, SessionBuilder};

impl OrtInfer {
    pub(super) fn apply_ort_config(
        mut builder: SessionBuilder,
        cfg: &OrtSessionConfig,
    ) -> Result<SessionBuilder, ort::Error> {
        if let Some(intra) = cfg.intra_threads {
            builder = builder.with_intra_threads(intra)?;
        }
        if let Some(inter) = cfg.inter_threads {
            builder = builder.with_inter_threads(inter)?;
        }
        if let Some(level) = cfg.optimization_level {
            let mapped = match level {
                OG::DisableAll => GOL::Disable,
                OG::Level1 => GOL::Level1,
                OG::Level2 => GOL::Level2,
                OG::Level3 => GOL::Level3,
            };
            builder = builder.with_optimization_level(mapped)?;
        }
        if let Some(eps) = &cfg.execution_providers {
            let providers = Self::build_execution_providers(eps)?;
            if !providers.is_empty() {
                builder = builder.with_execution_providers(providers)?;
            }
        }
        Ok(builder)
    }

    fn build_execution_providers(
        eps: &[EP],
    ) -> Result<Vec<ExecutionProviderDispatch>, ort::Error> {
        let mut providers = Vec::with_capacity(eps.len());
        for ep in eps {
            match ep {
                EP::CPU => {
                    providers
                        .push(ort::execution_providers::CPUExecutionProvider::default().build());
                }
                #[cfg(feature = "cuda")]
                EP::CUDA {
                    device_id,
                    gpu_mem_limit,
                } => {
                    let mut cuda = ort::execution_providers::CUDAExecutionProvider::default();
                    if let Some(id) = device_id {
                        cuda = cuda.with_device_id(*id);
                    }
                    if let Some(limit) = gpu_mem_limit {
                        cuda = cuda.with_memory_limit(*limit);
                    }
                    providers.push(cuda.build());
                }
                #[cfg(feature = "tensorrt")]
                EP::TensorRT {
                    device_id,
                    fp16_enable,
                } => {
                    let mut trt = ort::execution_providers::TensorRTExecutionProvider::default();
                    if let Some(id) = device_id {
                        trt = trt.with_device_id(*id);
                    }
                    if let Some(fp16) = fp16_enable {
                        trt = trt.with_fp16(*fp16);
                    }
                    providers.push(trt.build());
                }
                #[cfg(feature = "coreml")]
                EP::CoreML { ane_only } => {
                    use ort::execution_providers::coreml::CoreMLComputeUnits;
                    let mut coreml = ort::execution_providers::CoreMLExecutionProvider::default();
                    if let Some(true) = ane_only {
                        coreml = coreml.with_compute_units(CoreMLComputeUnits::CPUAndNeuralEngine);
                    }
                    providers.push(coreml.build());
                }
                #[cfg(feature = "directml")]
                EP::DirectML { device_id } => {
                    let mut dml = ort::execution_providers::DirectMLExecutionProvider::default();
                    if let Some(id) = device_id {
                        dml = dml.with_device_id(*id);
                    }
                    providers.push(dml.build());
                }
                #[allow(unreachable_patterns)]
                other => {
                    return Err(ort::Error::new(format!(
                        "execution provider {other:?} requested but its cargo feature is not enabled"
                    )));
                }
            }
        }
        Ok(providers)
    }
}
