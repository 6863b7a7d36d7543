//! Core ONNX Runtime inference engine with a small session pool.

use crate::core::{
    batch::{Tensor3D, Tensor4D},
    errors::OCRError,
};
use ort::{session::Session, value::ValueType};
use std::sync::Mutex;

#[path = "ort_infer_builders.rs"]
mod ort_infer_builders;
#[path = "ort_infer_config.rs"]
mod ort_infer_config;
#[path = "ort_infer_execution.rs"]
mod ort_infer_execution;

pub struct OrtInfer {
    pub(super) sessions: Vec<Mutex<Session>>,
    pub(super) next_idx: std::sync::atomic::AtomicUsize,
    pub(super) input_name: String,
    pub(super) output_name: Option<String>,
    pub(super) model_path: std::path::PathBuf,
    pub(super) model_name: String,
}

impl std::fmt::Debug for OrtInfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtInfer")
            .field("sessions", &self.sessions.len())
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("model_path", &self.model_path)
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl OrtInfer {
    /// Shape of the primary input as declared by the model; dynamic axes are `-1`.
    pub fn primary_input_shape(&self) -> Option<Vec<i64>> {
        let session_guard = self.sessions.first()?.lock().ok()?;
        let input = session_guard.inputs.first()?;
        match &input.input_type {
            ValueType::Tensor { shape, .. } => Some(shape.iter().copied().collect()),
            _ => None,
        }
    }

    /// Runs a model that maps `[B, W, H]` to a 3D output such as `[B, T, C]`.
    pub fn infer_3d(&self, x: &Tensor3D) -> Result<Tensor3D, OCRError> {
        self.run_inference_with_processor(x, |output_shape, output_data| {
            let dims = self.checked_dims::<3>(output_shape, output_data.len())?;
            let view = ndarray::ArrayView3::from_shape((dims[0], dims[1], dims[2]), output_data)
                .map_err(OCRError::Tensor)?;
            Ok(view.to_owned())
        })
    }

    /// Runs a model that maps `[B, H, W, C]` to a 4D output.
    pub fn infer_4d(&self, x: &Tensor4D) -> Result<Tensor4D, OCRError> {
        self.run_inference_with_processor(x, |output_shape, output_data| {
            let dims = self.checked_dims::<4>(output_shape, output_data.len())?;
            let view = ndarray::ArrayView4::from_shape(
                (dims[0], dims[1], dims[2], dims[3]),
                output_data,
            )
            .map_err(OCRError::Tensor)?;
            Ok(view.to_owned())
        })
    }
}
