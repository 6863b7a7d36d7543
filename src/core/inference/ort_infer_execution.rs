use super::*;
use crate::core::errors::SimpleError;
use ort::value::TensorRef;

impl OrtInfer {
    /// Returns the configured output name, or the first output of the model.
    fn get_output_name(&self) -> Result<String, OCRError> {
        if let Some(ref name) = self.output_name {
            return Ok(name.clone());
        }
        let session = self.sessions[0]
            .lock()
            .map_err(|_| OCRError::invalid_input("failed to acquire session lock"))?;
        session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| {
                OCRError::invalid_input(
                    "model declares no outputs; the weights file may be corrupted",
                )
            })
    }

    pub fn model_path(&self) -> &std::path::Path {
        &self.model_path
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    pub(super) fn checked_dims<const N: usize>(
        &self,
        output_shape: &[i64],
        data_len: usize,
    ) -> Result<[usize; N], OCRError> {
        if output_shape.len() != N {
            return Err(OCRError::tensor_operation_error(
                "output_validation",
                &[N],
                &[output_shape.len()],
                &format!(
                    "model '{}' produced a {}D output with shape {:?}",
                    self.model_name,
                    output_shape.len(),
                    output_shape
                ),
                SimpleError::new("unexpected output rank"),
            ));
        }
        let mut dims = [0usize; N];
        for (dim, &value) in dims.iter_mut().zip(output_shape) {
            *dim = usize::try_from(value).map_err(|_| {
                OCRError::invalid_input(format!(
                    "model '{}' produced a dynamic or negative output dimension: {:?}",
                    self.model_name, output_shape
                ))
            })?;
        }
        let expected_len: usize = dims.iter().product();
        if expected_len != data_len {
            return Err(OCRError::tensor_operation_error(
                "output_data_validation",
                &[expected_len],
                &[data_len],
                &format!("model '{}' output data size mismatch", self.model_name),
                SimpleError::new("output tensor data size mismatch"),
            ));
        }
        Ok(dims)
    }

    pub(super) fn run_inference_with_processor<D, T>(
        &self,
        x: &ndarray::Array<f32, D>,
        processor: impl FnOnce(&[i64], &[f32]) -> Result<T, OCRError>,
    ) -> Result<T, OCRError>
    where
        D: ndarray::Dimension + 'static,
    {
        let input_shape = x.shape().to_vec();

        let output_name = self.get_output_name().map_err(|e| {
            OCRError::inference_error(
                &self.model_name,
                &format!(
                    "failed to resolve output name for model at '{}'",
                    self.model_path.display()
                ),
                e,
            )
        })?;

        let input_tensor = TensorRef::from_array_view(x.view()).map_err(|e| {
            OCRError::model_inference_error(
                &self.model_name,
                "tensor_conversion",
                0,
                &input_shape,
                "failed to convert input tensor",
                e,
            )
        })?;

        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        let idx = self
            .next_idx
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            % self.sessions.len();
        let mut session_guard = self.sessions[idx].lock().map_err(|_| {
            OCRError::inference_error(
                &self.model_name,
                &format!("failed to acquire session {}/{}", idx, self.sessions.len()),
                SimpleError::new("session lock poisoned"),
            )
        })?;

        let outputs = session_guard.run(inputs).map_err(|e| {
            OCRError::model_inference_error(
                &self.model_name,
                "forward_pass",
                0,
                &input_shape,
                &format!(
                    "inference failed with input '{}' -> output '{}'",
                    self.input_name, output_name
                ),
                e,
            )
        })?;

        let (output_shape, output_data) = outputs[output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                OCRError::model_inference_error(
                    &self.model_name,
                    "output_extraction",
                    0,
                    &input_shape,
                    &format!("failed to extract output tensor '{}' as f32", output_name),
                    e,
                )
            })?;

        processor(output_shape, output_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_is_load_error() {
        let err = OrtInfer::new("does/not/exist.onnx", "input_1").unwrap_err();
        assert!(matches!(err, OCRError::ModelLoad { .. }));
        assert!(err.to_string().contains("does/not/exist.onnx"));
    }
}
