//! Easter2 line recognizer.
//!
//! Line images are converted to grayscale, fitted into a fixed canvas with
//! padding and laid out width-major so the width becomes the CTC time axis.
//! The network emits a charset distribution per timestep which is decoded
//! with the greedy best path.

use crate::core::config::{OcrModelConfig, OrtSessionConfig};
use crate::core::constants::{OCR_INPUT_HEIGHT, OCR_INPUT_NAME, OCR_INPUT_WIDTH};
use crate::core::inference::OrtInfer;
use crate::core::validation::validate_non_empty;
use crate::core::{OCRError, OcrResult, Tensor2D, Tensor3D};
use crate::processors::{CTCGreedyDecoder, resize_with_pad, to_time_major};
use crate::text::{Charset, restore_separators};
use image::RgbImage;
use ndarray::{ArrayView2, Axis};
use std::path::Path;

/// Easter2 model together with the charset it was trained on.
#[derive(Debug)]
pub struct EasterModel {
    inference: OrtInfer,
    charset: Charset,
    decoder: CTCGreedyDecoder,
    input_width: u32,
    input_height: u32,
}

impl EasterModel {
    pub fn new(inference: OrtInfer, charset: Charset, input_size: (u32, u32)) -> Self {
        let decoder = CTCGreedyDecoder::new(charset.blank_index());
        Self {
            inference,
            charset,
            decoder,
            input_width: input_size.0,
            input_height: input_size.1,
        }
    }

    pub fn charset(&self) -> &Charset {
        &self.charset
    }

    /// Preprocesses one line image into a `[W, H]` matrix.
    pub fn prepare_line(&self, image: &RgbImage) -> Tensor2D {
        prepare_line(image, self.input_width, self.input_height)
    }

    /// Stacks prepared lines into a `[B, W, H]` batch.
    pub fn preprocess(&self, images: &[RgbImage]) -> OcrResult<Tensor3D> {
        validate_non_empty(images, "images")?;
        let prepared: Vec<Tensor2D> = images.iter().map(|img| self.prepare_line(img)).collect();
        let views: Vec<_> = prepared.iter().map(|t| t.view()).collect();
        Ok(ndarray::stack(Axis(0), &views)?)
    }

    /// Runs the network, returning `[B, T, C]` probabilities.
    pub fn infer(&self, batch: &Tensor3D) -> OcrResult<Tensor3D> {
        let output = self.inference.infer_3d(batch).map_err(|e| {
            OCRError::model_inference_error(
                self.inference.model_name(),
                "line recognition",
                0,
                batch.shape(),
                "forward pass failed",
                e,
            )
        })?;
        let classes = output.shape()[2];
        if classes != self.charset.len() {
            return Err(OCRError::config_error(format!(
                "recognizer emits {} classes but the charset has {} tokens",
                classes,
                self.charset.len()
            )));
        }
        Ok(output)
    }

    /// Greedy-decodes one `[T, C]` matrix and restores word separators.
    pub fn decode(&self, probabilities: ArrayView2<f32>) -> String {
        let path = self.decoder.decode(probabilities);
        restore_separators(&self.charset.decode(&path.indices))
    }

    /// Decodes a `[B, T, C]` batch item by item.
    pub fn postprocess(&self, probabilities: &Tensor3D) -> Vec<String> {
        self.decoder
            .decode_batch(probabilities)
            .into_iter()
            .map(|path| restore_separators(&self.charset.decode(&path.indices)))
            .collect()
    }

    /// Recognizes a single line and also returns the raw `[T, C]` output.
    pub fn run(&self, image: &RgbImage) -> OcrResult<(String, Tensor2D)> {
        let batch = self.preprocess(std::slice::from_ref(image))?;
        let output = self.infer(&batch)?;
        let probabilities = output.index_axis(Axis(0), 0).to_owned();
        let text = self.decode(probabilities.view());
        Ok((text, probabilities))
    }

    /// Recognizes all lines with a single forward pass.
    pub fn run_batched(&self, images: &[RgbImage]) -> OcrResult<Vec<String>> {
        if images.is_empty() {
            return Ok(Vec::new());
        }
        let batch = self.preprocess(images)?;
        let output = self.infer(&batch)?;
        Ok(self.postprocess(&output))
    }
}

pub(crate) fn prepare_line(image: &RgbImage, width: u32, height: u32) -> Tensor2D {
    let gray = image::imageops::grayscale(image);
    let padded = resize_with_pad(&gray, width, height);
    to_time_major(&padded)
}

/// Builder for [`EasterModel`].
#[derive(Debug, Clone)]
pub struct EasterModelBuilder {
    charset: Option<Charset>,
    input_name: String,
    output_name: Option<String>,
    input_size: (u32, u32),
    expected_fingerprint: Option<String>,
    ort_config: Option<OrtSessionConfig>,
}

impl Default for EasterModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EasterModelBuilder {
    pub fn new() -> Self {
        Self {
            charset: None,
            input_name: OCR_INPUT_NAME.to_string(),
            output_name: None,
            input_size: (OCR_INPUT_WIDTH, OCR_INPUT_HEIGHT),
            expected_fingerprint: None,
            ort_config: None,
        }
    }

    /// Takes the model settings from a recognizer configuration. The charset
    /// still has to be supplied.
    pub fn from_config(config: &OcrModelConfig) -> Self {
        Self {
            charset: None,
            input_name: config.input_name.clone(),
            output_name: config.output_name.clone(),
            input_size: (config.input_width, config.input_height),
            expected_fingerprint: config.charset_fingerprint.clone(),
            ort_config: config.ort_session.clone(),
        }
    }

    pub fn charset(mut self, charset: Charset) -> Self {
        self.charset = Some(charset);
        self
    }

    pub fn input_size(mut self, width: u32, height: u32) -> Self {
        self.input_size = (width, height);
        self
    }

    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Requires the charset to hash to `fingerprint`.
    pub fn expected_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.expected_fingerprint = Some(fingerprint.into());
        self
    }

    pub fn with_ort_config(mut self, config: OrtSessionConfig) -> Self {
        self.ort_config = Some(config);
        self
    }

    /// Builds the model. The charset is checked against the configured
    /// fingerprint and against a fingerprint file next to the weights before
    /// any session is created.
    pub fn build(self, model_path: &Path) -> OcrResult<EasterModel> {
        let charset = self
            .charset
            .ok_or_else(|| OCRError::config_error("recognizer needs a charset"))?;
        if charset.len() < 3 {
            return Err(OCRError::config_error(format!(
                "charset has only {} tokens",
                charset.len()
            )));
        }

        if let Some(expected) = &self.expected_fingerprint {
            charset.verify_fingerprint(expected)?;
        }
        if charset.verify_fingerprint_file(model_path)? {
            tracing::debug!("charset fingerprint matches {}", model_path.display());
        }

        let inference = OrtInfer::from_config(
            self.ort_config.as_ref(),
            model_path,
            &self.input_name,
            self.output_name.as_deref(),
        )?;
        Ok(EasterModel::new(inference, charset, self.input_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn charset() -> Charset {
        Charset::from_labels(["ka", "kha"])
    }

    #[test]
    fn test_prepare_line_is_time_major() {
        let image = RgbImage::from_pixel(400, 40, Rgb([255, 255, 255]));
        let tensor = prepare_line(&image, 200, 20);
        assert_eq!(tensor.shape(), &[200, 20]);
        assert!(tensor[[100, 10]] > 0.9);
    }

    #[test]
    fn test_prepare_line_pads_short_lines() {
        let image = RgbImage::from_pixel(40, 40, Rgb([255, 255, 255]));
        let tensor = prepare_line(&image, 200, 20);
        assert_eq!(tensor[[0, 10]], 0.0);
        assert!(tensor[[100, 10]] > 0.9);
    }

    #[test]
    fn test_build_requires_charset() {
        let err = EasterModelBuilder::new()
            .build(Path::new("/nonexistent/ocr.onnx"))
            .unwrap_err();
        assert!(matches!(err, OCRError::ConfigError { .. }));
    }

    #[test]
    fn test_build_rejects_fingerprint_mismatch() {
        let err = EasterModelBuilder::new()
            .charset(charset())
            .expected_fingerprint("00ff")
            .build(Path::new("/nonexistent/ocr.onnx"))
            .unwrap_err();
        assert!(matches!(err, OCRError::DataIntegrity { .. }));
    }

    #[test]
    fn test_build_checks_sidecar_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("ocr.onnx");
        std::fs::write(Charset::fingerprint_path(&model), "deadbeef\n").unwrap();
        let err = EasterModelBuilder::new()
            .charset(charset())
            .build(&model)
            .unwrap_err();
        assert!(matches!(err, OCRError::DataIntegrity { .. }));
    }

    #[test]
    fn test_build_with_matching_fingerprint_reaches_model_load() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("ocr.onnx");
        let charset = charset();
        charset.write_fingerprint_file(&model).unwrap();
        let err = EasterModelBuilder::new()
            .expected_fingerprint(charset.fingerprint())
            .charset(charset)
            .build(&model)
            .unwrap_err();
        assert!(matches!(err, OCRError::ModelLoad { .. }));
    }
}
