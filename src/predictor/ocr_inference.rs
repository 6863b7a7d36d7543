use super::traits::LineRecognizer;
use crate::core::config::{ConfigValidator, OcrModelConfig};
use crate::core::{OCRError, OcrResult, Tensor2D};
use crate::models::{EasterModel, EasterModelBuilder};
use crate::text::Charset;
use image::RgbImage;

const COMPONENT: &str = "OcrInference";

/// Line recognizer built from the Easter2 weights and their charset.
#[derive(Debug)]
pub struct OcrInference {
    model: Option<EasterModel>,
    load_error: Option<String>,
}

impl OcrInference {
    /// Loads the recognizer; failures are logged and disable it.
    pub fn new(config: &OcrModelConfig, charset: Charset) -> Self {
        match Self::try_new(config, charset) {
            Ok(inference) => {
                tracing::info!("{} initialized successfully: true", COMPONENT);
                inference
            }
            Err(err) => {
                tracing::error!("error loading OCR model: {}", err);
                tracing::info!("{} initialized successfully: false", COMPONENT);
                Self {
                    model: None,
                    load_error: Some(err.to_string()),
                }
            }
        }
    }

    pub fn try_new(config: &OcrModelConfig, charset: Charset) -> OcrResult<Self> {
        config.validate()?;
        let model = EasterModelBuilder::from_config(config)
            .charset(charset)
            .build(&config.model_path)?;
        Ok(Self {
            model: Some(model),
            load_error: None,
        })
    }

    pub fn can_run(&self) -> bool {
        self.model.is_some()
    }

    fn model(&self) -> OcrResult<&EasterModel> {
        self.model.as_ref().ok_or_else(|| {
            OCRError::component_disabled(
                COMPONENT,
                self.load_error.as_deref().unwrap_or("model not loaded"),
            )
        })
    }

    /// Recognizes one line, returning the text and the `[T, C]` probabilities.
    pub fn run(&self, image: &RgbImage) -> OcrResult<(String, Tensor2D)> {
        self.model()?.run(image)
    }

    /// Recognizes all lines in one forward pass.
    pub fn run_batched(&self, images: &[RgbImage]) -> OcrResult<Vec<String>> {
        self.model()?.run_batched(images)
    }
}

impl LineRecognizer for OcrInference {
    fn recognize(&self, line: &RgbImage) -> OcrResult<String> {
        self.run(line).map(|(text, _)| text)
    }

    fn recognize_batch(&self, lines: &[RgbImage]) -> OcrResult<Vec<String>> {
        self.run_batched(lines)
    }

    fn can_run(&self) -> bool {
        OcrInference::can_run(self)
    }
}
