//! Line segmentation network.
//!
//! The network takes a contrast-enhanced, fixed-size page in NHWC layout and
//! returns a per-pixel line probability. The model turns that into a binary
//! mask at the resolution of the original page.

use crate::core::config::{LineDetectorConfig, OrtSessionConfig};
use crate::core::constants::{
    DEFAULT_CLAHE_CLIP_LIMIT, DEFAULT_CLAHE_TILE_GRID, DEFAULT_LINE_THRESHOLD,
    LINE_MODEL_INPUT_HEIGHT, LINE_MODEL_INPUT_NAME, LINE_MODEL_INPUT_WIDTH,
    LINE_MODEL_OUTPUT_NAME,
};
use crate::core::inference::OrtInfer;
use crate::core::{OCRError, OcrResult, Tensor4D};
use crate::processors::Clahe;
use image::{GrayImage, RgbImage, imageops::FilterType};
use std::path::Path;

#[derive(Debug)]
pub struct LineModel {
    inference: OrtInfer,
    clahe: Clahe,
    input_width: u32,
    input_height: u32,
    threshold: f32,
}

impl LineModel {
    pub fn new(
        inference: OrtInfer,
        clahe: Clahe,
        input_size: (u32, u32),
        threshold: f32,
    ) -> Self {
        Self {
            inference,
            clahe,
            input_width: input_size.0,
            input_height: input_size.1,
            threshold,
        }
    }

    pub fn input_size(&self) -> (u32, u32) {
        (self.input_width, self.input_height)
    }

    /// Grayscale, CLAHE, resize to the network input, then replicate to three
    /// channels scaled to `[0, 1]`. Output shape is `[1, H, W, 3]`.
    pub fn preprocess(&self, image: &RgbImage) -> Tensor4D {
        prepare_page(&self.clahe, image, self.input_width, self.input_height)
    }

    pub fn infer(&self, input: &Tensor4D) -> OcrResult<Tensor4D> {
        self.inference.infer_4d(input).map_err(|e| {
            OCRError::model_inference_error(
                self.inference.model_name(),
                "line segmentation",
                0,
                input.shape(),
                "forward pass failed",
                e,
            )
        })
    }

    /// Binarizes the prediction and scales it back to `width`×`height`.
    pub fn postprocess(&self, prediction: &Tensor4D, width: u32, height: u32) -> OcrResult<GrayImage> {
        let expected = (self.input_width * self.input_height) as usize;
        if prediction.len() != expected {
            return Err(OCRError::tensor_operation_error(
                "squeeze line prediction",
                &[1, self.input_height as usize, self.input_width as usize, 1],
                prediction.shape(),
                "prediction does not hold one value per input pixel",
                crate::core::errors::SimpleError::new("unexpected output size"),
            ));
        }
        let mask = binarize(
            prediction.iter().copied(),
            self.input_width,
            self.input_height,
            self.threshold,
        );
        Ok(image::imageops::resize(&mask, width, height, FilterType::Triangle))
    }

    /// Runs the whole model and returns the page-sized 0/255 mask.
    pub fn forward(&self, image: &RgbImage) -> OcrResult<GrayImage> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(OCRError::invalid_input("page image is empty"));
        }
        let input = self.preprocess(image);
        let prediction = self.infer(&input)?;
        self.postprocess(&prediction, width, height)
    }
}

pub(crate) fn prepare_page(clahe: &Clahe, image: &RgbImage, width: u32, height: u32) -> Tensor4D {
    let gray = image::imageops::grayscale(image);
    let enhanced = clahe.apply(&gray);
    let resized = image::imageops::resize(&enhanced, width, height, FilterType::Triangle);
    Tensor4D::from_shape_fn((1, height as usize, width as usize, 3), |(_, y, x, _)| {
        f32::from(resized.get_pixel(x as u32, y as u32)[0]) / 255.0
    })
}

/// Maps row-major probabilities to a 0/255 mask: strictly above `threshold`
/// is foreground.
pub(crate) fn binarize(
    probabilities: impl Iterator<Item = f32>,
    width: u32,
    height: u32,
    threshold: f32,
) -> GrayImage {
    let raw: Vec<u8> = probabilities
        .map(|p| if p > threshold { 255 } else { 0 })
        .collect();
    GrayImage::from_raw(width, height, raw).unwrap_or_else(|| GrayImage::new(width, height))
}

/// Builder for [`LineModel`].
#[derive(Debug, Clone)]
pub struct LineModelBuilder {
    input_name: String,
    output_name: String,
    input_size: (u32, u32),
    threshold: f32,
    clahe_clip_limit: f32,
    clahe_tile_grid: u32,
    ort_config: Option<OrtSessionConfig>,
}

impl Default for LineModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineModelBuilder {
    pub fn new() -> Self {
        Self {
            input_name: LINE_MODEL_INPUT_NAME.to_string(),
            output_name: LINE_MODEL_OUTPUT_NAME.to_string(),
            input_size: (LINE_MODEL_INPUT_WIDTH, LINE_MODEL_INPUT_HEIGHT),
            threshold: DEFAULT_LINE_THRESHOLD,
            clahe_clip_limit: DEFAULT_CLAHE_CLIP_LIMIT,
            clahe_tile_grid: DEFAULT_CLAHE_TILE_GRID,
            ort_config: None,
        }
    }

    /// Takes every model setting from a detector configuration.
    pub fn from_config(config: &LineDetectorConfig) -> Self {
        Self {
            input_name: config.input_name.clone(),
            output_name: config.output_name.clone(),
            input_size: (config.input_width, config.input_height),
            threshold: config.threshold,
            clahe_clip_limit: config.clahe_clip_limit,
            clahe_tile_grid: config.clahe_tile_grid,
            ort_config: config.ort_session.clone(),
        }
    }

    pub fn input_size(mut self, width: u32, height: u32) -> Self {
        self.input_size = (width, height);
        self
    }

    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn clahe(mut self, clip_limit: f32, tile_grid: u32) -> Self {
        self.clahe_clip_limit = clip_limit;
        self.clahe_tile_grid = tile_grid;
        self
    }

    pub fn with_ort_config(mut self, config: OrtSessionConfig) -> Self {
        self.ort_config = Some(config);
        self
    }

    pub fn build(self, model_path: &Path) -> OcrResult<LineModel> {
        let inference = OrtInfer::from_config(
            self.ort_config.as_ref(),
            model_path,
            &self.input_name,
            Some(&self.output_name),
        )?;
        let clahe = Clahe::new(
            self.clahe_clip_limit,
            (self.clahe_tile_grid, self.clahe_tile_grid),
        );
        Ok(LineModel::new(inference, clahe, self.input_size, self.threshold))
    }
}
