use super::traits::{LineSegmenter, SegmentationResult};
use crate::core::config::{ConfigValidator, LineDetectorConfig};
use crate::core::{OCRError, OcrResult};
use crate::models::{LineModel, LineModelBuilder};
use crate::processors::LineExtractor;
use image::RgbImage;

const COMPONENT: &str = "LineDetector";

/// Segments pages into line images with the line model.
#[derive(Debug)]
pub struct LineDetector {
    model: Option<LineModel>,
    extractor: LineExtractor,
    load_error: Option<String>,
}

impl LineDetector {
    /// Loads the line model. A load failure is logged and leaves the detector
    /// disabled instead of failing construction.
    pub fn new(config: &LineDetectorConfig) -> Self {
        match Self::try_new(config) {
            Ok(detector) => {
                tracing::info!("{} initialized successfully: true", COMPONENT);
                detector
            }
            Err(err) => {
                tracing::error!("error loading line model: {}", err);
                tracing::info!("{} initialized successfully: false", COMPONENT);
                Self {
                    model: None,
                    extractor: extractor_for(config),
                    load_error: Some(err.to_string()),
                }
            }
        }
    }

    /// Loads the line model, returning the load error instead of disabling.
    pub fn try_new(config: &LineDetectorConfig) -> OcrResult<Self> {
        config.validate()?;
        let model = LineModelBuilder::from_config(config).build(&config.model_path)?;
        Ok(Self {
            model: Some(model),
            extractor: extractor_for(config),
            load_error: None,
        })
    }

    pub fn can_run(&self) -> bool {
        self.model.is_some()
    }

    /// Segments `image` into line crops, its mask, page box and contours.
    /// A page without contours gives an empty result, not an error.
    pub fn run(&self, image: &RgbImage) -> OcrResult<SegmentationResult> {
        let model = self.model.as_ref().ok_or_else(|| {
            OCRError::component_disabled(
                COMPONENT,
                self.load_error.as_deref().unwrap_or("model not loaded"),
            )
        })?;

        let mask = model.forward(image)?;
        let lines = self.extractor.extract(image, &mask);
        tracing::debug!("line detector found {} line(s)", lines.contours.len());
        Ok(SegmentationResult {
            line_images: lines.line_images,
            mask,
            page_bbox: lines.page_bbox,
            contours: lines.contours,
        })
    }
}

impl LineSegmenter for LineDetector {
    fn segment(&self, page: &RgbImage) -> OcrResult<SegmentationResult> {
        self.run(page)
    }

    fn can_run(&self) -> bool {
        LineDetector::can_run(self)
    }
}

fn extractor_for(config: &LineDetectorConfig) -> LineExtractor {
    LineExtractor::new(
        config.min_contour_area,
        config.dilation_kernel,
        config.dilation_iterations,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_disables_detector() {
        let detector = LineDetector::new(&LineDetectorConfig::new("/nonexistent/line.onnx"));
        assert!(!detector.can_run());
        let err = detector.run(&RgbImage::new(10, 10)).unwrap_err();
        assert!(matches!(err, OCRError::ComponentDisabled { .. }));
    }

    #[test]
    fn test_try_new_reports_load_error() {
        let err = LineDetector::try_new(&LineDetectorConfig::new("/nonexistent/line.onnx"))
            .unwrap_err();
        assert!(matches!(err, OCRError::ModelLoad { .. }));
    }

    #[test]
    fn test_disabled_detector_fails_through_trait() {
        let detector = LineDetector::new(&LineDetectorConfig::new("/nonexistent/line.onnx"));
        let segmenter: &dyn LineSegmenter = &detector;
        assert!(segmenter.segment(&RgbImage::new(4, 4)).is_err());
    }
}
