use crate::core::OcrResult;
use crate::processors::{BoundingRect, LineContour};
use image::{GrayImage, RgbImage};

/// Lines found on one page.
#[derive(Debug, Clone)]
pub struct SegmentationResult {
    /// Line crops in reading order.
    pub line_images: Vec<RgbImage>,
    /// Binary mask at page resolution.
    pub mask: GrayImage,
    pub page_bbox: BoundingRect,
    /// Contours in the same order as `line_images`.
    pub contours: Vec<LineContour>,
}

impl SegmentationResult {
    /// A page without lines.
    pub fn empty(mask: GrayImage) -> Self {
        Self {
            line_images: Vec::new(),
            mask,
            page_bbox: BoundingRect::default(),
            contours: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.line_images.is_empty()
    }

    pub fn len(&self) -> usize {
        self.line_images.len()
    }
}

/// Splits a page into ordered line images.
pub trait LineSegmenter {
    fn segment(&self, page: &RgbImage) -> OcrResult<SegmentationResult>;

    /// Whether the segmenter is usable; a disabled one fails every call.
    fn can_run(&self) -> bool {
        true
    }
}

/// Turns line images into text.
pub trait LineRecognizer {
    fn recognize(&self, line: &RgbImage) -> OcrResult<String>;

    fn can_run(&self) -> bool {
        true
    }

    /// Recognizes several lines; the default calls [`recognize`](Self::recognize)
    /// once per line.
    fn recognize_batch(&self, lines: &[RgbImage]) -> OcrResult<Vec<String>> {
        lines.iter().map(|line| self.recognize(line)).collect()
    }
}
