//! Pipeline components wrapping the models.
//!
//! A component that fails to load its model stays constructed but disabled:
//! `can_run()` reports `false` and every call returns
//! [`OCRError::ComponentDisabled`](crate::core::OCRError::ComponentDisabled).
//! The orchestrator talks to components through the [`LineSegmenter`] and
//! [`LineRecognizer`] traits.

/// Page to line segmentation
pub mod line_detector;

/// Line recognition
pub mod ocr_inference;

mod traits;

pub use line_detector::LineDetector;
pub use ocr_inference::OcrInference;
pub use traits::{LineRecognizer, LineSegmenter, SegmentationResult};
