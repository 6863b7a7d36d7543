//! # Tibetan OCR
//!
//! Line-level OCR for Tibetan page scans using two ONNX models: a line
//! segmentation network that predicts a text-line mask for the page, and a
//! CTC line recognizer that reads each masked line crop.
//!
//! ## Pipeline
//!
//! 1. The page is contrast-enhanced, padded and resized to the segmentation
//!    input, and the predicted probability map is binarized back at page size.
//! 2. Line contours above a minimum area are sorted top to bottom; each line
//!    is cut out through its own dilated mask.
//! 3. Line crops are resized with padding, recognized in one batch (or one by
//!    one) and greedily decoded into EWTS transliteration, then optionally
//!    converted to Tibetan script.
//! 4. Every page result goes to the requested exporters (plain text, PAGE XML,
//!    labeled line dataset).
//!
//! ## Modules
//!
//! * [`core`] - Errors, configuration, ONNX Runtime inference and constants
//! * [`text`] - Label cleaning, transliteration and the charset
//! * [`processors`] - Contrast enhancement, contours, line masks, CTC decoding
//! * [`models`] - The segmentation and recognition model wrappers
//! * [`predictor`] - Failure-tolerant components behind segmenter and recognizer traits
//! * [`pipeline`] - The page orchestrator, results and statistics
//! * [`export`] - Output writers
//! * [`dataset`] - Training sample pairing, splits and batch loading
//! * [`manifest`] - IIIF manifest download
//! * [`utils`] - Image IO, natural sort and tracing setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tibetan_ocr::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = PipelineConfig::default();
//! config.line.model_path = "models/line_model.onnx".into();
//! config.ocr.model_path = "models/easter.onnx".into();
//! config.ocr.charset_path = "models/charset.json".into();
//!
//! let pipeline = InferencePipeline::from_config(&config)?;
//! let options = RunOptions::new().with_export_formats(["text", "xml"]);
//! let stats = pipeline.run(Path::new("pages"), &options)?;
//! println!("{stats}");
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod dataset;
pub mod export;
pub mod manifest;
pub mod models;
pub mod pipeline;
pub mod predictor;
pub mod processors;
pub mod text;
pub mod utils;

/// Prelude module for convenient imports.
///
/// ```rust
/// use tibetan_ocr::prelude::*;
/// ```
///
/// Covers running the pipeline and reading its results. Dataset preparation,
/// model wrappers and processors are imported from their modules.
pub mod prelude {
    pub use crate::core::config::{
        InferenceMode, OutputEncoding, PipelineConfig, RunOptions,
    };
    pub use crate::core::{OCRError, OcrResult};
    pub use crate::export::{ExportFormat, Exporter};
    pub use crate::pipeline::{InferencePipeline, PageResult, PipelineStats};
    pub use crate::text::Charset;
    pub use crate::utils::{load_image, load_images};
}
