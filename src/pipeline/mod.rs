//! The OCR pipeline.
//!
//! [`InferencePipeline`] walks a directory of page images, segments each page
//! into lines, recognizes the lines and hands a [`PageResult`] to every
//! requested exporter.

mod orchestrator;
pub mod overlay;
mod result;
mod stats;

pub use orchestrator::{CONTROL_IMAGE_DIR, InferencePipeline};
pub use overlay::overlay_mask;
pub use result::PageResult;
pub use stats::PipelineStats;
