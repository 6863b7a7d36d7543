//! Image and tensor processing shared by the line and OCR models.
//!
//! * `clahe` - contrast-limited adaptive histogram equalization
//! * `contours` - contour tracing, area filtering and reading order
//! * `ctc` - greedy CTC decoding of per-timestep probabilities
//! * `line_mask` - dilated masking and cropping of line images
//! * `resize_pad` - aspect-preserving resize with padding

pub mod clahe;
pub mod contours;
pub mod ctc;
pub mod line_mask;
pub mod resize_pad;

pub use clahe::Clahe;
pub use contours::{BoundingRect, LineContour};
pub use ctc::{CTCGreedyDecoder, CtcPath};
pub use line_mask::{ExtractedLines, LineExtractor};
pub use resize_pad::{resize_with_pad, to_time_major};
