//! Training data preparation.
//!
//! [`OCRDataset`] pairs line images with transcriptions and splits them;
//! [`OCRDataLoader`] turns a split into batches for the alignment-loss
//! training graph, optionally through an [`Augmenter`].

pub mod augmentation;
pub mod loader;
pub mod samples;

pub use augmentation::{Augmenter, RandomRotationZoom};
pub use loader::{Batch, OCRDataLoader};
pub use samples::{
    DatasetSplits, LINES_DIR, OCRDataset, Split, TRANSCRIPTIONS_DIR, create_splits, output_dir_name,
    pair_samples,
};
