//! Configuration of training dataset preparation.

use super::errors::{ConfigError, ConfigValidator};
use crate::core::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_SPLIT_RATIO, MAX_LABEL_LENGTH, OCR_INPUT_HEIGHT, OCR_INPUT_WIDTH,
};
use serde::{Deserialize, Serialize};

/// How a line dataset is split, batched and encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Share of whole batches assigned to training; the rest is halved
    /// between validation and test.
    pub split_ratio: f64,
    pub batch_size: usize,
    /// Shuffle seed; a fresh random order when unset.
    pub seed: Option<u64>,
    /// Write `{split}_imgs.txt` / `{split}_lbls.txt` below the dataset.
    pub write_split_files: bool,
    pub image_width: u32,
    pub image_height: u32,
    /// Fixed length label sequences are padded to.
    pub max_label_length: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            split_ratio: DEFAULT_SPLIT_RATIO,
            batch_size: DEFAULT_BATCH_SIZE,
            seed: None,
            write_split_files: true,
            image_width: OCR_INPUT_WIDTH,
            image_height: OCR_INPUT_HEIGHT,
            max_label_length: MAX_LABEL_LENGTH,
        }
    }
}

impl DatasetConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_split_ratio(mut self, ratio: f64) -> Self {
        self.split_ratio = ratio;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_split_files(mut self, enabled: bool) -> Self {
        self.write_split_files = enabled;
        self
    }
}

impl ConfigValidator for DatasetConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_batch_size(self.batch_size)?;
        self.validate_unit_interval(self.split_ratio, "split_ratio")?;
        self.validate_image_dimensions(self.image_width, self.image_height)?;
        if self.max_label_length == 0 {
            return Err(ConfigError::InvalidConfig {
                message: "max_label_length must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}
