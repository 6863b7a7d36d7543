//! Pairing of line images with transcriptions, dataset splits and charset
//! building.
//!
//! A dataset directory holds `lines/*.jpg` and `transcriptions/*.txt`; files
//! with the same base name form a sample. Samples are shuffled once and cut
//! into whole batches for training, validation and test.

use crate::core::config::{ConfigValidator, DatasetConfig};
use crate::core::validation::{validate_positive, validate_range};
use crate::core::{OCRError, OcrResult};
use crate::text::{Charset, read_label};
use crate::utils::{list_files_with_extensions, natural_cmp};
use chrono::{Datelike, Local, Timelike};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::io::Write;
use std::ops::Range;
use std::path::{Path, PathBuf};

pub const LINES_DIR: &str = "lines";
pub const TRANSCRIPTIONS_DIR: &str = "transcriptions";

/// A dataset split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Val, Split::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }
}

/// Index ranges of the three splits over the shuffled samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSplits {
    pub train: Range<usize>,
    pub val: Range<usize>,
    pub test: Range<usize>,
}

impl DatasetSplits {
    pub fn range(&self, split: Split) -> Range<usize> {
        match split {
            Split::Train => self.train.clone(),
            Split::Val => self.val.clone(),
            Split::Test => self.test.clone(),
        }
    }
}

/// Cuts `sample_count` samples into whole batches. Training gets
/// `floor(batches * ratio)` batches, validation half of the remainder and
/// test the same number again. Leftover samples are unused.
pub fn create_splits(sample_count: usize, batch_size: usize, ratio: f64) -> OcrResult<DatasetSplits> {
    validate_positive(batch_size, "batch_size")?;
    validate_range(ratio, 0.0, 1.0, "split_ratio")?;
    let max_batches = (sample_count - sample_count % batch_size) / batch_size;
    let train_batches = (max_batches as f64 * ratio).floor() as usize;
    let val_batches = (max_batches - train_batches) / 2;

    let train_end = train_batches * batch_size;
    let val_end = train_end + val_batches * batch_size;
    let test_end = val_end + val_batches * batch_size;
    Ok(DatasetSplits {
        train: 0..train_end,
        val: train_end..val_end,
        test: val_end..test_end,
    })
}

/// Directory name for split files, e.g. `Output_2024_5_1_13_7`.
pub fn output_dir_name(time: &chrono::DateTime<Local>) -> String {
    format!(
        "Output_{}_{}_{}_{}_{}",
        time.year(),
        time.month(),
        time.day(),
        time.hour(),
        time.minute()
    )
}

/// Line image and transcription pairs of a dataset directory.
#[derive(Debug, Clone)]
pub struct OCRDataset {
    directory: PathBuf,
    images: Vec<PathBuf>,
    labels: Vec<PathBuf>,
    splits: DatasetSplits,
    output_dir: PathBuf,
    charset: Option<Charset>,
}

impl OCRDataset {
    /// Pairs, shuffles and splits the samples under `directory`, writing the
    /// split files when the configuration asks for them.
    pub fn new(directory: impl Into<PathBuf>, config: &DatasetConfig) -> OcrResult<Self> {
        config.validate()?;
        let directory = directory.into();
        let (mut images, mut labels) = pair_samples(&directory)?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut order: Vec<usize> = (0..images.len()).collect();
        order.shuffle(&mut rng);
        images = order.iter().map(|&i| images[i].clone()).collect();
        labels = order.iter().map(|&i| labels[i].clone()).collect();

        let splits = create_splits(images.len(), config.batch_size, config.split_ratio)?;
        tracing::info!("Train Set: {}", splits.train.len());
        tracing::info!("Validation Set: {}", splits.val.len());
        tracing::info!("Test Set: {}", splits.test.len());

        let output_dir = directory.join(output_dir_name(&Local::now()));
        let dataset = Self {
            directory,
            images,
            labels,
            splits,
            output_dir,
            charset: None,
        };
        if config.write_split_files {
            dataset.save_splits()?;
        }
        Ok(dataset)
    }

    /// Uses a known charset instead of building one from the labels.
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = Some(charset);
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn splits(&self) -> &DatasetSplits {
        &self.splits
    }

    /// Image and label paths of `split`.
    pub fn split_data(&self, split: Split) -> (Vec<PathBuf>, Vec<PathBuf>) {
        let range = self.splits.range(split);
        (self.images[range.clone()].to_vec(), self.labels[range].to_vec())
    }

    pub fn train_data(&self) -> (Vec<PathBuf>, Vec<PathBuf>) {
        self.split_data(Split::Train)
    }

    pub fn val_data(&self) -> (Vec<PathBuf>, Vec<PathBuf>) {
        self.split_data(Split::Val)
    }

    pub fn test_data(&self) -> (Vec<PathBuf>, Vec<PathBuf>) {
        self.split_data(Split::Test)
    }

    /// Writes `{split}_imgs.txt` and `{split}_lbls.txt` for every split.
    pub fn save_splits(&self) -> OcrResult<()> {
        std::fs::create_dir_all(&self.output_dir)?;
        for split in Split::ALL {
            let (images, labels) = self.split_data(split);
            write_list(&self.output_dir.join(format!("{}_imgs.txt", split.as_str())), &images)?;
            write_list(&self.output_dir.join(format!("{}_lbls.txt", split.as_str())), &labels)?;
        }
        Ok(())
    }

    /// Builds the charset from every label of the dataset and keeps it.
    pub fn build_charset(&mut self) -> OcrResult<&Charset> {
        let labels = self
            .labels
            .iter()
            .map(|path| read_label(path))
            .collect::<OcrResult<Vec<_>>>()?;
        let charset = Charset::from_labels(&labels);
        tracing::debug!("built charset of {} tokens from {} labels", charset.len(), labels.len());
        Ok(self.charset.insert(charset))
    }

    /// The charset, built on first use.
    pub fn charset(&mut self) -> OcrResult<&Charset> {
        if self.charset.is_none() {
            tracing::info!("charset has not been built, building charset");
            self.build_charset()?;
        }
        self.charset
            .as_ref()
            .ok_or_else(|| OCRError::config_error("charset unavailable"))
    }
}

/// Pairs `lines/*.jpg` with `transcriptions/*.txt` by base name, in natural
/// order of the name.
pub fn pair_samples(directory: &Path) -> OcrResult<(Vec<PathBuf>, Vec<PathBuf>)> {
    let images = list_files_with_extensions(&directory.join(LINES_DIR), &["jpg"])?;
    let labels = list_files_with_extensions(&directory.join(TRANSCRIPTIONS_DIR), &["txt"])?;
    tracing::info!("Total Images: {}, Total Labels: {}", images.len(), labels.len());

    let label_by_name: HashMap<String, PathBuf> = labels
        .into_iter()
        .map(|path| (base_name(&path), path))
        .collect();
    let mut pairs: Vec<(String, PathBuf, PathBuf)> = images
        .into_iter()
        .filter_map(|image| {
            let name = base_name(&image);
            let label = label_by_name.get(&name)?.clone();
            Some((name, image, label))
        })
        .collect();
    pairs.sort_by(|a, b| natural_cmp(&a.0, &b.0));
    pairs.dedup_by(|a, b| a.0 == b.0);

    Ok(pairs.into_iter().map(|(_, image, label)| (image, label)).unzip())
}

/// File name up to its first dot.
fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy())
        .and_then(|n| n.split('.').next().map(str::to_string))
        .unwrap_or_default()
}

fn write_list(path: &Path, entries: &[PathBuf]) -> OcrResult<()> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    for entry in entries {
        writeln!(file, "{}", entry.display())?;
    }
    file.flush()?;
    Ok(())
}
