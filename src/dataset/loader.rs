//! Batch assembly for CTC training.
//!
//! A batch carries the images as `[B, W, H]`, the padded label indices as
//! `[B, L]`, the constant input lengths and the true label lengths as
//! `[B, 1]`, plus a zero target of length `B`: the alignment loss is part of
//! the training graph.

use super::augmentation::Augmenter;
use super::samples::{OCRDataset, Split};
use crate::core::config::DatasetConfig;
use crate::core::validation::{validate_positive, validate_same_length};
use crate::core::{OCRError, OcrResult, Tensor1D, Tensor2D, Tensor3D};
use crate::processors::{resize_with_pad, to_time_major};
use crate::text::{Charset, read_label};
use crate::utils::load_image;
use ndarray::{Array2, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::path::PathBuf;

/// One assembled batch.
#[derive(Debug, Clone)]
pub struct Batch {
    /// `[B, W, H]` images in `[0, 1]`.
    pub images: Tensor3D,
    /// `[B, L]` label indices, padded with 0.
    pub labels: Array2<i64>,
    /// `[B, 1]`, always the label sequence length.
    pub input_length: Array2<i64>,
    /// `[B, 1]` character count of each label.
    pub label_length: Array2<i64>,
    /// `[B]` zeros.
    pub outputs: Tensor1D,
}

struct Sample {
    image: Tensor2D,
    label: Vec<usize>,
    length: usize,
}

pub struct OCRDataLoader {
    images: Vec<PathBuf>,
    labels: Vec<PathBuf>,
    charset: Charset,
    batch_size: usize,
    image_width: u32,
    image_height: u32,
    max_label_length: usize,
    augmenter: Option<Box<dyn Augmenter>>,
    seed: Option<u64>,
}

impl std::fmt::Debug for OCRDataLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OCRDataLoader")
            .field("samples", &self.images.len())
            .field("batch_size", &self.batch_size)
            .field("charset", &self.charset.len())
            .field("augment", &self.augmenter.is_some())
            .finish()
    }
}

impl OCRDataLoader {
    pub fn new(
        images: Vec<PathBuf>,
        labels: Vec<PathBuf>,
        charset: Charset,
        config: &DatasetConfig,
    ) -> OcrResult<Self> {
        validate_same_length(&images, &labels, "images", "labels")?;
        validate_positive(config.batch_size, "batch_size")?;
        Ok(Self {
            images,
            labels,
            charset,
            batch_size: config.batch_size,
            image_width: config.image_width,
            image_height: config.image_height,
            max_label_length: config.max_label_length,
            augmenter: None,
            seed: config.seed,
        })
    }

    /// Loader over one split of `dataset`, building its charset if needed.
    pub fn for_split(dataset: &mut OCRDataset, split: Split, config: &DatasetConfig) -> OcrResult<Self> {
        let charset = dataset.charset()?.clone();
        let (images, labels) = dataset.split_data(split);
        Self::new(images, labels, charset, config)
    }

    /// Applies `augmenter` to every image before tensor conversion.
    pub fn with_augmenter(mut self, augmenter: Box<dyn Augmenter>) -> Self {
        self.augmenter = Some(augmenter);
        self
    }

    pub fn charset(&self) -> &Charset {
        &self.charset
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches, counting a final partial one.
    pub fn len(&self) -> usize {
        self.images.len().div_ceil(self.batch_size)
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Assembles batch `index`. Any image or label that fails to load fails
    /// the batch. Rows past the end of a short final batch keep the fill
    /// value 1 with label length 0.
    pub fn get_batch(&self, index: usize) -> OcrResult<Batch> {
        if index >= self.len() {
            return Err(OCRError::invalid_input(format!(
                "batch {index} out of range ({} batches)",
                self.len()
            )));
        }
        let start = index * self.batch_size;
        let end = (start + self.batch_size).min(self.images.len());

        let samples = (start..end)
            .into_par_iter()
            .map(|i| self.load_sample(i))
            .collect::<OcrResult<Vec<_>>>()?;

        let (b, w, h, l) = (
            self.batch_size,
            self.image_width as usize,
            self.image_height as usize,
            self.max_label_length,
        );
        let mut images = Tensor3D::ones((b, w, h));
        let mut labels = Array2::<i64>::ones((b, l));
        let input_length = Array2::<i64>::from_elem((b, 1), l as i64);
        let mut label_length = Array2::<i64>::zeros((b, 1));

        for (row, sample) in samples.iter().enumerate() {
            images.index_axis_mut(Axis(0), row).assign(&sample.image);
            for (col, &idx) in sample.label.iter().enumerate() {
                labels[[row, col]] = idx as i64;
            }
            label_length[[row, 0]] = sample.length as i64;
        }

        tracing::debug!("assembled batch {} with {} sample(s)", index, samples.len());
        Ok(Batch {
            images,
            labels,
            input_length,
            label_length,
            outputs: Tensor1D::zeros(b),
        })
    }

    /// Iterates over all batches in order.
    pub fn batches(&self) -> impl Iterator<Item = OcrResult<Batch>> + '_ {
        (0..self.len()).map(move |i| self.get_batch(i))
    }

    fn load_sample(&self, index: usize) -> OcrResult<Sample> {
        let gray = image::imageops::grayscale(&load_image(&self.images[index])?);
        let mut padded = resize_with_pad(&gray, self.image_width, self.image_height);
        if let Some(augmenter) = &self.augmenter {
            let mut rng = match self.seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
                None => StdRng::from_entropy(),
            };
            padded = augmenter.augment(&padded, &mut rng);
        }

        let text = read_label(&self.labels[index])?;
        let label = self.charset.vectorize_padded(&text, self.max_label_length)?;
        Ok(Sample {
            image: to_time_major(&padded),
            label,
            length: text.chars().count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::augmentation::RandomRotationZoom;
    use image::{Rgb, RgbImage};
    use std::path::Path;

    fn write_sample(dir: &Path, name: &str, text: &str) -> (PathBuf, PathBuf) {
        let image = dir.join(format!("{name}.png"));
        RgbImage::from_pixel(100, 20, Rgb([255, 255, 255]))
            .save(&image)
            .unwrap();
        let label = dir.join(format!("{name}.txt"));
        std::fs::write(&label, text).unwrap();
        (image, label)
    }

    fn small_config(batch_size: usize) -> DatasetConfig {
        DatasetConfig {
            batch_size,
            image_width: 50,
            image_height: 10,
            max_label_length: 12,
            ..DatasetConfig::default()
        }
    }

    fn fixture(dir: &Path, count: usize) -> (Vec<PathBuf>, Vec<PathBuf>, Charset) {
        let (images, labels): (Vec<_>, Vec<_>) = (0..count)
            .map(|i| write_sample(dir, &format!("s{i}"), "བཀྲ་ཤིས"))
            .unzip();
        let charset = Charset::from_labels(["bkra§shis"]);
        (images, labels, charset)
    }

    #[test]
    fn test_len_rounds_up() {
        let dir = tempfile::tempdir().unwrap();
        let (images, labels, charset) = fixture(dir.path(), 5);
        let loader = OCRDataLoader::new(images, labels, charset, &small_config(2)).unwrap();
        assert_eq!(loader.len(), 3);
        assert!(loader.get_batch(3).is_err());
    }

    #[test]
    fn test_batch_shapes_and_lengths() {
        let dir = tempfile::tempdir().unwrap();
        let (images, labels, charset) = fixture(dir.path(), 3);
        let loader = OCRDataLoader::new(images, labels, charset.clone(), &small_config(2)).unwrap();

        let batch = loader.get_batch(0).unwrap();
        assert_eq!(batch.images.shape(), &[2, 50, 10]);
        assert_eq!(batch.labels.shape(), &[2, 12]);
        assert_eq!(batch.input_length[[1, 0]], 12);
        assert_eq!(batch.label_length[[0, 0]], 9);
        assert_eq!(batch.labels[[0, 0]], charset.index_of("b").unwrap() as i64);
        assert_eq!(batch.labels[[0, 9]], 0);
        assert_eq!(batch.outputs.len(), 2);

        let last = loader.get_batch(1).unwrap();
        assert_eq!(last.label_length[[1, 0]], 0);
        assert_eq!(last.labels[[1, 0]], 1);
    }

    #[test]
    fn test_missing_image_fails_batch() {
        let dir = tempfile::tempdir().unwrap();
        let (mut images, labels, charset) = fixture(dir.path(), 2);
        images[1] = dir.path().join("missing.png");
        let loader = OCRDataLoader::new(images, labels, charset, &small_config(2)).unwrap();
        assert!(loader.get_batch(0).is_err());
    }

    #[test]
    fn test_overlong_label_fails_batch() {
        let dir = tempfile::tempdir().unwrap();
        let (images, labels, charset) = fixture(dir.path(), 1);
        let config = DatasetConfig {
            max_label_length: 4,
            ..small_config(1)
        };
        let loader = OCRDataLoader::new(images, labels, charset, &config).unwrap();
        assert!(matches!(loader.get_batch(0), Err(OCRError::DataIntegrity { .. })));
    }

    #[test]
    fn test_augmenter_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let (images, labels, charset) = fixture(dir.path(), 1);
        let config = DatasetConfig {
            seed: Some(1),
            ..small_config(1)
        };
        let plain = OCRDataLoader::new(images.clone(), labels.clone(), charset.clone(), &config)
            .unwrap()
            .get_batch(0)
            .unwrap();
        let augmented = OCRDataLoader::new(images, labels, charset, &config)
            .unwrap()
            .with_augmenter(Box::new(RandomRotationZoom::default()))
            .get_batch(0)
            .unwrap();
        assert_eq!(plain.images.shape(), augmented.images.shape());
        assert_ne!(plain.images, augmented.images);
    }
}
