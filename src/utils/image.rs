//! Image loading and saving helpers.

use crate::core::{OCRError, OcrResult};
use image::{DynamicImage, RgbImage};
use std::path::Path;

/// Images above this count are loaded in parallel.
const PARALLEL_LOAD_THRESHOLD: usize = 4;

pub fn dynamic_to_rgb(img: DynamicImage) -> RgbImage {
    img.to_rgb8()
}

/// Loads an image from `path` as 8-bit RGB.
///
/// # Errors
///
/// Returns `OCRError::ImageLoad` if the file cannot be opened or decoded.
pub fn load_image(path: &Path) -> OcrResult<RgbImage> {
    let img = image::open(path).map_err(OCRError::ImageLoad)?;
    Ok(dynamic_to_rgb(img))
}

/// Loads several images, in parallel when there are enough of them. The first
/// failure fails the whole batch.
pub fn load_images<P: AsRef<Path> + Send + Sync>(paths: &[P]) -> OcrResult<Vec<RgbImage>> {
    if paths.len() > PARALLEL_LOAD_THRESHOLD {
        use rayon::prelude::*;
        paths.par_iter().map(|p| load_image(p.as_ref())).collect()
    } else {
        paths.iter().map(|p| load_image(p.as_ref())).collect()
    }
}

/// Writes `image` to `path`, creating parent directories. The format follows
/// the extension.
pub fn save_image(image: &RgbImage, path: &Path) -> OcrResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    image.save(path).map_err(OCRError::ImageLoad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/page.png");
        let image = RgbImage::from_pixel(6, 3, Rgb([10, 20, 30]));
        save_image(&image, &path).unwrap();
        let loaded = load_image(&path).unwrap();
        assert_eq!(loaded, image);
    }

    #[test]
    fn test_load_images_fails_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<_> = (0..6).map(|i| dir.path().join(format!("{i}.png"))).collect();
        assert!(load_images(&paths).is_err());
    }

    #[test]
    fn test_load_missing_image() {
        assert!(matches!(
            load_image(Path::new("/nonexistent/page.jpg")),
            Err(OCRError::ImageLoad(_))
        ));
    }
}
