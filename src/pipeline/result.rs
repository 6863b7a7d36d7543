//! Result of processing one page.

use crate::processors::{BoundingRect, LineContour};
use image::RgbImage;
use std::fmt;
use std::path::PathBuf;

/// Everything the exporters receive for a page.
///
/// `contours`, `line_images` and `texts` are parallel and in reading order.
#[derive(Debug, Clone)]
pub struct PageResult {
    /// The page as loaded.
    pub image: RgbImage,
    /// Directory the page was read from; exporters write below it.
    pub image_dir: PathBuf,
    /// File stem of the page, used to name exported files.
    pub image_name: String,
    /// File name of the page including its extension.
    pub image_file_name: String,
    pub page_bbox: BoundingRect,
    pub contours: Vec<LineContour>,
    pub line_images: Vec<RgbImage>,
    pub texts: Vec<String>,
}

impl PageResult {
    pub fn line_count(&self) -> usize {
        self.texts.len()
    }

    /// Iterates `(contour, line image, text)` per line.
    pub fn lines(&self) -> impl Iterator<Item = (&LineContour, &RgbImage, &str)> {
        self.contours
            .iter()
            .zip(self.line_images.iter())
            .zip(self.texts.iter())
            .map(|((contour, image), text)| (contour, image, text.as_str()))
    }
}

impl fmt::Display for PageResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} ({}x{}), {} line(s)",
            self.image_file_name,
            self.image.width(),
            self.image.height(),
            self.line_count()
        )?;
        for (i, text) in self.texts.iter().enumerate() {
            writeln!(f, "  [{i}] {text}")?;
        }
        Ok(())
    }
}
