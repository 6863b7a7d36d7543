//! Exporters write a [`PageResult`] to disk in one output format each.
//!
//! Formats are requested by name. Every exporter writes below the directory
//! the pages were read from:
//!
//! | name | aliases | output |
//! |---|---|---|
//! | `text` | `txt` | `text/<page>.txt` |
//! | `xml` | `page` | `page/<page>.xml` |
//! | `prodigy` | `jsonl` | `prodigy_lines/<page>.jsonl` plus line crops |

pub mod line_dataset;
pub mod page_xml;
pub mod text;

pub use line_dataset::LineDatasetExporter;
pub use page_xml::PageXmlExporter;
pub use text::TextExporter;

use crate::core::config::ConfigError;
use crate::core::OcrResult;
use crate::pipeline::PageResult;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Writes one page result in a specific format.
pub trait Exporter {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn export(&self, page: &PageResult) -> OcrResult<()>;
}

/// The closed set of supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Text,
    PageXml,
    LineDataset,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [Self::Text, Self::PageXml, Self::LineDataset];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::PageXml => "xml",
            Self::LineDataset => "prodigy",
        }
    }

    /// Creates the exporter for this format, rooted at `image_dir`.
    pub fn exporter(&self, image_dir: &Path) -> OcrResult<Box<dyn Exporter>> {
        Ok(match self {
            Self::Text => Box::new(TextExporter::new(image_dir)?),
            Self::PageXml => Box::new(PageXmlExporter::new(image_dir)?),
            Self::LineDataset => Box::new(LineDatasetExporter::new(image_dir)?),
        })
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "xml" | "page" => Ok(Self::PageXml),
            "prodigy" | "jsonl" => Ok(Self::LineDataset),
            _ => Err(ConfigError::UnknownExportFormat {
                name: s.trim().to_string(),
            }),
        }
    }
}

/// Parses requested format names. Unknown names are logged and skipped, or
/// rejected when `strict` is set. Repeated formats are kept once, in first
/// occurrence order.
pub fn parse_formats<S: AsRef<str>>(names: &[S], strict: bool) -> OcrResult<Vec<ExportFormat>> {
    let mut formats = Vec::new();
    for name in names {
        let name = name.as_ref();
        if name.trim().is_empty() {
            continue;
        }
        match name.parse::<ExportFormat>() {
            Ok(format) if !formats.contains(&format) => formats.push(format),
            Ok(format) => tracing::debug!("export format '{}' requested twice", format),
            Err(err) if strict => return Err(err.into()),
            Err(_) => tracing::warn!("ignoring unknown export format '{}'", name),
        }
    }
    Ok(formats)
}

/// Resolves format names into exporters rooted at `image_dir`.
pub fn resolve_exporters<S: AsRef<str>>(
    names: &[S],
    image_dir: &Path,
    strict: bool,
) -> OcrResult<Vec<Box<dyn Exporter>>> {
    parse_formats(names, strict)?
        .iter()
        .map(|format| format.exporter(image_dir))
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::pipeline::PageResult;
    use crate::processors::{BoundingRect, LineContour};
    use image::{Rgb, RgbImage};
    use imageproc::point::Point;
    use std::path::Path;

    /// A two-line page rooted at `dir`.
    pub fn sample_page(dir: &Path) -> PageResult {
        let contour = |y: i32| {
            LineContour::from_points(vec![
                Point::new(10, y),
                Point::new(90, y),
                Point::new(90, y + 20),
                Point::new(10, y + 20),
            ])
        };
        PageResult {
            image: RgbImage::from_pixel(100, 80, Rgb([255, 255, 255])),
            image_dir: dir.to_path_buf(),
            image_name: "page_01".to_string(),
            image_file_name: "page_01.jpg".to_string(),
            page_bbox: BoundingRect::new(10, 10, 80, 60),
            contours: vec![contour(10), contour(45)],
            line_images: vec![
                RgbImage::from_pixel(80, 20, Rgb([10, 10, 10])),
                RgbImage::from_pixel(80, 20, Rgb([20, 20, 20])),
            ],
            texts: vec!["བཀྲ་ཤིས".to_string(), "a < b & c".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OCRError;

    #[test]
    fn test_format_aliases() {
        assert_eq!("txt".parse::<ExportFormat>().unwrap(), ExportFormat::Text);
        assert_eq!(" PAGE ".parse::<ExportFormat>().unwrap(), ExportFormat::PageXml);
        assert_eq!("jsonl".parse::<ExportFormat>().unwrap(), ExportFormat::LineDataset);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_unknown_format_ignored_by_default() {
        let formats = parse_formats(&["xml", "pdf", "text", "xml"], false).unwrap();
        assert_eq!(formats, vec![ExportFormat::PageXml, ExportFormat::Text]);
    }

    #[test]
    fn test_unknown_format_rejected_when_strict() {
        let err = parse_formats(&["xml", "pdf"], true).unwrap_err();
        assert!(matches!(err, OCRError::ConfigError { .. }));
    }

    #[test]
    fn test_resolve_exporters_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let exporters = resolve_exporters(&["prodigy", "text"], dir.path(), false).unwrap();
        let names: Vec<_> = exporters.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["prodigy", "text"]);
    }
}
