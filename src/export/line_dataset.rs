//! Labeled line dataset export in JSON lines, for review in annotation tools.

use super::Exporter;
use crate::core::OcrResult;
use crate::pipeline::PageResult;
use crate::utils::save_image;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One exported line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRecord {
    pub id: String,
    pub image_url: String,
    pub user_input: String,
}

#[derive(Debug, Clone)]
pub struct LineDatasetExporter {
    output_dir: PathBuf,
    line_image_dir: PathBuf,
}

impl LineDatasetExporter {
    /// Creates `<image_dir>/prodigy_lines` and its `lines` subdirectory.
    pub fn new(image_dir: &Path) -> OcrResult<Self> {
        let output_dir = image_dir.join("prodigy_lines");
        let line_image_dir = output_dir.join("lines");
        std::fs::create_dir_all(&line_image_dir)?;
        Ok(Self {
            output_dir,
            line_image_dir,
        })
    }

    pub fn output_path(&self, image_name: &str) -> PathBuf {
        self.output_dir.join(format!("{image_name}.jsonl"))
    }

    /// Records for a page; ids are the crop path without extension.
    pub fn records(&self, page: &PageResult) -> Vec<LineRecord> {
        page.texts
            .iter()
            .enumerate()
            .map(|(idx, text)| {
                let base = format!("{}_{idx}", page.image_name);
                let stem = self.line_image_dir.join(&base);
                let image = self.line_image_dir.join(format!("{base}.jpg"));
                LineRecord {
                    id: stem.to_string_lossy().into_owned(),
                    image_url: image.to_string_lossy().into_owned(),
                    user_input: text.clone(),
                }
            })
            .collect()
    }
}

impl Exporter for LineDatasetExporter {
    fn name(&self) -> &'static str {
        "prodigy"
    }

    fn export(&self, page: &PageResult) -> OcrResult<()> {
        let records = self.records(page);
        for (record, line_image) in records.iter().zip(page.line_images.iter()) {
            save_image(line_image, Path::new(&record.image_url))?;
        }

        let path = self.output_path(&page.image_name);
        let mut file = std::io::BufWriter::new(std::fs::File::create(&path)?);
        for record in &records {
            writeln!(file, "{}", serde_json::to_string(record)?)?;
        }
        file.flush()?;
        tracing::debug!("wrote {} line record(s) to {}", records.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::test_support::sample_page;

    #[test]
    fn test_export_writes_records_and_crops() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = LineDatasetExporter::new(dir.path()).unwrap();
        exporter.export(&sample_page(dir.path())).unwrap();

        let jsonl = std::fs::read_to_string(dir.path().join("prodigy_lines/page_01.jsonl")).unwrap();
        let records: Vec<LineRecord> = jsonl
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].user_input, "a < b & c");
        assert!(records[0].id.ends_with("page_01_0"));
        assert!(records[0].image_url.ends_with("page_01_0.jpg"));
        assert!(dir.path().join("prodigy_lines/lines/page_01_1.jpg").is_file());
    }
}
