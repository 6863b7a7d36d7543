//! Plain text export: one recognized line per text line.

use super::Exporter;
use crate::core::OcrResult;
use crate::pipeline::PageResult;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct TextExporter {
    output_dir: PathBuf,
}

impl TextExporter {
    /// Creates `<image_dir>/text`.
    pub fn new(image_dir: &Path) -> OcrResult<Self> {
        let output_dir = image_dir.join("text");
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    pub fn output_path(&self, image_name: &str) -> PathBuf {
        self.output_dir.join(format!("{image_name}.txt"))
    }
}

impl Exporter for TextExporter {
    fn name(&self) -> &'static str {
        "text"
    }

    fn export(&self, page: &PageResult) -> OcrResult<()> {
        let path = self.output_path(&page.image_name);
        let mut file = std::io::BufWriter::new(std::fs::File::create(&path)?);
        for line in &page.texts {
            writeln!(file, "{line}")?;
        }
        file.flush()?;
        tracing::debug!("wrote {}", path.display());
        Ok(())
    }
}
