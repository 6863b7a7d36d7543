//! Directory-level OCR: segmentation, recognition and export for every page.

use super::overlay::overlay_mask;
use super::result::PageResult;
use super::stats::PipelineStats;
use crate::core::config::{InferenceMode, OutputEncoding, PipelineConfig, RunOptions};
use crate::core::constants::CONTROL_OVERLAY_ALPHA;
use crate::core::{OCRError, OcrResult};
use crate::export::{Exporter, resolve_exporters};
use crate::predictor::{LineDetector, LineRecognizer, LineSegmenter, OcrInference};
use crate::text::{Charset, to_native_script};
use crate::utils::{file_stem, list_images, load_image, progress_bar, save_image};
use std::path::{Path, PathBuf};

/// Directory holding control images, below the input directory.
pub const CONTROL_IMAGE_DIR: &str = "line_predictions";

/// Runs line segmentation and recognition over a directory of pages.
///
/// Pages are processed one at a time in natural file-name order. A page
/// without lines is skipped. Exporters run in the order they were requested.
pub struct InferencePipeline {
    segmenter: Box<dyn LineSegmenter>,
    recognizer: Box<dyn LineRecognizer>,
}

impl std::fmt::Debug for InferencePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferencePipeline").finish_non_exhaustive()
    }
}

impl InferencePipeline {
    pub fn new(segmenter: Box<dyn LineSegmenter>, recognizer: Box<dyn LineRecognizer>) -> Self {
        Self {
            segmenter,
            recognizer,
        }
    }

    /// Loads both models from `config`. The charset is read from
    /// `config.ocr.charset_path`. Model load failures leave the component
    /// disabled and the pipeline then refuses to run.
    pub fn from_config(config: &PipelineConfig) -> OcrResult<Self> {
        let charset = Charset::load(&config.ocr.charset_path)?;
        tracing::debug!(
            "loaded charset with {} tokens from {}",
            charset.len(),
            config.ocr.charset_path.display()
        );
        let detector = LineDetector::new(&config.line);
        let ocr = OcrInference::new(&config.ocr, charset);
        Ok(Self::new(Box::new(detector), Box::new(ocr)))
    }

    /// Processes every page in `image_dir` and exports the formats named in
    /// `options`.
    pub fn run(&self, image_dir: &Path, options: &RunOptions) -> OcrResult<PipelineStats> {
        let images = list_images(image_dir)?;
        if images.is_empty() {
            tracing::error!("no images found in {}", image_dir.display());
            return Ok(PipelineStats::new());
        }
        self.ensure_ready()?;
        let exporters = resolve_exporters(&options.export_formats, image_dir, options.strict_formats)?;
        self.run_pages(image_dir, &images, options, &exporters)
    }

    /// Like [`run`](Self::run) with caller-supplied exporters; the format list
    /// in `options` is ignored.
    pub fn run_with_exporters(
        &self,
        image_dir: &Path,
        options: &RunOptions,
        exporters: &[Box<dyn Exporter>],
    ) -> OcrResult<PipelineStats> {
        let images = list_images(image_dir)?;
        if images.is_empty() {
            tracing::error!("no images found in {}", image_dir.display());
            return Ok(PipelineStats::new());
        }
        self.ensure_ready()?;
        self.run_pages(image_dir, &images, options, exporters)
    }

    /// Fails unless both the segmenter and the recognizer loaded.
    pub fn ensure_ready(&self) -> OcrResult<()> {
        let disabled = if !self.segmenter.can_run() {
            Some("line segmenter")
        } else if !self.recognizer.can_run() {
            Some("line recognizer")
        } else {
            None
        };
        match disabled {
            Some(component) => {
                tracing::error!("{} is not available, refusing to run", component);
                Err(OCRError::component_disabled(component, "model failed to load"))
            }
            None => Ok(()),
        }
    }

    fn run_pages(
        &self,
        image_dir: &Path,
        images: &[PathBuf],
        options: &RunOptions,
        exporters: &[Box<dyn Exporter>],
    ) -> OcrResult<PipelineStats> {
        let control_dir = image_dir.join(CONTROL_IMAGE_DIR);
        if options.write_control_image {
            std::fs::create_dir_all(&control_dir)?;
        }

        let mut stats = PipelineStats {
            pages_total: images.len(),
            ..PipelineStats::default()
        };
        let label = image_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let pb = progress_bar(images.len() as u64, &label, options.show_progress);

        for path in images {
            let control = options.write_control_image.then_some(control_dir.as_path());
            match self.process_page(path, image_dir, options, control)? {
                Some(page) => {
                    for exporter in exporters {
                        exporter.export(&page)?;
                    }
                    stats.record_page(page.line_count());
                }
                None => {
                    tracing::debug!("no lines found on {}, skipping", path.display());
                    stats.record_skip();
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        tracing::info!(
            "processed {} of {} page(s), {} line(s)",
            stats.pages_processed,
            stats.pages_total,
            stats.lines_recognized
        );
        Ok(stats)
    }

    /// Segments and recognizes one page. Returns `None` when the page has no
    /// lines.
    pub fn process_page(
        &self,
        path: &Path,
        image_dir: &Path,
        options: &RunOptions,
        control_dir: Option<&Path>,
    ) -> OcrResult<Option<PageResult>> {
        let image = load_image(path)?;
        let image_name = file_stem(path);
        let segmentation = self.segmenter.segment(&image)?;
        if segmentation.is_empty() {
            return Ok(None);
        }

        if let Some(dir) = control_dir {
            let overlay = overlay_mask(&image, &segmentation.mask, CONTROL_OVERLAY_ALPHA);
            save_image(&overlay, &dir.join(format!("{image_name}.jpg")))?;
        }

        let texts = self.recognize(&segmentation.line_images, options)?;

        Ok(Some(PageResult {
            image,
            image_dir: image_dir.to_path_buf(),
            image_file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            image_name,
            page_bbox: segmentation.page_bbox,
            contours: segmentation.contours,
            line_images: segmentation.line_images,
            texts,
        }))
    }

    fn recognize(&self, lines: &[image::RgbImage], options: &RunOptions) -> OcrResult<Vec<String>> {
        let texts = match options.mode {
            InferenceMode::Batched => self.recognizer.recognize_batch(lines)?,
            InferenceMode::Sequential => lines
                .iter()
                .map(|line| self.recognizer.recognize(line))
                .collect::<OcrResult<Vec<_>>>()?,
        };
        Ok(match options.encoding {
            OutputEncoding::Unicode => texts.iter().map(|t| to_native_script(t)).collect(),
            OutputEncoding::Wylie => texts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::SegmentationResult;
    use crate::processors::{BoundingRect, LineContour};
    use image::{GrayImage, Rgb, RgbImage};
    use imageproc::point::Point;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Finds one line per 100 pixels of page height.
    struct StubSegmenter;

    impl LineSegmenter for StubSegmenter {
        fn segment(&self, page: &RgbImage) -> OcrResult<SegmentationResult> {
            let count = page.height() / 100;
            let mut result = SegmentationResult::empty(GrayImage::new(page.width(), page.height()));
            for i in 0..count as i32 {
                let y = i * 100 + 10;
                result.contours.push(LineContour::from_points(vec![
                    Point::new(0, y),
                    Point::new(50, y),
                    Point::new(50, y + 50),
                    Point::new(0, y + 50),
                ]));
                result.line_images.push(RgbImage::from_pixel(50, 50, Rgb([0, 0, 0])));
            }
            if count > 0 {
                result.page_bbox = BoundingRect::new(0, 10, 51, count * 100);
            }
            Ok(result)
        }
    }

    #[derive(Default)]
    struct Calls {
        batch: Cell<usize>,
        single: Cell<usize>,
    }

    struct StubRecognizer(Rc<Calls>);

    impl LineRecognizer for StubRecognizer {
        fn recognize(&self, _line: &RgbImage) -> OcrResult<String> {
            self.0.single.set(self.0.single.get() + 1);
            Ok("bkra§shis".to_string())
        }

        fn recognize_batch(&self, lines: &[RgbImage]) -> OcrResult<Vec<String>> {
            self.0.batch.set(self.0.batch.get() + 1);
            Ok(vec!["bkra shis".to_string(); lines.len()])
        }
    }

    struct RecordingExporter {
        name: &'static str,
        log: Rc<RefCell<Vec<(String, String)>>>,
    }

    impl Exporter for RecordingExporter {
        fn name(&self) -> &'static str {
            self.name
        }

        fn export(&self, page: &PageResult) -> OcrResult<()> {
            self.log
                .borrow_mut()
                .push((self.name.to_string(), page.image_name.clone()));
            Ok(())
        }
    }

    fn write_page(dir: &Path, name: &str, height: u32) {
        RgbImage::from_pixel(60, height, Rgb([255, 255, 255]))
            .save(dir.join(name))
            .unwrap();
    }

    fn stub_pipeline() -> (InferencePipeline, Rc<Calls>) {
        let calls = Rc::new(Calls::default());
        let pipeline = InferencePipeline::new(
            Box::new(StubSegmenter),
            Box::new(StubRecognizer(Rc::clone(&calls))),
        );
        (pipeline, calls)
    }

    fn options() -> RunOptions {
        RunOptions::new().with_progress(false)
    }

    #[test]
    fn test_empty_directory_returns_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, _) = stub_pipeline();
        let stats = pipeline
            .run(dir.path(), &options().with_export_formats(["text"]))
            .unwrap();
        assert_eq!(stats, PipelineStats::default());
        assert!(!dir.path().join("text").exists());
    }

    #[test]
    fn test_pages_in_natural_order_and_blank_pages_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "p10.jpg", 200);
        write_page(dir.path(), "p2.jpg", 300);
        write_page(dir.path(), "p1.jpg", 50);

        let log = Rc::new(RefCell::new(Vec::new()));
        let exporters: Vec<Box<dyn Exporter>> = vec![
            Box::new(RecordingExporter {
                name: "first",
                log: Rc::clone(&log),
            }),
            Box::new(RecordingExporter {
                name: "second",
                log: Rc::clone(&log),
            }),
        ];
        let (pipeline, _) = stub_pipeline();
        let stats = pipeline
            .run_with_exporters(dir.path(), &options(), &exporters)
            .unwrap();

        assert_eq!(stats.pages_total, 3);
        assert_eq!(stats.pages_skipped, 1);
        assert_eq!(stats.pages_processed, 2);
        assert_eq!(stats.lines_recognized, 5);
        let calls: Vec<(String, String)> = log.borrow().clone();
        let expected: Vec<(String, String)> = [
            ("first", "p2"),
            ("second", "p2"),
            ("first", "p10"),
            ("second", "p10"),
        ]
        .iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();
        assert_eq!(calls, expected);
    }

    #[test]
    fn test_batched_mode_uses_one_call_per_page() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "a.jpg", 300);
        let (pipeline, calls) = stub_pipeline();
        pipeline.run_with_exporters(dir.path(), &options(), &[]).unwrap();
        assert_eq!(calls.batch.get(), 1);
        assert_eq!(calls.single.get(), 0);
    }

    #[test]
    fn test_sequential_mode_calls_per_line() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "a.jpg", 300);
        let (pipeline, calls) = stub_pipeline();
        let opts = options().with_mode(InferenceMode::Sequential);
        pipeline.run_with_exporters(dir.path(), &opts, &[]).unwrap();
        assert_eq!(calls.batch.get(), 0);
        assert_eq!(calls.single.get(), 3);
    }

    #[test]
    fn test_encoding_and_text_export() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "a.jpg", 100);
        let (pipeline, _) = stub_pipeline();

        pipeline
            .run(dir.path(), &options().with_export_formats(["text", "bogus"]))
            .unwrap();
        let unicode = std::fs::read_to_string(dir.path().join("text/a.txt")).unwrap();
        assert_eq!(unicode, "བཀྲ་ཤིས\n");

        let opts = options()
            .with_export_formats(["txt"])
            .with_encoding(OutputEncoding::Wylie);
        pipeline.run(dir.path(), &opts).unwrap();
        let wylie = std::fs::read_to_string(dir.path().join("text/a.txt")).unwrap();
        assert_eq!(wylie, "bkra shis\n");
    }

    #[test]
    fn test_strict_formats_rejects_unknown() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "a.jpg", 100);
        let (pipeline, _) = stub_pipeline();
        let opts = options()
            .with_export_formats(["bogus"])
            .with_strict_formats(true);
        let err = pipeline.run(dir.path(), &opts).unwrap_err();
        assert!(matches!(err, OCRError::ConfigError { .. }));
    }

    #[test]
    fn test_control_image_written() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "a.jpg", 100);
        let (pipeline, _) = stub_pipeline();
        pipeline
            .run_with_exporters(dir.path(), &options().with_control_image(true), &[])
            .unwrap();
        assert!(dir.path().join(CONTROL_IMAGE_DIR).join("a.jpg").is_file());
    }

    #[test]
    fn test_disabled_component_fails_loudly() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "a.jpg", 100);
        let detector = LineDetector::new(&crate::core::config::LineDetectorConfig::new(
            dir.path().join("missing.onnx"),
        ));
        let recognizer = StubRecognizer(Rc::new(Calls::default()));
        let pipeline = InferencePipeline::new(Box::new(detector), Box::new(recognizer));
        let err = pipeline.run_with_exporters(dir.path(), &options(), &[]).unwrap_err();
        assert!(matches!(err, OCRError::ComponentDisabled { .. }));
    }

    #[test]
    fn test_disabled_recognizer_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "a.jpg", 100);
        let config = crate::core::config::OcrModelConfig::new(
            dir.path().join("missing.onnx"),
            dir.path().join("charset.json"),
        );
        let ocr = OcrInference::new(&config, Charset::from_labels(["ka"]));
        let pipeline = InferencePipeline::new(Box::new(StubSegmenter), Box::new(ocr));
        let opts = options().with_export_formats(["text"]);
        let err = pipeline.run(dir.path(), &opts).unwrap_err();
        assert!(matches!(err, OCRError::ComponentDisabled { .. }));
        assert!(!dir.path().join("text").exists());
    }
}
